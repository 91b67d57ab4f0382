use chrono::{DateTime, NaiveDate, Utc};
use email_address::EmailAddress;
use std::str::FromStr;
use strum::IntoEnumIterator;

use crate::error::ApiError;

/// Emails are stored and compared trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn email(value: &str) -> Result<(), ApiError> {
    if EmailAddress::is_valid(value.trim()) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid email address"))
    }
}

pub fn password(value: &str) -> Result<(), ApiError> {
    min_chars(value, 6, "Password must be at least 6 characters")
}

pub fn name(value: &str) -> Result<(), ApiError> {
    min_chars(value.trim(), 2, "Name must be at least 2 characters")
}

pub fn min_chars(value: &str, min: usize, msg: &str) -> Result<(), ApiError> {
    if value.chars().count() < min {
        Err(ApiError::bad_request(msg))
    } else {
        Ok(())
    }
}

pub fn latitude(value: f64) -> Result<(), ApiError> {
    if value.is_finite() && (-90.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Latitude must be between -90 and 90"))
    }
}

pub fn longitude(value: f64) -> Result<(), ApiError> {
    if value.is_finite() && (-180.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Longitude must be between -180 and 180"))
    }
}

/// Parses a strum-backed enum, listing the accepted values on failure
pub fn one_of<E>(field: &str, value: &str) -> Result<E, ApiError>
where
    E: FromStr + IntoEnumIterator + AsRef<str>,
{
    value.parse::<E>().map_err(|_| {
        let allowed: Vec<String> = E::iter().map(|v| v.as_ref().to_string()).collect();
        ApiError::bad_request(format!("Invalid {field}. Allowed: {}", allowed.join(", ")))
    })
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 instant
pub fn due_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::bad_request("Invalid due date"))
}

pub fn optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request(format!("Invalid {field}, expected YYYY-MM-DD")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;

    #[test]
    fn emails_compare_case_insensitively() {
        assert_eq!(normalize_email("  Jane.Doe@Company.COM "), "jane.doe@company.com");
    }

    #[test]
    fn email_and_password_messages() {
        assert!(email("jane@company.com").is_ok());
        assert_eq!(email("jane").unwrap_err().to_string(), "Invalid email address");
        assert_eq!(
            password("12345").unwrap_err().to_string(),
            "Password must be at least 6 characters"
        );
        assert!(name(" J ").is_err());
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(latitude(28.61).is_ok());
        assert!(latitude(91.0).is_err());
        assert!(longitude(-180.0).is_ok());
        assert!(longitude(f64::NAN).is_err());
    }

    #[test]
    fn enum_errors_list_allowed_values() {
        let ok: TaskStatus = one_of("status", "in_progress").unwrap();
        assert_eq!(ok, TaskStatus::InProgress);

        let err = one_of::<TaskStatus>("status", "done").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid status. Allowed: pending, in_progress, completed"
        );
    }

    #[test]
    fn due_dates_accept_plain_dates_and_instants() {
        assert_eq!(
            due_date("2026-02-01").unwrap().to_rfc3339(),
            "2026-02-01T00:00:00+00:00"
        );
        assert_eq!(
            due_date("2026-02-01T10:00:00+05:30").unwrap().to_rfc3339(),
            "2026-02-01T04:30:00+00:00"
        );
        assert!(due_date("tomorrow").is_err());
    }
}
