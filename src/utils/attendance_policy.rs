use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::MySqlPool;
use tracing::warn;

use crate::model::{
    attendance::AttendanceStatus,
    setting::{LATE_THRESHOLD_MINUTES, WORK_START_TIME},
};

const DEFAULT_WORK_START: (u32, u32) = (9, 0);
const DEFAULT_LATE_THRESHOLD_MINUTES: i64 = 15;
pub const MAX_LATE_THRESHOLD_MINUTES: i64 = 24 * 60;

/// Lateness rule built from the `work_start_time` and `late_threshold_minutes` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendancePolicy {
    pub work_start: NaiveTime,
    pub late_threshold_minutes: i64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(DEFAULT_WORK_START.0, DEFAULT_WORK_START.1, 0)
                .unwrap_or(NaiveTime::MIN),
            late_threshold_minutes: DEFAULT_LATE_THRESHOLD_MINUTES,
        }
    }
}

impl AttendancePolicy {
    /// Reads the policy rows. Settings are not cached: admins may change them at any time.
    pub async fn load(pool: &MySqlPool) -> Result<Self, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT `key`, value FROM settings WHERE `key` IN (?, ?)",
        )
        .bind(WORK_START_TIME)
        .bind(LATE_THRESHOLD_MINUTES)
        .fetch_all(pool)
        .await?;

        Ok(Self::from_settings(
            rows.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        ))
    }

    pub fn from_settings<'a, I>(settings: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut policy = Self::default();

        for (key, value) in settings {
            match key {
                WORK_START_TIME => match parse_clock_time(value) {
                    Some(t) => policy.work_start = t,
                    None => warn!(value, "Unparsable work_start_time, using default"),
                },
                LATE_THRESHOLD_MINUTES => match parse_threshold(value) {
                    Some(m) => policy.late_threshold_minutes = m,
                    None => warn!(value, "Unparsable late_threshold_minutes, using default"),
                },
                _ => {}
            }
        }

        policy
    }

    /// Last local instant of `day` that still counts as on time
    pub fn late_after(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.work_start) + Duration::minutes(self.late_threshold_minutes)
    }

    pub fn classify(&self, local_check_in: NaiveDateTime) -> AttendanceStatus {
        if local_check_in > self.late_after(local_check_in.date()) {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::OnTime
        }
    }
}

/// Parses `HH:MM` (a one-digit hour is accepted)
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Non-negative minutes, at most one day
pub fn parse_threshold(value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|m| (0..=MAX_LATE_THRESHOLD_MINUTES).contains(m))
}

/// Elapsed hours rounded to two decimals, never negative
pub fn work_hours_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    let millis = (check_out - check_in).num_milliseconds().max(0) as f64;
    (millis / 3_600_000.0 * 100.0).round() / 100.0
}
