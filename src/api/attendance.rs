use crate::{
    api::{Pagination, Paging},
    auth::auth::AuthUser,
    error::ApiError,
    model::attendance::{
        ATTENDANCE_COLUMNS, Attendance, AttendanceStatus, AttendanceUserRow, AttendanceWithUser,
    },
    utils::{
        attendance_policy::{AttendancePolicy, work_hours_between},
        clock::AttendanceClock,
        csv::attendance_report,
        db_utils::{BindSqlValue, SqlFilter, is_duplicate_key, like_pattern, qualify},
        validation,
    },
};
use actix_web::{HttpResponse, http::header, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationPayload {
    #[schema(example = 28.6139)]
    pub latitude: f64,
    #[schema(example = 77.209)]
    pub longitude: f64,
    #[schema(example = "Connaught Place, New Delhi", nullable = true)]
    #[serde(default)]
    pub address: Option<String>,
}

impl LocationPayload {
    fn validate(&self) -> Result<(), ApiError> {
        validation::latitude(self.latitude)?;
        validation::longitude(self.longitude)
    }

    fn address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub user_id: Option<u64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub attendance: Vec<AttendanceWithUser>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayStatus {
    pub is_checked_in: bool,
    pub is_checked_out: bool,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: Option<AttendanceStatus>,
    pub work_hours: Option<f64>,
}

impl From<Option<&Attendance>> for TodayStatus {
    fn from(record: Option<&Attendance>) -> Self {
        let checked_in = record.and_then(|a| a.check_in_time);
        TodayStatus {
            is_checked_in: checked_in.is_some(),
            is_checked_out: record.and_then(|a| a.check_out_time).is_some(),
            check_in_time: checked_in,
            check_out_time: record.and_then(|a| a.check_out_time),
            status: record.map(|a| a.status),
            work_hours: record.and_then(|a| a.work_hours).filter(|h| *h != 0.0),
        }
    }
}

const JOINED_USER_COLUMNS: &str = "u.name AS user_name, u.email AS user_email, \
    u.department AS user_department, u.position AS user_position";

async fn find_day(
    pool: &MySqlPool,
    user_id: u64,
    day: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?"
    ))
    .bind(user_id)
    .bind(day)
    .fetch_optional(pool)
    .await
}

/// Shared by the listing and the CSV export. Employees only ever see their own rows.
fn attendance_filter(auth: &AuthUser, query: &AttendanceQuery) -> Result<SqlFilter, ApiError> {
    let mut filter = SqlFilter::new();

    if auth.is_employee() {
        filter.eq("a.user_id", auth.user_id);
    } else if let Some(user_id) = query.user_id {
        filter.eq("a.user_id", user_id);
    }

    let start = validation::optional_date("startDate", query.start_date.as_deref())?;
    let end = validation::optional_date("endDate", query.end_date.as_deref())?;
    match (start, end) {
        (Some(start), Some(end)) => {
            filter.push("a.date BETWEEN ? AND ?", vec![start.into(), end.into()]);
        }
        _ => {
            if let Some(day) = validation::optional_date("date", query.date.as_deref())? {
                filter.eq("a.date", day);
            }
        }
    }

    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: AttendanceStatus = validation::one_of("status", status)?;
        filter.eq("a.status", status.to_string());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter.push("u.name LIKE ?", vec![like_pattern(search).into()]);
    }

    if let Some(department) = query.department.as_deref().filter(|d| !d.is_empty()) {
        filter.eq("u.department", department);
    }

    Ok(filter)
}

fn joined_select(filter: &SqlFilter) -> String {
    format!(
        "SELECT {}, {JOINED_USER_COLUMNS} FROM attendance a JOIN users u ON u.id = a.user_id {} \
         ORDER BY a.date DESC, a.id DESC",
        qualify(ATTENDANCE_COLUMNS, "a"),
        filter.where_clause()
    )
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = LocationPayload,
    responses(
        (status = 200, description = "Checked in", body = Object, example = json!({
            "success": true,
            "data": {},
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "success": false,
            "error": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<AttendanceClock>,
    body: web::Json<LocationPayload>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let now = clock.now();
    let today = clock.day_of(now);

    let existing = find_day(pool.get_ref(), auth.user_id, today).await?;
    if existing.as_ref().is_some_and(|a| a.check_in_time.is_some()) {
        return Err(ApiError::bad_request("Already checked in today"));
    }

    let policy = AttendancePolicy::load(pool.get_ref()).await?;
    let status = policy.classify(clock.local(now));
    debug!(user_id = auth.user_id, %today, %status, ?policy, "Classified check-in");

    let recorded = match existing {
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO attendance
                (user_id, date, check_in_time, check_in_lat, check_in_lng, check_in_addr, status)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(auth.user_id)
            .bind(today)
            .bind(now)
            .bind(body.latitude)
            .bind(body.longitude)
            .bind(body.address())
            .bind(status.to_string())
            .execute(pool.get_ref())
            .await;

            match result {
                Ok(_) => true,
                // Lost a race against a concurrent check-in for the same day
                Err(e) if is_duplicate_key(&e) => false,
                Err(e) => return Err(e.into()),
            }
        }
        Some(row) => {
            let result = sqlx::query(
                r#"
                UPDATE attendance
                SET check_in_time = ?, check_in_lat = ?, check_in_lng = ?, check_in_addr = ?, status = ?
                WHERE id = ? AND check_in_time IS NULL
                "#,
            )
            .bind(now)
            .bind(body.latitude)
            .bind(body.longitude)
            .bind(body.address())
            .bind(status.to_string())
            .bind(row.id)
            .execute(pool.get_ref())
            .await?;

            result.rows_affected() > 0
        }
    };

    if !recorded {
        info!(user_id = auth.user_id, %today, "Duplicate check-in rejected");
        return Err(ApiError::bad_request("Already checked in today"));
    }

    let attendance = find_day(pool.get_ref(), auth.user_id, today)
        .await?
        .ok_or(ApiError::Internal)?;

    info!(user_id = auth.user_id, %today, %status, "Checked in");

    let message = if status == AttendanceStatus::Late {
        "Checked in (Late)"
    } else {
        "Checked in successfully"
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": attendance,
        "message": message
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = LocationPayload,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "success": true,
            "data": {},
            "message": "Checked out successfully"
        })),
        (status = 400, description = "Not checked in today / Already checked out today", body = Object, example = json!({
            "success": false,
            "error": "Not checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<AttendanceClock>,
    body: web::Json<LocationPayload>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let now = clock.now();
    let today = clock.day_of(now);

    let record = find_day(pool.get_ref(), auth.user_id, today).await?;
    let (record, check_in) = match record {
        Some(r) => match r.check_in_time {
            Some(at) => (r, at),
            None => return Err(ApiError::bad_request("Not checked in today")),
        },
        None => return Err(ApiError::bad_request("Not checked in today")),
    };

    if record.check_out_time.is_some() {
        return Err(ApiError::bad_request("Already checked out today"));
    }

    // Never before the check-in, even if the host clock stepped backwards
    let check_out = now.max(check_in);
    let work_hours = work_hours_between(check_in, check_out);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out_time = ?, check_out_lat = ?, check_out_lng = ?, check_out_addr = ?, work_hours = ?
        WHERE id = ? AND check_out_time IS NULL
        "#,
    )
    .bind(check_out)
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(body.address())
    .bind(work_hours)
    .bind(record.id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::bad_request("Already checked out today"));
    }

    let attendance = find_day(pool.get_ref(), auth.user_id, today)
        .await?
        .ok_or(ApiError::Internal)?;

    info!(user_id = auth.user_id, %today, work_hours, "Checked out");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": attendance,
        "message": "Checked out successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's attendance state for the caller", body = TodayStatus),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<AttendanceClock>,
) -> Result<HttpResponse, ApiError> {
    let record = find_day(pool.get_ref(), auth.user_id, clock.today()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": TodayStatus::from(record.as_ref())
    })))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("page", Query, description = "Page number (default 1)"),
        ("limit", Query, description = "Items per page (default 10, max 100)"),
        ("userId", Query, description = "Filter by user (admins only)"),
        ("startDate", Query, description = "Range start, YYYY-MM-DD (with endDate)"),
        ("endDate", Query, description = "Range end, YYYY-MM-DD, inclusive"),
        ("date", Query, description = "Single day, YYYY-MM-DD"),
        ("status", Query, description = "ON_TIME | LATE | ABSENT | HALF_DAY"),
        ("search", Query, description = "Employee name contains"),
        ("department", Query, description = "Employee department")
    ),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let paging = Paging::new(query.page, query.limit);
    let filter = attendance_filter(&auth, &query)?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM attendance a JOIN users u ON u.id = a.user_id {}",
        filter.where_clause()
    );
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind_all(filter.values())
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!("{} LIMIT ? OFFSET ?", joined_select(&filter));
    debug!(sql = %data_sql, page = paging.page, limit = paging.limit, "Fetching attendance");

    let rows = sqlx::query_as::<_, AttendanceUserRow>(&data_sql)
        .bind_all(filter.values())
        .bind(paging.limit as u64)
        .bind(paging.offset())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        attendance: rows.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(paging, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(
        ("userId", Query, description = "Filter by user"),
        ("startDate", Query, description = "Range start, YYYY-MM-DD (with endDate)"),
        ("endDate", Query, description = "Range end, YYYY-MM-DD, inclusive"),
        ("date", Query, description = "Single day, YYYY-MM-DD"),
        ("status", Query, description = "ON_TIME | LATE | ABSENT | HALF_DAY"),
        ("search", Query, description = "Employee name contains"),
        ("department", Query, description = "Employee department")
    ),
    responses(
        (status = 200, description = "CSV attendance report", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn export_attendance_csv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<AttendanceClock>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let filter = attendance_filter(&auth, &query)?;
    let rows = sqlx::query_as::<_, AttendanceUserRow>(&joined_select(&filter))
        .bind_all(filter.values())
        .fetch_all(pool.get_ref())
        .await?;

    let records: Vec<AttendanceWithUser> = rows.into_iter().map(Into::into).collect();
    let report = attendance_report(&records, &clock);

    info!(admin_id = auth.user_id, rows = records.len(), "Attendance report exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"attendance-report-{}.csv\"",
                clock.today().format("%Y-%m-%d")
            ),
        ))
        .body(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::utils::db_utils::SqlValue;
    use chrono::TimeZone;

    fn auth(role: Role) -> AuthUser {
        AuthUser {
            user_id: 7,
            email: "someone@company.com".into(),
            role,
        }
    }

    #[test]
    fn employees_are_pinned_to_their_own_rows() {
        let query = AttendanceQuery {
            user_id: Some(99),
            ..Default::default()
        };

        let filter = attendance_filter(&auth(Role::Employee), &query).unwrap();
        assert_eq!(filter.where_clause(), "WHERE a.user_id = ?");
        assert_eq!(filter.values(), &[SqlValue::U64(7)]);

        let filter = attendance_filter(&auth(Role::Admin), &query).unwrap();
        assert_eq!(filter.values(), &[SqlValue::U64(99)]);

        let filter = attendance_filter(&auth(Role::Admin), &AttendanceQuery::default()).unwrap();
        assert_eq!(filter.where_clause(), "");
    }

    #[test]
    fn date_range_wins_over_single_date() {
        let query = AttendanceQuery {
            start_date: Some("2026-01-01".into()),
            end_date: Some("2026-01-31".into()),
            date: Some("2026-01-15".into()),
            status: Some("LATE".into()),
            search: Some(" ali ".into()),
            department: Some("Sales".into()),
            ..Default::default()
        };

        let filter = attendance_filter(&auth(Role::Admin), &query).unwrap();
        assert_eq!(
            filter.where_clause(),
            "WHERE a.date BETWEEN ? AND ? AND a.status = ? AND u.name LIKE ? AND u.department = ?"
        );
        assert_eq!(filter.values()[2], SqlValue::from("LATE"));
        assert_eq!(filter.values()[3], SqlValue::from("%ali%"));
    }

    #[test]
    fn bad_filters_are_rejected() {
        let query = AttendanceQuery {
            status: Some("EARLY".into()),
            ..Default::default()
        };
        let err = attendance_filter(&auth(Role::Admin), &query).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid status. Allowed: ON_TIME, LATE, ABSENT, HALF_DAY"
        );

        let query = AttendanceQuery {
            date: Some("15/01/2026".into()),
            ..Default::default()
        };
        assert!(attendance_filter(&auth(Role::Admin), &query).is_err());
    }

    #[test]
    fn location_payload_checks_coordinates() {
        let payload = LocationPayload {
            latitude: 12.97,
            longitude: 77.59,
            address: Some("   ".into()),
        };
        assert!(payload.validate().is_ok());
        assert_eq!(payload.address(), None);

        let payload = LocationPayload {
            latitude: 120.0,
            longitude: 77.59,
            address: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn today_status_reflects_the_row() {
        let empty = TodayStatus::from(None);
        assert!(!empty.is_checked_in && !empty.is_checked_out);
        assert_eq!(empty.status, None);

        let at = Utc.with_ymd_and_hms(2026, 1, 5, 3, 40, 0).unwrap();
        let record = Attendance {
            id: 1,
            user_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            check_in_time: Some(at),
            check_out_time: None,
            check_in_lat: None,
            check_in_lng: None,
            check_out_lat: None,
            check_out_lng: None,
            check_in_addr: None,
            check_out_addr: None,
            status: AttendanceStatus::OnTime,
            work_hours: None,
            notes: None,
            created_at: at,
            updated_at: at,
        };

        let status = TodayStatus::from(Some(&record));
        assert!(status.is_checked_in);
        assert!(!status.is_checked_out);
        assert_eq!(status.status, Some(AttendanceStatus::OnTime));

        // a pre-created row keeps its status before any check-in
        let pending = Attendance {
            check_in_time: None,
            status: AttendanceStatus::Absent,
            ..record
        };
        let status = TodayStatus::from(Some(&pending));
        assert!(!status.is_checked_in);
        assert_eq!(status.status, Some(AttendanceStatus::Absent));
    }
}
