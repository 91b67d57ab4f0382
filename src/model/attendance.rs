use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::user::UserSummary;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    Absent,
    HalfDay,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,

    /// Attendance day in the configured attendance time zone
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "2026-01-05T03:40:00Z", format = "date-time", value_type = String)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-05T12:45:00Z", format = "date-time", value_type = String)]
    pub check_out_time: Option<DateTime<Utc>>,

    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,
    pub check_in_addr: Option<String>,
    pub check_out_addr: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,

    #[schema(example = 9.08)]
    pub work_hours: Option<f64>,
    pub notes: Option<String>,

    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

pub const ATTENDANCE_COLUMNS: &str = "id, user_id, date, check_in_time, check_out_time, \
    check_in_lat, check_in_lng, check_out_lat, check_out_lng, check_in_addr, check_out_addr, \
    status, work_hours, notes, created_at, updated_at";

/// Attendance joined with the owning user, as listed to admins and exported to CSV
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceWithUser {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub user: UserSummary,
}

/// Flat row produced by the attendance/user join
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceUserRow {
    #[sqlx(flatten)]
    pub attendance: Attendance,
    pub user_name: String,
    pub user_email: String,
    pub user_department: Option<String>,
    pub user_position: Option<String>,
}

impl From<AttendanceUserRow> for AttendanceWithUser {
    fn from(row: AttendanceUserRow) -> Self {
        let user = UserSummary {
            id: row.attendance.user_id,
            name: row.user_name,
            email: row.user_email,
            department: row.user_department,
            position: row.user_position,
        };
        AttendanceWithUser {
            attendance: row.attendance,
            user,
        }
    }
}
