use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const WORK_START_TIME: &str = "work_start_time";
pub const WORK_END_TIME: &str = "work_end_time";
pub const LATE_THRESHOLD_MINUTES: &str = "late_threshold_minutes";
pub const COMPANY_NAME: &str = "company_name";
pub const COMPANY_EMAIL: &str = "company_email";
pub const TIMEZONE: &str = "timezone";

/// Rows inserted on first start when absent: (key, value, description)
pub const DEFAULT_SETTINGS: [(&str, &str, &str); 6] = [
    (WORK_START_TIME, "09:00", "Official work start time"),
    (WORK_END_TIME, "18:00", "Official work end time"),
    (LATE_THRESHOLD_MINUTES, "15", "Minutes after start time to mark as late"),
    (COMPANY_NAME, "My Company", "Company name"),
    (COMPANY_EMAIL, "admin@example.com", "Company contact email"),
    (TIMEZONE, "Asia/Kolkata", "Default timezone"),
];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub id: u64,
    #[schema(example = "work_start_time")]
    pub key: String,
    #[schema(example = "09:00")]
    pub value: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}
