use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::user::UserSummary;

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TryFrom<String> for TaskPriority {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    #[schema(example = "Prepare monthly report")]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: u64,
    #[schema(example = "2026-02-01T00:00:00Z", format = "date-time", value_type = String)]
    pub due_date: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithUser {
    #[serde(flatten)]
    pub task: Task,
    pub user: UserSummary,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TaskUserRow {
    #[sqlx(flatten)]
    pub task: Task,
    pub user_name: String,
    pub user_email: String,
    pub user_department: Option<String>,
    pub user_position: Option<String>,
}

impl From<TaskUserRow> for TaskWithUser {
    fn from(row: TaskUserRow) -> Self {
        let user = UserSummary {
            id: row.task.assigned_to,
            name: row.user_name,
            email: row.user_email,
            department: row.user_department,
            position: row.user_position,
        };
        TaskWithUser {
            task: row.task,
            user,
        }
    }
}
