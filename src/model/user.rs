use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "jane.doe@company.com")]
    pub email: String,

    /// argon2 PHC string, never serialized
    #[serde(skip_serializing, default)]
    #[schema(write_only)]
    pub password: String,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[sqlx(try_from = "String")]
    pub role: Role,

    #[schema(example = "+919876543210", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Developer", nullable = true)]
    pub position: Option<String>,

    #[schema(nullable = true)]
    pub avatar: Option<String>,

    pub is_active: bool,

    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

pub const USER_COLUMNS: &str = "id, email, password, name, role, phone, department, position, \
                                avatar, is_active, created_at, updated_at";

/// The slice of a user embedded in attendance and task listings
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub position: Option<String>,
}
