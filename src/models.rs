use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@example.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "secret123", value_type = String)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: u64,
    /// email
    pub sub: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "Administrator")]
    pub name: String,
    pub role: Role,
}

// SESSION
//  └─ auth_token cookie (HTTP-only, 7 days), HS256 JWT

// API REQUEST
//  └─ cookie, or Authorization: Bearer <token> for non-browser clients
