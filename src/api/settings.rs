use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::setting::{LATE_THRESHOLD_MINUTES, Setting, WORK_END_TIME, WORK_START_TIME},
    utils::attendance_policy::{parse_clock_time, parse_threshold},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct SettingUpdate {
    #[schema(example = "work_start_time")]
    pub key: String,
    #[schema(example = "09:30")]
    pub value: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettings {
    /// Kept as raw JSON so a missing or non-array value gets the generic 400
    #[schema(value_type = Vec<SettingUpdate>)]
    #[serde(default)]
    pub settings: Value,
}

/// Checks shape and per-key format, returning the trimmed updates
fn parse_updates(body: &Value) -> Result<Vec<SettingUpdate>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid request body");

    let items = body.as_array().ok_or_else(invalid)?;
    let updates: Vec<SettingUpdate> = items
        .iter()
        .map(|item| serde_json::from_value::<SettingUpdate>(item.clone()).map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;

    updates
        .into_iter()
        .map(|SettingUpdate { key, value }| {
            let key = key.trim().to_string();
            let value = value.trim().to_string();

            if key.is_empty() || value.is_empty() {
                return Err(ApiError::bad_request("Value is required"));
            }

            match key.as_str() {
                WORK_START_TIME | WORK_END_TIME if parse_clock_time(&value).is_none() => Err(
                    ApiError::bad_request(format!("Invalid {key}, expected HH:MM")),
                ),
                LATE_THRESHOLD_MINUTES if parse_threshold(&value).is_none() => Err(
                    ApiError::bad_request(format!("Invalid {key}, expected a non-negative integer")),
                ),
                _ => Ok(SettingUpdate { key, value }),
            }
        })
        .collect()
}

async fn all_settings(pool: &MySqlPool) -> Result<Vec<Setting>, sqlx::Error> {
    sqlx::query_as::<_, Setting>(
        "SELECT id, `key`, value, description, updated_at FROM settings ORDER BY `key` ASC",
    )
    .fetch_all(pool)
    .await
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "All settings ordered by key", body = [Setting]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Settings",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn get_settings(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let settings = all_settings(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": settings
    })))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = UpdateSettings,
    responses(
        (status = 200, description = "Settings saved, full list returned", body = [Setting]),
        (status = 400, description = "Invalid request body / Value is required"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Settings",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn update_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<UpdateSettings>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let updates = parse_updates(&body.settings)?;

    let mut tx = pool.begin().await?;
    for update in &updates {
        sqlx::query(
            r#"
            INSERT INTO settings (`key`, value)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE value = VALUES(value)
            "#,
        )
        .bind(&update.key)
        .bind(&update.value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    let keys: Vec<&str> = updates.iter().map(|u| u.key.as_str()).collect();
    info!(admin_id = auth.user_id, ?keys, "Settings updated");

    let settings = all_settings(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": settings
    })))
}
