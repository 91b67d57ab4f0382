use anyhow::{Context, Result, anyhow};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

use crate::{
    auth::password::hash_password,
    config::Config,
    model::{role::Role, setting::DEFAULT_SETTINGS},
    utils::validation::normalize_email,
};

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Inserts missing default settings and, when configured, the first admin account
pub async fn seed(pool: &MySqlPool, config: &Config) -> Result<()> {
    for (key, value, description) in DEFAULT_SETTINGS {
        sqlx::query("INSERT IGNORE INTO settings (`key`, value, description) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(description)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to seed setting {key}"))?;
    }

    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    let email = normalize_email(email);

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(&email)
            .fetch_one(pool)
            .await?;
    if exists {
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow!("Failed to hash admin password: {e}"))?;

    sqlx::query("INSERT INTO users (email, password, name, role) VALUES (?, ?, ?, ?)")
        .bind(&email)
        .bind(&hashed)
        .bind(&config.admin_name)
        .bind(Role::Admin.to_string())
        .execute(pool)
        .await
        .context("Failed to create admin user")?;

    info!(email = %email, "Seeded admin account");
    Ok(())
}
