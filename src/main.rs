use actix_web::middleware::{DefaultHeaders, Logger, NormalizePath, from_fn};
use actix_web::web::{Data, JsonConfig, PathConfig, QueryConfig};
use actix_web::{App, HttpServer};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod pages;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::auth::middleware::page_guard;
use crate::docs::ApiDoc;
use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::routes::RateLimits;
use crate::utils::clock::AttendanceClock;
use tracing::{Level, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let level = config.log_level.parse::<Level>().unwrap_or(Level::DEBUG);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let clock = AttendanceClock::from_offset_minutes(config.attendance_utc_offset_minutes)?;
    let pool = init_db(&config.database_url).await?;
    db::seed(&pool, &config).await?;
    let limits = RateLimits::from_config(&config)?;

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, offset_minutes = config.attendance_utc_offset_minutes, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(page_guard))
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .app_data(JsonConfig::default().error_handler(json_error_handler))
            .app_data(QueryConfig::default().error_handler(query_error_handler))
            .app_data(PathConfig::default().error_handler(path_error_handler))
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(clock))
            .service(
                // wildcard {_:.*} matches the UI's JS/CSS files
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(|cfg| routes::configure(cfg, &config, &limits))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
