use crate::{
    api::{attendance, dashboard, employee, settings, task},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    pages,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter settings, built once and shared by every worker
#[derive(Clone)]
pub struct RateLimits {
    login: LimiterConfig,
    protected: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<LimiterConfig> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests/min"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    let prefix = config.api_prefix.trim_end_matches('/').to_string();

    // Public API routes
    cfg.service(
        web::resource(format!("{prefix}/auth/login"))
            .wrap(Governor::new(&limits.login))
            .route(web::post().to(handlers::login)),
    )
    .service(
        web::resource(format!("{prefix}/auth/logout"))
            .wrap(Governor::new(&limits.login))
            .route(web::post().to(handlers::logout)),
    );

    // Protected API routes
    cfg.service(
        web::scope(&prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(Governor::new(&limits.protected))
            .route("/auth/me", web::get().to(handlers::me))
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    .route("/check-in", web::post().to(attendance::check_in))
                    .route("/check-out", web::post().to(attendance::check_out))
                    .route("/today", web::get().to(attendance::today_status))
                    .route("/export", web::get().to(attendance::export_attendance_csv)),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::patch().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/tasks")
                    // /tasks
                    .service(
                        web::resource("")
                            .route(web::get().to(task::list_tasks))
                            .route(web::post().to(task::create_task)),
                    )
                    // /tasks/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::patch().to(task::update_task))
                            .route(web::delete().to(task::delete_task)),
                    ),
            )
            .service(
                web::resource("/settings")
                    .route(web::get().to(settings::get_settings))
                    .route(web::put().to(settings::update_settings)),
            )
            .route("/dashboard", web::get().to(dashboard::dashboard)),
    );

    // Browser pages, guarded by page_guard at the app level
    cfg.configure(pages::configure);
}


// SESSION
//  └─ POST {prefix}/auth/login sets the auth_token cookie (7 days)

// API REQUEST
//  └─ auth_token cookie, or Authorization: Bearer <token>

// PAGE REQUEST
//  └─ page_guard redirects by role before the HTML shell is served
