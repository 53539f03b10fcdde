pub mod auth;
pub mod config;
pub mod courses;
pub mod db;
pub mod email;
pub mod error;
pub mod groups;
pub mod users;

use actix_web::{web, HttpResponse};
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthService, RateLimitConfig, RateLimiter};
pub use db::{DbOperations, User, UserSession};

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and pool stats
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let pool = state.db.get_pool_status().await.ok();

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "db_pool": pool,
    }))
}

/// Application state shared across all requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: DbOperations,
    pub auth: Arc<AuthService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(5),
        )
        .await?;

        Ok(Self::from_parts(config, db))
    }

    /// Wires the state from an existing pool; tests use this with a lazy pool.
    pub fn from_parts(config: Settings, db: DbOperations) -> Self {
        let email = email::from_config(&config.email);

        let auth = Arc::new(AuthService::new(
            db.clone(),
            email,
            config.auth.allowed_email_domain.clone(),
            config.auth.access_token_minutes,
            config.auth.refresh_token_days,
            config.auth.signup_code_ttl_minutes,
        ));

        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests: config.rate_limit.max_requests,
            window: ChronoDuration::seconds(config.rate_limit.window_seconds),
        }));

        Self {
            config: Arc::new(config),
            db,
            auth,
            rate_limiter,
        }
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db.pool().close().await;
        Ok(())
    }
}
