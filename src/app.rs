use std::sync::Arc;

use axum::{Router, middleware};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::database::Database;
use crate::error::redact_error_details;
use crate::handlers::mark_started;
use crate::rate_limit::RateLimiter;
use crate::routes::create_routes;

/// Shared state handed to every handler and middleware
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rate_limiter: Arc<RateLimiter>,
    pub database: Database,
}

impl AppState {
    /// Builds state with a lazily connecting pool. Needs a tokio runtime.
    pub fn new(config: Config) -> Self {
        mark_started();
        let database = Database::connect_lazy(&config.database);
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::default()),
            database,
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = Arc::new(rate_limiter);
        self
    }
}

/// Initialize tracing and logging for the application
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "netzero_chat_server=info,tower_http=debug,axum::rejection=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Builds the router for already-constructed state, without side effects
pub fn build_router(state: AppState) -> Router {
    create_routes(state.clone())
        .with_state(state.clone())
        .layer(middleware::map_response_with_state(state, redact_error_details))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Create and configure the Axum application with all routes and middleware
pub async fn create_app(config: Config) -> Result<Router, anyhow::Error> {
    info!("Initializing application router");
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; all chat requests will be treated as anonymous");
    }

    let state = AppState::new(config);

    info!("Probing database connectivity...");
    if !state.database.test_connection().await {
        warn!("Continuing without a database connection");
    }

    spawn_rate_limit_purge(state.rate_limiter.clone());

    Ok(build_router(state))
}

fn spawn_rate_limit_purge(rate_limiter: Arc<RateLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(rate_limiter.window());
        loop {
            ticker.tick().await;
            rate_limiter.purge_expired();
        }
    });
}
