use std::time::Duration;

use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use tracing::{error, info};

use crate::config::DatabaseConfig;

/// Upper bound on pooled MySQL connections.
pub const MAX_CONNECTIONS: u32 = 10;

/// Shared MySQL connection pool.
///
/// The pool connects lazily, so building it never touches the network; the
/// chat routes do not use it at all.
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Must be called from within a tokio runtime.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy_with(options);

        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Runs a trivial query against the database.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Probes connectivity, logging the outcome.
    pub async fn test_connection(&self) -> bool {
        match self.ping().await {
            Ok(()) => {
                info!("Database connected successfully");
                true
            }
            Err(e) => {
                error!("Database connection failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let database = Database::connect_lazy(&DatabaseConfig::default());
        assert_eq!(database.pool().size(), 0);
        assert!(!database.pool().is_closed());
    }

    #[tokio::test]
    async fn test_unreachable_database_reports_false() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            // Reserved port, nothing listens there.
            port: 1,
            ..DatabaseConfig::default()
        };
        let database = Database::connect_lazy(&config);
        assert!(!database.test_connection().await);
    }
}
