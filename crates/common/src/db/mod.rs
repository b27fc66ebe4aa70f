//! Database layer for the sandbox
//!
//! Provides:
//! - Bounded Postgres connection pool from configuration
//! - Connectivity check
//! - Idempotent bootstrap of the tenant directory and dev tenant

mod bootstrap;

pub use bootstrap::bootstrap;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Create the shared connection pool from configuration
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    info!(
        max_connections = config.max_connections,
        "Connecting to database..."
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to connect to database: {}", e),
        })?;

    info!("Database connection established");

    Ok(pool)
}

/// Create a pool without establishing connections up front.
///
/// Used by tests that exercise code paths which never touch the database.
pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy(&config.url)
        .map_err(|e| AppError::Configuration {
            message: format!("Invalid database URL: {}", e),
        })
}

/// Ping the database to check connectivity
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
