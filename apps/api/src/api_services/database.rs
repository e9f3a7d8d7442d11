use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use storefront_core::AppError;
use tracing::info;

const API_MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT_SECONDS: u64 = 5;

/// Connects the request pool and brings the schema up to date.
pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(API_MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECONDS))
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    let migrator = sqlx::migrate!("../../crates/infrastructure/migrations");
    migrator
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;
    info!(migrations = migrator.iter().count(), "database schema up to date");

    Ok(pool)
}
