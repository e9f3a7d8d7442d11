//! PostgreSQL-backed refresh token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storefront_application::RefreshTokenRepository;
use storefront_core::{AppError, AppResult};
use storefront_domain::UserId;

/// PostgreSQL implementation of the refresh token repository port.
#[derive(Clone)]
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn delete_for_account(&self, account_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete account refresh tokens: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_or_revoked(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE revoked
               OR expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to purge stale refresh tokens: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}
