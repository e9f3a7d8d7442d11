//! PostgreSQL fixtures for repository tests. Tests skip when `DATABASE_URL` is unset.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}

/// Unique lower-case address so parallel tests never collide.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub async fn insert_account(pool: &PgPool, email: &str) -> Uuid {
    let account_id = Uuid::new_v4();
    let insert = sqlx::query(
        r#"
            INSERT INTO accounts (id, email, display_name)
            VALUES ($1, $2, $2)
            "#,
    )
    .bind(account_id)
    .bind(email)
    .execute(pool)
    .await;
    assert!(insert.is_ok());
    account_id
}

/// Seeds a refresh token the way the sign-in flow would issue it.
pub async fn insert_refresh_token(
    pool: &PgPool,
    account_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked: bool,
) -> Uuid {
    let token_id = Uuid::new_v4();
    let insert = sqlx::query(
        r#"
            INSERT INTO refresh_tokens (id, account_id, token_hash, expires_at, revoked)
            VALUES ($1, $2, $3, $4, $5)
            "#,
    )
    .bind(token_id)
    .bind(account_id)
    .bind(Uuid::new_v4().simple().to_string())
    .bind(expires_at)
    .bind(revoked)
    .execute(pool)
    .await;
    assert!(insert.is_ok());
    token_id
}
