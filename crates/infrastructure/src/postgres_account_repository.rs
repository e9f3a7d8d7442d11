use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use storefront_application::{AccountRecord, AccountRepository, RoleChange, RoleChangeOutcome};
use storefront_core::{AppError, AppResult};
use storefront_domain::{EmailAddress, RoleType, UserId};

use crate::postgres_audit_trail_repository::insert_audit_entry;
use crate::postgres_follow_up_queue_repository::enqueue_follow_ups;

mod lookup;
mod roles;

/// PostgreSQL-backed account and role membership repository.
#[derive(Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    display_name: String,
    roles: Vec<String>,
}

impl TryFrom<AccountRow> for AccountRecord {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|name| {
                RoleType::from_str(name).map_err(|_| {
                    AppError::Internal(format!(
                        "account '{}' holds unknown role '{name}'",
                        row.id
                    ))
                })
            })
            .collect::<AppResult<BTreeSet<_>>>()?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            email: EmailAddress::new(row.email)?,
            display_name: row.display_name,
            roles,
        })
    }
}

/// Returns the id of a role type, creating the row on first use.
async fn ensure_role_type(connection: &mut PgConnection, role: RoleType) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO role_types (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(role.as_str())
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to resolve role type '{role}': {error}")))
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_id(&self, account_id: UserId) -> AppResult<Option<AccountRecord>> {
        self.find_by_id_impl(account_id).await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<AccountRecord>> {
        self.find_by_email_impl(email).await
    }

    async fn ensure_account(
        &self,
        email: &EmailAddress,
        display_name: &str,
    ) -> AppResult<AccountRecord> {
        self.ensure_account_impl(email, display_name).await
    }

    async fn grant_role(&self, change: RoleChange) -> AppResult<RoleChangeOutcome> {
        self.grant_role_impl(change).await
    }

    async fn revoke_role(&self, change: RoleChange) -> AppResult<RoleChangeOutcome> {
        self.revoke_role_impl(change).await
    }
}
