use std::sync::Arc;

use storefront_core::{AppError, AppResult, UserIdentity};
use storefront_domain::{RoleType, UserId};

use crate::{AccountRecord, AccountRepository};

/// Application service for role-based authorization checks.
///
/// Roles are always read from the account store so that a revoked role
/// takes effect on the next request.
#[derive(Clone)]
pub struct AuthorizationService {
    accounts: Arc<dyn AccountRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from an account repository.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Loads the account behind an authenticated identity.
    pub async fn current_account(&self, actor: &UserIdentity) -> AppResult<AccountRecord> {
        self.accounts
            .find_by_id(UserId::from_uuid(actor.account_id()))
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(format!(
                    "account '{}' no longer exists",
                    actor.account_id()
                ))
            })
    }

    /// Ensures the actor currently holds the role and returns its account.
    pub async fn require_role(
        &self,
        actor: &UserIdentity,
        role: RoleType,
    ) -> AppResult<AccountRecord> {
        let account = self.current_account(actor).await?;
        if !account.has_role(role) {
            return Err(AppError::Forbidden(format!(
                "account '{}' is missing role '{role}'",
                account.email.as_str()
            )));
        }

        Ok(account)
    }
}
