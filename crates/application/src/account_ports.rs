use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_core::AppResult;
use storefront_domain::{EmailAddress, FollowUpJob, FollowUpTask, NewAuditEntry, RoleType, UserId};

/// Account projection with its current role set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Account identifier.
    pub id: UserId,
    /// Registered contact email.
    pub email: EmailAddress,
    /// Name shown in the storefront.
    pub display_name: String,
    /// Roles currently held.
    pub roles: BTreeSet<RoleType>,
}

impl AccountRecord {
    /// Returns whether the account currently holds the role.
    #[must_use]
    pub fn has_role(&self, role: RoleType) -> bool {
        self.roles.contains(&role)
    }
}

/// One membership change plus everything that must commit with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    /// Account whose memberships change.
    pub account_id: UserId,
    /// Role granted or revoked.
    pub role: RoleType,
    /// Audit entry written in the same transaction.
    pub audit_entry: NewAuditEntry,
    /// Follow-ups enqueued in the same transaction.
    pub follow_ups: Vec<FollowUpTask>,
}

/// Result of a role change transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChangeOutcome {
    /// Membership changed; the queued follow-ups are returned for dispatch.
    Applied {
        /// Follow-up jobs enqueued by the transaction.
        follow_ups: Vec<FollowUpJob>,
    },
    /// Membership already matched the requested state; nothing was written.
    Unchanged,
}

/// Repository port for accounts and their role memberships.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Finds an account by identifier.
    async fn find_by_id(&self, account_id: UserId) -> AppResult<Option<AccountRecord>>;

    /// Finds an account by normalized email.
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<AccountRecord>>;

    /// Returns the account for an email, registering it as a buyer first
    /// when it does not exist yet.
    async fn ensure_account(
        &self,
        email: &EmailAddress,
        display_name: &str,
    ) -> AppResult<AccountRecord>;

    /// Grants a role in one transaction: creates the role type if absent,
    /// inserts the membership, writes the audit entry and enqueues follow-ups.
    ///
    /// Returns `Unchanged` without writing anything when the role is
    /// already held.
    async fn grant_role(&self, change: RoleChange) -> AppResult<RoleChangeOutcome>;

    /// Revokes a role in one transaction with its audit entry and follow-ups.
    ///
    /// Returns `Unchanged` when the role is not held.
    async fn revoke_role(&self, change: RoleChange) -> AppResult<RoleChangeOutcome>;
}

/// Repository port for removing session refresh credentials.
///
/// Tokens are issued by the sign-in flow; the core only deletes them.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Deletes every refresh token of an account. Returns the deleted count.
    async fn delete_for_account(&self, account_id: UserId) -> AppResult<u64>;

    /// Deletes tokens that are revoked or expired before `now`.
    async fn delete_expired_or_revoked(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
