use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use storefront_core::{AppError, AppResult, UserIdentity};
use storefront_domain::{
    AuditAction, EmailAddress, FollowUpTask, NewAuditEntry, RoleType, UserId,
};
use tracing::{error, info};

use crate::{
    AccountRecord, AccountRepository, AuthorizationService, FollowUpService, RoleChange,
    RoleChangeOutcome,
};

const ROLE_UPDATE_FAILED: &str = "failed to update account roles";

/// Result of a self-service elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleElevation {
    /// The role was granted by this call.
    Elevated,
    /// The account already held the role; nothing changed.
    AlreadyHeld,
}

/// Application service for role elevation and administrative role changes.
///
/// Membership, audit entry and follow-up enqueueing commit together. The
/// follow-ups (notification email, refresh token revocation) are then
/// dispatched inline and retried by the worker when they fail.
#[derive(Clone)]
pub struct RoleService {
    accounts: Arc<dyn AccountRepository>,
    authorization_service: AuthorizationService,
    follow_up_service: FollowUpService,
}

impl RoleService {
    /// Creates a new role service.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        authorization_service: AuthorizationService,
        follow_up_service: FollowUpService,
    ) -> Self {
        Self {
            accounts,
            authorization_service,
            follow_up_service,
        }
    }

    /// Promotes the calling account to individual seller.
    pub async fn become_individual_seller(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<RoleElevation> {
        self.elevate(actor, RoleType::Seller).await
    }

    /// Grants a self-service role to the calling account, at most once.
    pub async fn elevate(&self, actor: &UserIdentity, role: RoleType) -> AppResult<RoleElevation> {
        if role != RoleType::Seller {
            return Err(AppError::Forbidden(format!(
                "role '{role}' cannot be self-assigned"
            )));
        }

        let account = self
            .accounts
            .find_by_id(UserId::from_uuid(actor.account_id()))
            .await
            .map_err(role_persistence_error)?
            .ok_or_else(|| {
                AppError::NotFound(format!("account '{}' not found", actor.account_id()))
            })?;

        if account.has_role(role) {
            return Ok(RoleElevation::AlreadyHeld);
        }

        let email = account.email.as_str();
        let audit_entry = NewAuditEntry::new(
            email,
            AuditAction::BecomeIndividualSeller.as_str(),
            format!("User assigned {role} role"),
        )?
        .with_performed_by(Some(email.to_owned()))
        .with_role_name(Some(role.as_str().to_owned()));

        let change = RoleChange {
            account_id: account.id,
            role,
            audit_entry,
            follow_ups: vec![
                FollowUpTask::SendEmail {
                    to: email.to_owned(),
                    subject: "Assigned Individual Seller Role".to_owned(),
                    body: format!("You have been assigned the {role} role."),
                },
                FollowUpTask::RevokeRefreshTokens {
                    account_id: account.id.as_uuid(),
                },
            ],
        };

        match self
            .accounts
            .grant_role(change)
            .await
            .map_err(role_persistence_error)?
        {
            RoleChangeOutcome::Applied { follow_ups } => {
                info!(account_id = %account.id, role = %role, "account elevated");
                self.follow_up_service.dispatch_all(&follow_ups).await;
                Ok(RoleElevation::Elevated)
            }
            RoleChangeOutcome::Unchanged => Ok(RoleElevation::AlreadyHeld),
        }
    }

    /// Grants a role to another account. Requires `APP_ADMIN`.
    pub async fn assign_role(
        &self,
        admin: &UserIdentity,
        email: &str,
        role: &str,
    ) -> AppResult<AccountRecord> {
        let admin_account = self
            .authorization_service
            .require_role(admin, RoleType::AppAdmin)
            .await?;
        let role = RoleType::from_str(role)?;
        let account = self.find_account_by_email(email).await?;

        if account.has_role(role) {
            return Err(AppError::Conflict(format!(
                "account '{}' already has role {role}",
                account.email.as_str()
            )));
        }

        let change = admin_role_change(
            &account,
            role,
            AuditAction::AssignRole,
            admin_account.email.as_str(),
            format!("Assigned role: {role} to user: {}", account.email.as_str()),
            format!("The {role} role was assigned to your account by an administrator."),
        )?;

        match self
            .accounts
            .grant_role(change)
            .await
            .map_err(role_persistence_error)?
        {
            RoleChangeOutcome::Applied { follow_ups } => {
                info!(account_id = %account.id, role = %role, "role assigned");
                self.follow_up_service.dispatch_all(&follow_ups).await;
            }
            RoleChangeOutcome::Unchanged => {
                return Err(AppError::Conflict(format!(
                    "account '{}' already has role {role}",
                    account.email.as_str()
                )));
            }
        }

        self.reload(account.id).await
    }

    /// Removes a role from another account. Requires `APP_ADMIN`.
    pub async fn remove_role(
        &self,
        admin: &UserIdentity,
        email: &str,
        role: &str,
    ) -> AppResult<AccountRecord> {
        let admin_account = self
            .authorization_service
            .require_role(admin, RoleType::AppAdmin)
            .await?;
        let role = RoleType::from_str(role)?;
        if role == RoleType::Buyer {
            return Err(AppError::Validation("cannot remove BUYER role".to_owned()));
        }

        let account = self.find_account_by_email(email).await?;
        if !account.has_role(role) {
            return Err(AppError::Conflict(format!(
                "account '{}' does not have role {role}",
                account.email.as_str()
            )));
        }

        let change = admin_role_change(
            &account,
            role,
            AuditAction::RemoveRole,
            admin_account.email.as_str(),
            format!("Removed role: {role} from user: {}", account.email.as_str()),
            format!("The {role} role was removed from your account by an administrator."),
        )?;

        match self
            .accounts
            .revoke_role(change)
            .await
            .map_err(role_persistence_error)?
        {
            RoleChangeOutcome::Applied { follow_ups } => {
                info!(account_id = %account.id, role = %role, "role removed");
                self.follow_up_service.dispatch_all(&follow_ups).await;
            }
            RoleChangeOutcome::Unchanged => {
                return Err(AppError::Conflict(format!(
                    "account '{}' does not have role {role}",
                    account.email.as_str()
                )));
            }
        }

        self.reload(account.id).await
    }

    /// Returns the current role set of an account. Requires `APP_ADMIN`.
    pub async fn roles_of(
        &self,
        admin: &UserIdentity,
        email: &str,
    ) -> AppResult<BTreeSet<RoleType>> {
        self.authorization_service
            .require_role(admin, RoleType::AppAdmin)
            .await?;
        Ok(self.find_account_by_email(email).await?.roles)
    }

    async fn find_account_by_email(&self, email: &str) -> AppResult<AccountRecord> {
        let email = EmailAddress::new(email)?;
        self.accounts
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account '{}' not found", email.as_str())))
    }

    async fn reload(&self, account_id: UserId) -> AppResult<AccountRecord> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account '{account_id}' not found")))
    }
}

fn admin_role_change(
    account: &AccountRecord,
    role: RoleType,
    action: AuditAction,
    admin_email: &str,
    details: String,
    notification: String,
) -> AppResult<RoleChange> {
    let email = account.email.as_str();
    let audit_entry = NewAuditEntry::new(email, action.as_str(), details)?
        .with_performed_by(Some(admin_email.to_owned()))
        .with_role_name(Some(role.as_str().to_owned()));

    Ok(RoleChange {
        account_id: account.id,
        role,
        audit_entry,
        follow_ups: vec![
            FollowUpTask::SendEmail {
                to: email.to_owned(),
                subject: "Your account roles have changed".to_owned(),
                body: notification,
            },
            FollowUpTask::RevokeRefreshTokens {
                account_id: account.id.as_uuid(),
            },
        ],
    })
}

// Storage detail stays in the log; callers only see a generic message.
fn role_persistence_error(source: AppError) -> AppError {
    match source {
        AppError::NotFound(_) => source,
        other => {
            error!(error = %other, "account role update failed");
            AppError::Internal(ROLE_UPDATE_FAILED.to_owned())
        }
    }
}
