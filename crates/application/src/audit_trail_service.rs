use std::sync::Arc;

use storefront_core::{AppResult, UserIdentity};
use storefront_domain::{AuditEntry, AuditLogFilter, NewAuditEntry, Page, PageRequest, RoleType};
use tracing::debug;

use crate::{AuditTrailRepository, AuthorizationService};

/// Application service for recording and querying the audit trail.
#[derive(Clone)]
pub struct AuditTrailService {
    repository: Arc<dyn AuditTrailRepository>,
    authorization_service: AuthorizationService,
}

impl AuditTrailService {
    /// Creates a new audit trail service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuditTrailRepository>,
        authorization_service: AuthorizationService,
    ) -> Self {
        Self {
            repository,
            authorization_service,
        }
    }

    /// Appends one immutable entry. Only a blank `action` is rejected.
    pub async fn record(
        &self,
        subject_email: &str,
        action: &str,
        performed_by: Option<&str>,
        role_name: Option<&str>,
        details: &str,
    ) -> AppResult<AuditEntry> {
        let entry = NewAuditEntry::new(subject_email, action, details)?
            .with_performed_by(performed_by.map(str::to_owned))
            .with_role_name(role_name.map(str::to_owned));

        let stored = self.repository.append_entry(entry).await?;
        debug!(
            audit_entry_id = stored.id,
            action = %stored.action,
            "audit entry recorded"
        );
        Ok(stored)
    }

    /// Returns one page of entries matching every supplied filter.
    pub async fn query(
        &self,
        page: i64,
        page_size: i64,
        filter: AuditLogFilter,
    ) -> AppResult<Page<AuditEntry>> {
        let request = PageRequest::new(page, page_size)?;
        filter.validate()?;
        self.repository.query_entries(&filter, request).await
    }

    /// Administrative listing; the actor must currently hold `APP_ADMIN`.
    pub async fn list_entries(
        &self,
        actor: &UserIdentity,
        page: i64,
        page_size: i64,
        filter: AuditLogFilter,
    ) -> AppResult<Page<AuditEntry>> {
        self.authorization_service
            .require_role(actor, RoleType::AppAdmin)
            .await?;
        self.query(page, page_size, filter).await
    }
}
