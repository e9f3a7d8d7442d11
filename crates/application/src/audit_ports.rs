use async_trait::async_trait;

use storefront_core::AppResult;
use storefront_domain::{AuditEntry, AuditLogFilter, NewAuditEntry, Page, PageRequest};

/// Repository port for the append-only audit trail.
#[async_trait]
pub trait AuditTrailRepository: Send + Sync {
    /// Appends one entry and returns it with its assigned id and timestamp.
    async fn append_entry(&self, entry: NewAuditEntry) -> AppResult<AuditEntry>;

    /// Returns one page of entries matching the filter, ordered by
    /// `(timestamp, id)` ascending, with the total match count.
    async fn query_entries(
        &self,
        filter: &AuditLogFilter,
        page: PageRequest,
    ) -> AppResult<Page<AuditEntry>>;
}
