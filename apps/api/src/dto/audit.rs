use serde::Serialize;
use storefront_domain::{AuditEntry, Page};
use ts_rs::TS;

/// API representation of one audit entry.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub user_email: String,
    pub action: String,
    pub performed_by: Option<String>,
    pub role_name: Option<String>,
    pub details: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl From<AuditEntry> for AuditLogEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            user_email: entry.subject_email,
            action: entry.action,
            performed_by: entry.performed_by,
            role_name: entry.role_name,
            details: entry.details,
            timestamp: entry.timestamp.to_rfc3339(),
        }
    }
}

/// One page of audit entries.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-page-response.ts"
)]
pub struct AuditLogPageResponse {
    pub content: Vec<AuditLogEntryResponse>,
    pub page: u32,
    pub size: u32,
    #[ts(type = "number")]
    pub total_elements: u64,
    #[ts(type = "number")]
    pub total_pages: u64,
}

impl From<Page<AuditEntry>> for AuditLogPageResponse {
    fn from(page: Page<AuditEntry>) -> Self {
        let total_pages = page.total_pages();
        Self {
            page: page.page,
            size: page.page_size,
            total_elements: page.total_elements,
            total_pages,
            content: page
                .items
                .into_iter()
                .map(AuditLogEntryResponse::from)
                .collect(),
        }
    }
}
