use axum::Json;
use axum::extract::{Extension, Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use storefront_core::UserIdentity;
use storefront_domain::AuditLogFilter;

use crate::dto::AuditLogPageResponse;
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub user_email: Option<String>,
    pub role_name: Option<String>,
    pub action: Option<String>,
    pub details: Option<String>,
    pub performed_by: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditLogQuery {
    fn into_filter(self) -> (i64, i64, AuditLogFilter) {
        (
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
            AuditLogFilter {
                subject_email: self.user_email,
                role_name: self.role_name,
                action: self.action,
                details: self.details,
                performed_by: self.performed_by,
                start_time: self.start_date,
                end_time: self.end_date,
            },
        )
    }
}

pub async fn list_audit_logs_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<AuditLogPageResponse>> {
    let (page, size, filter) = query.into_filter();
    let entries = state
        .audit_trail_service
        .list_entries(&user, page, size, filter)
        .await?;

    Ok(Json(AuditLogPageResponse::from(entries)))
}
