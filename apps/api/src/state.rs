use std::sync::Arc;

use storefront_application::{
    AccountRepository, AuditTrailService, AuthorizationService, PaymentService, RoleService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub audit_trail_service: AuditTrailService,
    pub authorization_service: AuthorizationService,
    pub role_service: RoleService,
    pub payment_service: PaymentService,
    pub account_repository: Arc<dyn AccountRepository>,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
