//! Application services and ports.

#![forbid(unsafe_code)]

mod account_ports;
mod audit_ports;
mod audit_trail_service;
mod authorization_service;
mod credential_cleanup_service;
mod follow_up_ports;
mod follow_up_service;
mod notification_ports;
mod payment_ports;
mod payment_service;
mod role_service;

#[cfg(test)]
mod test_support;

pub use account_ports::{
    AccountRecord, AccountRepository, RefreshTokenRepository, RoleChange, RoleChangeOutcome,
};
pub use audit_ports::AuditTrailRepository;
pub use audit_trail_service::AuditTrailService;
pub use authorization_service::AuthorizationService;
pub use credential_cleanup_service::CredentialCleanupService;
pub use follow_up_ports::FollowUpQueueRepository;
pub use follow_up_service::{FollowUpBatchSummary, FollowUpOutcome, FollowUpService};
pub use notification_ports::EmailService;
pub use payment_ports::{
    CheckoutSession, CheckoutSessionRequest, OrderRepository, PaymentGateway, PaymentRepository,
};
pub use payment_service::{
    CHECKOUT_SESSION_PLACEHOLDER, CheckoutRedirectUrls, InitiatePaymentInput, PaymentInitiation,
    PaymentService,
};
pub use role_service::{RoleElevation, RoleService};
