//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod postgres_account_repository;
mod postgres_audit_trail_repository;
mod postgres_follow_up_queue_repository;
mod postgres_order_repository;
mod postgres_payment_repository;
mod postgres_refresh_token_repository;
mod smtp_email_service;
mod stripe_payment_gateway;

#[cfg(test)]
mod test_support;

pub use console_email_service::ConsoleEmailService;
pub use postgres_account_repository::PostgresAccountRepository;
pub use postgres_audit_trail_repository::PostgresAuditTrailRepository;
pub use postgres_follow_up_queue_repository::PostgresFollowUpQueueRepository;
pub use postgres_order_repository::PostgresOrderRepository;
pub use postgres_payment_repository::PostgresPaymentRepository;
pub use postgres_refresh_token_repository::PostgresRefreshTokenRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
pub use stripe_payment_gateway::{STRIPE_API_BASE_URL, StripeGatewayConfig, StripePaymentGateway};
