use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use storefront_application::{
    AccountRepository, AuditTrailService, AuthorizationService, CheckoutRedirectUrls,
    FollowUpService, PaymentService, RoleService,
};
use storefront_core::AppError;
use storefront_infrastructure::{
    PostgresAccountRepository, PostgresAuditTrailRepository, PostgresFollowUpQueueRepository,
    PostgresOrderRepository, PostgresPaymentRepository, PostgresRefreshTokenRepository,
    StripeGatewayConfig, StripePaymentGateway,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::email::build_email_service;

const GATEWAY_TIMEOUT_SECONDS: u64 = 15;

/// Wires every service with its adapters.
pub fn build_app_state(config: &ApiConfig, pool: PgPool) -> Result<AppState, AppError> {
    let account_repository: Arc<dyn AccountRepository> =
        Arc::new(PostgresAccountRepository::new(pool.clone()));
    let authorization_service = AuthorizationService::new(account_repository.clone());

    let follow_up_service = FollowUpService::new(
        Arc::new(PostgresFollowUpQueueRepository::new(pool.clone())),
        build_email_service(&config.email_provider)?,
        Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
    );
    let role_service = RoleService::new(
        account_repository.clone(),
        authorization_service.clone(),
        follow_up_service,
    );

    let audit_trail_service = AuditTrailService::new(
        Arc::new(PostgresAuditTrailRepository::new(pool.clone())),
        authorization_service.clone(),
    );

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(GATEWAY_TIMEOUT_SECONDS))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let gateway = StripePaymentGateway::new(
        http_client,
        StripeGatewayConfig {
            secret_key: config.stripe.secret_key.clone(),
            api_base_url: config.stripe.api_base_url.clone(),
        },
    )?;
    let payment_service = PaymentService::new(
        Arc::new(gateway),
        Arc::new(PostgresOrderRepository::new(pool.clone())),
        Arc::new(PostgresPaymentRepository::new(pool)),
        CheckoutRedirectUrls {
            success_url: config.stripe.success_url.clone(),
            cancel_url: config.stripe.cancel_url.clone(),
        },
    );

    Ok(AppState {
        audit_trail_service,
        authorization_service,
        role_service,
        payment_service,
        account_repository,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    })
}
