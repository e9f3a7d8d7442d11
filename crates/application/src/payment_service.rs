use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use storefront_core::{AppError, AppResult, UserIdentity};
use storefront_domain::{
    AuditAction, CurrencyCode, Money, NewAuditEntry, Order, OrderStatus, Payment, PaymentMethod,
};
use tracing::info;

use crate::{CheckoutSessionRequest, OrderRepository, PaymentGateway, PaymentRepository};

/// Placeholder the gateway replaces with the session id on redirect.
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Where the hosted checkout page sends the buyer back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirectUrls {
    /// Landing page after a successful payment.
    pub success_url: String,
    /// Landing page after cancellation.
    pub cancel_url: String,
}

/// Payment request as submitted by a buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatePaymentInput {
    /// Order to pay.
    pub order_id: Uuid,
    /// Requested channel.
    pub method: PaymentMethod,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Currency code as submitted.
    pub currency: String,
}

/// Result of starting a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInitiation {
    /// Persisted pending payment.
    pub payment: Payment,
    /// Hosted checkout URL for redirect-based methods.
    pub redirect_url: Option<String>,
}

/// Application service for starting and confirming order payments.
#[derive(Clone)]
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    redirect_urls: CheckoutRedirectUrls,
}

impl PaymentService {
    /// Creates a new payment service.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        redirect_urls: CheckoutRedirectUrls,
    ) -> Self {
        Self {
            gateway,
            orders,
            payments,
            redirect_urls,
        }
    }

    /// Starts paying an order owned by the actor.
    pub async fn initiate_payment(
        &self,
        actor: &UserIdentity,
        input: InitiatePaymentInput,
    ) -> AppResult<PaymentInitiation> {
        let order = self.load_owned_order(actor, input.order_id).await?;
        if order.status != OrderStatus::PendingPayment {
            return Err(AppError::Conflict(format!(
                "order '{}' is not awaiting payment",
                order.id
            )));
        }

        let money = Money::new(input.amount_minor, CurrencyCode::new(&input.currency)?)?;
        order.ensure_payable_with(&money)?;

        let (transaction_id, redirect_url) = match input.method {
            PaymentMethod::Stripe => {
                let session = self
                    .gateway
                    .create_checkout_session(&CheckoutSessionRequest {
                        order_id: order.id,
                        amount_minor: money.amount_minor(),
                        currency: money.currency().clone(),
                        customer_email: order.buyer_email.clone(),
                        description: format!("Order {}", order.id),
                        success_url: with_session_placeholder(&self.redirect_urls.success_url),
                        cancel_url: with_session_placeholder(&self.redirect_urls.cancel_url),
                    })
                    .await?;
                (session.id, session.url)
            }
            PaymentMethod::BankTransfer => (Uuid::new_v4().to_string(), None),
        };

        let audit_entry = NewAuditEntry::new(
            order.buyer_email.as_str(),
            AuditAction::PaymentInitiated.as_str(),
            format!(
                "Payment initiated for order ID: {} with method: {}",
                order.id, input.method
            ),
        )?
        .with_performed_by(Some(actor.email().to_owned()));

        let payment = self
            .payments
            .record_pending(
                Payment::pending(order.id, input.method, &money, transaction_id, Utc::now()),
                audit_entry,
            )
            .await?;

        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            method = %input.method,
            "payment initiated"
        );

        Ok(PaymentInitiation {
            payment,
            redirect_url,
        })
    }

    /// Confirms a hosted checkout session and marks the order paid.
    pub async fn finalize_hosted_session(
        &self,
        actor: &UserIdentity,
        session_id: &str,
    ) -> AppResult<Order> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::Validation("session id must not be empty".to_owned()));
        }

        let session = self.gateway.retrieve_checkout_session(session_id).await?;
        if !session.is_paid() {
            return Err(AppError::Validation("payment not completed".to_owned()));
        }

        let payment = self.payments.find_by_transaction_id(session_id).await?;
        let order_id = session
            .order_id
            .or_else(|| payment.as_ref().map(|payment| payment.order_id))
            .ok_or_else(|| {
                AppError::NotFound(format!("no order linked to checkout session '{session_id}'"))
            })?;

        let order = self.load_owned_order(actor, order_id).await?;
        if order.status == OrderStatus::Paid {
            return Ok(order);
        }

        let payment = payment
            .filter(|payment| payment.order_id == order.id)
            .ok_or_else(|| {
                AppError::NotFound(format!("payment for checkout session '{session_id}' not found"))
            })?;

        let audit_entry = NewAuditEntry::new(
            order.buyer_email.as_str(),
            AuditAction::PaymentFinalized.as_str(),
            format!(
                "Payment finalized for order ID: {} with transaction ID: {session_id}",
                order.id
            ),
        )?
        .with_performed_by(Some(actor.email().to_owned()));

        let order = self.payments.complete(payment.id, order.id, audit_entry).await?;
        info!(order_id = %order.id, payment_id = %payment.id, "payment finalized");
        Ok(order)
    }

    async fn load_owned_order(&self, actor: &UserIdentity, order_id: Uuid) -> AppResult<Order> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order '{order_id}' not found")))?;

        if order.buyer_account_id != actor.account_id() {
            return Err(AppError::Forbidden(format!(
                "order '{order_id}' belongs to another account"
            )));
        }

        Ok(order)
    }
}

fn with_session_placeholder(base_url: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}session_id={CHECKOUT_SESSION_PLACEHOLDER}")
}

#[cfg(test)]
mod tests;
