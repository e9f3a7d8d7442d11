use async_trait::async_trait;
use uuid::Uuid;

use storefront_core::AppResult;
use storefront_domain::{CurrencyCode, NewAuditEntry, Order, Payment};

/// Parameters for opening a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    /// Order being paid, echoed back as session metadata.
    pub order_id: Uuid,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Currency of the amount.
    pub currency: CurrencyCode,
    /// Buyer email prefilled on the hosted page.
    pub customer_email: String,
    /// Line item label.
    pub description: String,
    /// Redirect target after payment.
    pub success_url: String,
    /// Redirect target after cancellation.
    pub cancel_url: String,
}

/// Hosted checkout session as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Opaque session reference.
    pub id: String,
    /// Hosted page URL, present while the session is open.
    pub url: Option<String>,
    /// Gateway payment status, `paid` once funds are captured.
    pub payment_status: String,
    /// Order id recovered from session metadata.
    pub order_id: Option<Uuid>,
}

impl CheckoutSession {
    /// Returns whether the gateway reports the session as paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.eq_ignore_ascii_case("paid")
    }
}

/// Port for the hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession>;

    /// Fetches the current state of a checkout session.
    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession>;
}

/// Repository port for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Finds an order by identifier.
    async fn find_by_id(&self, order_id: Uuid) -> AppResult<Option<Order>>;
}

/// Repository port for payment attempts.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a pending payment together with its audit entry.
    async fn record_pending(
        &self,
        payment: Payment,
        audit_entry: NewAuditEntry,
    ) -> AppResult<Payment>;

    /// Finds a payment by gateway session or bank transfer reference.
    async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Payment>>;

    /// Marks the payment completed and the order paid in one transaction,
    /// writing the audit entry alongside. Returns the updated order.
    async fn complete(
        &self,
        payment_id: Uuid,
        order_id: Uuid,
        audit_entry: NewAuditEntry,
    ) -> AppResult<Order>;
}
