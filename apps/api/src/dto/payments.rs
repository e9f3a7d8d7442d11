use serde::{Deserialize, Serialize};
use storefront_application::PaymentInitiation;
use storefront_domain::Order;
use ts_rs::TS;

/// Incoming payload for starting a payment.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/initiate-payment-request.ts"
)]
pub struct InitiatePaymentRequest {
    pub order_id: String,
    /// `STRIPE` or `BANK_TRANSFER`.
    pub method: String,
    /// Amount in minor currency units.
    #[ts(type = "number")]
    pub amount: i64,
    pub currency: String,
}

/// API representation of a payment attempt.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/payment-response.ts"
)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub method: String,
    pub status: String,
    #[ts(type = "number")]
    pub amount: i64,
    pub currency: String,
    pub transaction_id: Option<String>,
    /// Hosted checkout page for redirect-based methods.
    pub payment_url: Option<String>,
    pub payment_date: String,
}

impl From<PaymentInitiation> for PaymentResponse {
    fn from(initiation: PaymentInitiation) -> Self {
        let payment = initiation.payment;
        Self {
            id: payment.id.to_string(),
            order_id: payment.order_id.to_string(),
            method: payment.method.as_str().to_owned(),
            status: payment.status.as_str().to_owned(),
            amount: payment.amount_minor,
            currency: payment.currency.as_str().to_owned(),
            transaction_id: payment.transaction_id,
            payment_url: initiation.redirect_url,
            payment_date: payment.created_at.to_rfc3339(),
        }
    }
}

/// Incoming payload for confirming a hosted checkout session.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/finalize-stripe-session-request.ts"
)]
pub struct FinalizeStripeSessionRequest {
    pub session_id: String,
}

/// API representation of an order after payment.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/order-response.ts"
)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    #[ts(type = "number")]
    pub total_amount: i64,
    pub currency: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.status.as_str().to_owned(),
            total_amount: order.total_minor,
            currency: order.currency.as_str().to_owned(),
        }
    }
}
