//! Orders, payments and the money values they carry.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{AppError, AppResult};
use uuid::Uuid;

/// Payment channels accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Hosted checkout session on Stripe.
    Stripe,
    /// Offline bank transfer reconciled later.
    BankTransfer,
}

impl PaymentMethod {
    /// Returns the stable storage value for this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "STRIPE",
            Self::BankTransfer => "BANK_TRANSFER",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STRIPE" => Ok(Self::Stripe),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            _ => Err(AppError::Validation(format!(
                "unsupported payment method: {value}"
            ))),
        }
    }
}

/// Lifecycle of a single payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting confirmation.
    Pending,
    /// Funds confirmed.
    Completed,
    /// Rejected or abandoned.
    Failed,
}

impl PaymentStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a stored status value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown payment status '{value}'"
            ))),
        }
    }
}

/// Lifecycle of an order with respect to payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, not yet paid.
    PendingPayment,
    /// Paid in full.
    Paid,
    /// Payment was attempted and failed.
    PaymentFailed,
}

impl OrderStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::PaymentFailed => "PAYMENT_FAILED",
        }
    }

    /// Parses a stored status value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "PAID" => Ok(Self::Paid),
            "PAYMENT_FAILED" => Ok(Self::PaymentFailed),
            _ => Err(AppError::Validation(format!(
                "unknown order status '{value}'"
            ))),
        }
    }
}

/// ISO 4217 style currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validates a three-letter currency code.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let normalized = value.as_ref().trim().to_ascii_uppercase();
        if normalized.len() != 3 || !normalized.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(AppError::Validation(format!(
                "invalid currency code: {}",
                value.as_ref()
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the upper-case code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Amount in the currency's minor unit (cents for EUR/USD).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount_minor: i64,
    currency: CurrencyCode,
}

impl Money {
    /// Creates a strictly positive amount.
    pub fn new(amount_minor: i64, currency: CurrencyCode) -> AppResult<Self> {
        if amount_minor <= 0 {
            return Err(AppError::Validation(
                "payment amount must be positive".to_owned(),
            ));
        }

        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the currency.
    #[must_use]
    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }
}

/// Order as seen by the payment flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: Uuid,
    /// Account that placed the order.
    pub buyer_account_id: Uuid,
    /// Contact email of the buyer.
    pub buyer_email: String,
    /// Order total in minor units.
    pub total_minor: i64,
    /// Order currency.
    pub currency: CurrencyCode,
    /// Payment lifecycle status.
    pub status: OrderStatus,
}

impl Order {
    /// Checks that a requested payment covers exactly this order.
    pub fn ensure_payable_with(&self, money: &Money) -> AppResult<()> {
        if self.status != OrderStatus::PendingPayment {
            return Err(AppError::Conflict(format!(
                "order '{}' is not awaiting payment",
                self.id
            )));
        }

        if money.currency() != &self.currency {
            return Err(AppError::Validation(format!(
                "currency {} does not match order currency {}",
                money.currency(),
                self.currency
            )));
        }

        if money.amount_minor() != self.total_minor {
            return Err(AppError::Validation(
                "payment amount does not match order total".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Persisted payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier.
    pub id: Uuid,
    /// Paid order.
    pub order_id: Uuid,
    /// Channel used.
    pub method: PaymentMethod,
    /// Lifecycle status.
    pub status: PaymentStatus,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Currency.
    pub currency: CurrencyCode,
    /// Checkout session id or generated bank transfer reference.
    pub transaction_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a new pending payment for an order.
    #[must_use]
    pub fn pending(
        order_id: Uuid,
        method: PaymentMethod,
        money: &Money,
        transaction_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            method,
            status: PaymentStatus::Pending,
            amount_minor: money.amount_minor(),
            currency: money.currency().clone(),
            transaction_id: Some(transaction_id),
            created_at,
        }
    }
}
