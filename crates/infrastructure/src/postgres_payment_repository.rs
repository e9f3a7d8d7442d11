use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use storefront_application::PaymentRepository;
use storefront_core::{AppError, AppResult};
use storefront_domain::{
    CurrencyCode, NewAuditEntry, Order, OrderStatus, Payment, PaymentMethod, PaymentStatus,
};

use crate::postgres_audit_trail_repository::insert_audit_entry;
use crate::postgres_order_repository::fetch_order;

/// PostgreSQL-backed payment ledger.
#[derive(Clone)]
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    method: String,
    status: String,
    amount_minor: i64,
    currency: String,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let payment_id = row.id;
        let stored_value_error = |field: &str, error: AppError| {
            AppError::Internal(format!("payment '{payment_id}' has invalid {field}: {error}"))
        };

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            method: PaymentMethod::from_str(&row.method)
                .map_err(|error| stored_value_error("method", error))?,
            status: PaymentStatus::parse(&row.status)
                .map_err(|error| stored_value_error("status", error))?,
            amount_minor: row.amount_minor,
            currency: CurrencyCode::new(&row.currency)
                .map_err(|error| stored_value_error("currency", error))?,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn record_pending(
        &self,
        payment: Payment,
        audit_entry: NewAuditEntry,
    ) -> AppResult<Payment> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start payment transaction: {error}"))
        })?;

        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (
                id,
                order_id,
                method,
                status,
                amount_minor,
                currency,
                transaction_id,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, order_id, method, status, amount_minor, currency, transaction_id, created_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(payment.amount_minor)
        .bind(payment.currency.as_str())
        .bind(payment.transaction_id.as_deref())
        .bind(payment.created_at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record payment: {error}")))?;

        insert_audit_entry(&mut *transaction, &audit_entry).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit payment transaction: {error}"))
        })?;

        Payment::try_from(row)
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, order_id, method, status, amount_minor, currency, transaction_id, created_at
            FROM payments
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find payment: {error}")))?;

        row.map(Payment::try_from).transpose()
    }

    async fn complete(
        &self,
        payment_id: Uuid,
        order_id: Uuid,
        audit_entry: NewAuditEntry,
    ) -> AppResult<Order> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start payment completion: {error}"))
        })?;

        let updated = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'COMPLETED',
                updated_at = now()
            WHERE id = $1
              AND order_id = $2
              AND status = 'PENDING'
            "#,
        )
        .bind(payment_id)
        .bind(order_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to complete payment: {error}")))?;

        if updated.rows_affected() == 0 {
            // A concurrent finalization may already have settled the order.
            let order = fetch_order(&mut *transaction, order_id).await?;
            transaction.rollback().await.map_err(|error| {
                AppError::Internal(format!("failed to roll back payment completion: {error}"))
            })?;

            return match order {
                Some(order) if order.status == OrderStatus::Paid => Ok(order),
                _ => Err(AppError::Conflict(format!(
                    "payment '{payment_id}' is no longer pending"
                ))),
            };
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Paid.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to mark order paid: {error}")))?;

        insert_audit_entry(&mut *transaction, &audit_entry).await?;
        let order = fetch_order(&mut *transaction, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order '{order_id}' not found")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit payment completion: {error}"))
        })?;

        Ok(order)
    }
}

#[cfg(test)]
mod tests;
