use chrono::Utc;
use sqlx::PgPool;
use storefront_application::{OrderRepository, PaymentRepository};
use storefront_domain::{
    CurrencyCode, Money, NewAuditEntry, OrderStatus, Payment, PaymentMethod, PaymentStatus,
};
use uuid::Uuid;

use crate::postgres_order_repository::PostgresOrderRepository;
use crate::test_support::{insert_account, test_pool, unique_email};

use super::PostgresPaymentRepository;

async fn insert_order(pool: &PgPool, buyer_account_id: Uuid) -> Uuid {
    let order_id = Uuid::new_v4();
    let insert = sqlx::query(
        r#"
            INSERT INTO orders (id, buyer_account_id, total_minor, currency)
            VALUES ($1, $2, 2500, 'EUR')
            "#,
    )
    .bind(order_id)
    .bind(buyer_account_id)
    .execute(pool)
    .await;
    assert!(insert.is_ok());
    order_id
}

fn eur_2500() -> Money {
    Money::new(
        2_500,
        CurrencyCode::new("EUR").unwrap_or_else(|_| panic!("test")),
    )
    .unwrap_or_else(|_| panic!("test"))
}

fn audit(email: &str, action: &str) -> NewAuditEntry {
    NewAuditEntry::new(email, action, "payment audit").unwrap_or_else(|_| panic!("test"))
}

#[tokio::test]
async fn order_lookup_carries_buyer_email() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let email = unique_email("orders");
    let buyer = insert_account(&pool, &email).await;
    let order_id = insert_order(&pool, buyer).await;

    let order = PostgresOrderRepository::new(pool)
        .find_by_id(order_id)
        .await
        .unwrap_or_else(|_| panic!("test"))
        .unwrap_or_else(|| panic!("test"));

    assert_eq!(order.buyer_email, email);
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(order.currency.as_str(), "EUR");
}

#[tokio::test]
async fn completing_a_payment_marks_the_order_paid() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresPaymentRepository::new(pool.clone());
    let email = unique_email("payer");
    let buyer = insert_account(&pool, &email).await;
    let order_id = insert_order(&pool, buyer).await;
    let session_id = format!("cs_test_{}", Uuid::new_v4().simple());

    let pending = repository
        .record_pending(
            Payment::pending(
                order_id,
                PaymentMethod::Stripe,
                &eur_2500(),
                session_id.clone(),
                Utc::now(),
            ),
            audit(&email, "PAYMENT_INITIATED"),
        )
        .await
        .unwrap_or_else(|_| panic!("test"));

    let found = repository
        .find_by_transaction_id(&session_id)
        .await
        .unwrap_or_else(|_| panic!("test"))
        .unwrap_or_else(|| panic!("test"));
    assert_eq!(found.id, pending.id);
    assert_eq!(found.status, PaymentStatus::Pending);

    let order = repository
        .complete(pending.id, order_id, audit(&email, "PAYMENT_FINALIZED"))
        .await
        .unwrap_or_else(|_| panic!("test"));
    assert_eq!(order.status, OrderStatus::Paid);

    let replay = repository
        .complete(pending.id, order_id, audit(&email, "PAYMENT_FINALIZED"))
        .await
        .unwrap_or_else(|_| panic!("test"));
    assert_eq!(replay.status, OrderStatus::Paid);

    let finalized_entries = sqlx::query_scalar::<_, i64>(
        r#"
            SELECT COUNT(*)
            FROM audit_log_entries
            WHERE subject_email = $1 AND action = 'PAYMENT_FINALIZED'
            "#,
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .unwrap_or_else(|_| panic!("test"));
    assert_eq!(finalized_entries, 1);
}

#[tokio::test]
async fn unknown_transaction_reference_is_absent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let found = PostgresPaymentRepository::new(pool)
        .find_by_transaction_id("cs_test_missing")
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert!(found.is_none());
}
