use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use storefront_application::OrderRepository;
use storefront_core::{AppError, AppResult};
use storefront_domain::{CurrencyCode, Order, OrderStatus};

/// PostgreSQL-backed order lookups for the payment flow.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    buyer_account_id: Uuid,
    buyer_email: String,
    total_minor: i64,
    currency: String,
    status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::new(&row.currency).map_err(|error| {
            AppError::Internal(format!("order '{}' has invalid currency: {error}", row.id))
        })?;
        let status = OrderStatus::parse(&row.status).map_err(|error| {
            AppError::Internal(format!("order '{}' has invalid status: {error}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            buyer_account_id: row.buyer_account_id,
            buyer_email: row.buyer_email,
            total_minor: row.total_minor,
            currency,
            status,
        })
    }
}

/// Loads an order with its buyer email on an open connection or transaction.
pub(crate) async fn fetch_order(
    connection: &mut PgConnection,
    order_id: Uuid,
) -> AppResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT
            orders.id,
            orders.buyer_account_id,
            accounts.email AS buyer_email,
            orders.total_minor,
            orders.currency,
            orders.status
        FROM orders
        INNER JOIN accounts ON accounts.id = orders.buyer_account_id
        WHERE orders.id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to find order: {error}")))?;

    row.map(Order::try_from).transpose()
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, order_id: Uuid) -> AppResult<Option<Order>> {
        let mut connection = self.pool.acquire().await.map_err(|error| {
            AppError::Internal(format!("failed to acquire order connection: {error}"))
        })?;

        fetch_order(&mut *connection, order_id).await
    }
}
