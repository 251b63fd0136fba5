//! # Order Repository
//!
//! Orders are written once by fulfillment and afterwards only change status
//! or tracking number. They are never deleted.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use swell_core::{CoreError, Order, OrderChannel, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = "id, customer_name, customer_email, date, total_cents, \
     shipping_cost_cents, item_cost_cents, status, channel, tracking_number, \
     payment_reference, items, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer_name: String,
    customer_email: String,
    date: DateTime<Utc>,
    total_cents: i64,
    shipping_cost_cents: i64,
    item_cost_cents: i64,
    status: OrderStatus,
    channel: OrderChannel,
    tracking_number: Option<String>,
    payment_reference: Option<String>,
    items: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let items: Vec<OrderItem> = serde_json::from_str(&row.items)?;
        Ok(Order {
            id: row.id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            date: row.date,
            total_cents: row.total_cents,
            shipping_cost_cents: row.shipping_cost_cents,
            item_cost_cents: row.item_cost_cents,
            status: row.status,
            channel: row.channel,
            tracking_number: row.tracking_number,
            payment_reference: row.payment_reference,
            items,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a new order.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(order_id = %order.id, channel = ?order.channel, "Inserting order");

        let items = serde_json::to_string(&order.items)?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_name, customer_email, date, total_cents,
                shipping_cost_cents, item_cost_cents, status, channel,
                tracking_number, payment_reference, items, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(order.date)
        .bind(order.total_cents)
        .bind(order.shipping_cost_cents)
        .bind(order.item_cost_cents)
        .bind(order.status)
        .bind(order.channel)
        .bind(&order.tracking_number)
        .bind(&order.payment_reference)
        .bind(items)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Lists orders, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY date DESC, id LIMIT ?1");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Moves an order to a new status.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such order
    /// * `Err(DbError::Domain(InvalidStatusTransition))` - terminal or backwards move
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let current: Option<OrderStatus> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or_else(|| DbError::not_found("Order", id))?;

        if !current.can_transition_to(status) {
            return Err(CoreError::InvalidStatusTransition {
                order_id: id.to_string(),
                from: current,
                to: status,
            }
            .into());
        }

        sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(order_id = %id, from = ?current, to = ?status, "Order status updated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Sets or clears the tracking number.
    pub async fn set_tracking(&self, id: &str, tracking_number: Option<&str>) -> DbResult<Order> {
        let result =
            sqlx::query("UPDATE orders SET tracking_number = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(tracking_number)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use swell_core::OrderDraft;

    fn draft(channel: OrderChannel) -> OrderDraft {
        OrderDraft {
            customer_name: "Ana Reyes".to_string(),
            customer_email: "ana@example.com".to_string(),
            shipping_cost_cents: 600,
            channel,
            payment_reference: None,
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                title: "Reef Triangle Top".to_string(),
                quantity: 1,
                price_cents: 6400,
                size: "M".to_string(),
                image: Some("https://img.example.com/reef.jpg".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trips_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = draft(OrderChannel::Web).into_order(Utc::now()).unwrap();

        db.orders().insert(&order).await.unwrap();
        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();

        assert_eq!(loaded.items, order.items);
        assert_eq!(loaded.total_cents, 7000);
        assert_eq!(db.orders().list(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_moves_forward_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = draft(OrderChannel::Web).into_order(Utc::now()).unwrap();
        db.orders().insert(&order).await.unwrap();

        let shipped = db
            .orders()
            .update_status(&order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        let err = db
            .orders()
            .update_status(&order.id, OrderStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_is_terminal() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = draft(OrderChannel::Web).into_order(Utc::now()).unwrap();
        db.orders().insert(&order).await.unwrap();

        db.orders()
            .update_status(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        assert!(db
            .orders()
            .update_status(&order.id, OrderStatus::Processing)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_tracking() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = draft(OrderChannel::Web).into_order(Utc::now()).unwrap();
        db.orders().insert(&order).await.unwrap();

        let updated = db
            .orders()
            .set_tracking(&order.id, Some("1Z999AA10123456784"))
            .await
            .unwrap();

        assert_eq!(updated.tracking_number.as_deref(), Some("1Z999AA10123456784"));
        assert!(db.orders().set_tracking("missing", None).await.is_err());
    }
}
