//! # Order Fulfillment
//!
//! Shared by both front doors: web checkout after payment capture and the
//! POS sale confirmation.
//!
//! ## Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fulfill(draft, lines)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  0. draft.into_order()  (totals checked, nothing drawn yet)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. for each line: ledger.decrement(product, size, qty)                │
//! │       │    (one transaction per line, committed immediately)           │
//! │       ▼                                                                 │
//! │  2. orders.insert(order)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FulfillmentResult { order, lines[DecrementOutcome], short }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! Stock is drawn before the order exists. If step 2 fails the decrements
//! stay applied: payment has already been captured, and under-counting stock
//! is safer than overselling it. Shortfalls never fail the order; they are
//! flagged so staff can follow up.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::DbResult;
use crate::repository::ledger::LedgerRepository;
use crate::repository::order::OrderRepository;
use swell_core::{CoreError, DecrementOutcome, LineItem, Order, OrderDraft};

/// One line and what the ledger did with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineOutcome {
    pub line: LineItem,
    pub outcome: DecrementOutcome,
}

/// The placed order plus per-line stock accounting.
#[derive(Debug, Clone, Serialize)]
pub struct FulfillmentResult {
    pub order: Order,
    pub lines: Vec<LineOutcome>,
    /// True when any line removed less than it asked for.
    pub short: bool,
}

/// Decrement-then-persist order placement.
#[derive(Debug, Clone)]
pub struct OrderFulfillment {
    ledger: LedgerRepository,
    orders: OrderRepository,
}

impl OrderFulfillment {
    /// Creates the service over the ledger and order repositories.
    pub fn new(ledger: LedgerRepository, orders: OrderRepository) -> Self {
        OrderFulfillment { ledger, orders }
    }

    /// Draws stock for every line, then writes the order.
    ///
    /// Totals are computed before any stock moves, so a draft whose totals
    /// overflow fails with nothing drawn.
    pub async fn fulfill(&self, draft: OrderDraft, lines: Vec<LineItem>) -> DbResult<FulfillmentResult> {
        let order = draft
            .into_order(Utc::now())
            .map_err(CoreError::Validation)?;
        let mut outcomes = Vec::with_capacity(lines.len());

        for line in lines {
            let outcome = self
                .ledger
                .decrement(&line.product_id, &line.size, line.quantity)
                .await?;
            outcomes.push(LineOutcome { line, outcome });
        }

        let short = outcomes.iter().any(|l| l.outcome.is_short());

        if let Err(e) = self.orders.insert(&order).await {
            error!(
                order_id = %order.id,
                error = %e,
                "Order write failed after stock was drawn"
            );
            return Err(e);
        }

        if short {
            warn!(order_id = %order.id, channel = ?order.channel, "Order fulfilled short");
        }
        info!(
            order_id = %order.id,
            channel = ?order.channel,
            total_cents = order.total_cents,
            "Order placed"
        );
        info!(order_id = %order.id, email = %order.customer_email, "Order confirmation queued");

        Ok(FulfillmentResult {
            order,
            lines: outcomes,
            short,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use swell_core::{Money, OrderChannel, OrderItem, Product, ProductType, SizeInventory};

    async fn seeded() -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut p = Product::new("Reef Triangle Top", ProductType::Top, Money::from_cents(6400), Utc::now());
        p.set_size_inventory(SizeInventory::from_pairs([("S", 5), ("M", 5)]), Utc::now());
        db.products().insert(&p).await.unwrap();
        (db, p)
    }

    fn draft(product: &Product, size: &str, quantity: u32, channel: OrderChannel) -> OrderDraft {
        OrderDraft {
            customer_name: "Ana Reyes".to_string(),
            customer_email: "ana@example.com".to_string(),
            shipping_cost_cents: 0,
            channel,
            payment_reference: None,
            items: vec![OrderItem {
                product_id: product.id.clone(),
                title: product.title.clone(),
                quantity,
                price_cents: product.price_cents,
                size: size.to_string(),
                image: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_fulfill_decrements_then_writes_order() {
        let (db, p) = seeded().await;
        let d = draft(&p, "S", 2, OrderChannel::Web);
        let lines = d.line_items();

        let result = db.fulfillment().fulfill(d, lines).await.unwrap();

        assert!(!result.short);
        assert_eq!(result.lines[0].outcome.removed, 2);
        assert_eq!(db.ledger().total_inventory(&p.id).await.unwrap(), Some(8));
        assert!(db.orders().get_by_id(&result.order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_short_fulfillment_is_flagged_not_failed() {
        let (db, p) = seeded().await;
        let d = draft(&p, "M", 7, OrderChannel::Pos);
        let lines = d.line_items();

        let result = db.fulfillment().fulfill(d, lines).await.unwrap();

        assert!(result.short);
        assert_eq!(result.lines[0].outcome.shortfall(), 2);
        let stored = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.size_inventory.get("M"), Some(0));
    }

    #[tokio::test]
    async fn test_order_write_failure_leaves_ledger_decremented() {
        let (db, p) = seeded().await;
        sqlx::query("DROP TABLE orders")
            .execute(db.pool())
            .await
            .unwrap();
        let d = draft(&p, "S", 2, OrderChannel::Web);
        let lines = d.line_items();

        let result = db.fulfillment().fulfill(d, lines).await;

        assert!(result.is_err());
        let stored = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.size_inventory.get("S"), Some(3));
        assert_eq!(stored.inventory, 8);
    }
    #[tokio::test]
    async fn test_overflowing_total_draws_no_stock() {
        let (db, p) = seeded().await;
        let mut d = draft(&p, "S", 2, OrderChannel::Web);
        d.items[0].price_cents = i64::MAX;
        let lines = d.line_items();

        let result = db.fulfillment().fulfill(d, lines).await;

        assert!(matches!(
            result,
            Err(crate::DbError::Domain(CoreError::Validation(_)))
        ));
        let stored = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.inventory, 10);
        assert!(db.orders().list(10).await.unwrap().is_empty());
    }
}
