//! # Ledger Repository
//!
//! The durable inventory ledger. Every stock change made by the storefront
//! goes through one of these methods.
//!
//! ## Read-Modify-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  decrement("p1", "M", 2)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    UPDATE products SET updated_at = updated_at WHERE id = 'p1'          │
//! │        └── takes the write lock before reading                          │
//! │    SELECT ... WHERE id = 'p1'            {"M": 5, "S": 3}               │
//! │    Product::decrement("M", 2)            {"M": 3, "S": 3}  removed 2    │
//! │    UPDATE products SET size_inventory, inventory, updated_at            │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Two checkouts drawing the same size at once serialize on the write lock,
//! so neither decrement is lost.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::fetch_product;
use swell_core::{DecrementOutcome, Product, SizeInventory};

/// Repository for stock mutations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

/// Claims the write lock for a product row. Returns false if the row is
/// missing.
async fn lock_product(conn: &mut SqliteConnection, product_id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE products SET updated_at = updated_at WHERE id = ?1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn write_stock(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    let sizes = serde_json::to_string(&product.size_inventory)?;

    sqlx::query(
        r#"
        UPDATE products
        SET size_inventory = ?2, inventory = ?3, updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(&product.id)
    .bind(sizes)
    .bind(product.inventory as i64)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Replaces a product's whole size map and recomputes its aggregate.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such product
    pub async fn set_size_inventory(
        &self,
        product_id: &str,
        sizes: SizeInventory,
    ) -> DbResult<Product> {
        debug!(product_id = %product_id, sizes = sizes.len(), "Setting size inventory");

        let mut tx = self.pool.begin().await?;

        if !lock_product(&mut tx, product_id).await? {
            return Err(DbError::not_found("Product", product_id));
        }
        let mut product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        product.set_size_inventory(sizes, Utc::now());
        write_stock(&mut tx, &product).await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Sets the aggregate on a size-less product.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain)` - the product has sizes
    pub async fn set_unsized_inventory(&self, product_id: &str, quantity: u32) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        if !lock_product(&mut tx, product_id).await? {
            return Err(DbError::not_found("Product", product_id));
        }
        let mut product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        product.set_unsized_inventory(quantity, Utc::now())?;
        write_stock(&mut tx, &product).await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Floor-at-zero decrement of one size.
    ///
    /// Unknown products are a no-op that removes nothing. A shortfall is
    /// reported in the outcome and logged, never raised.
    pub async fn decrement(
        &self,
        product_id: &str,
        size: &str,
        quantity: u32,
    ) -> DbResult<DecrementOutcome> {
        let mut tx = self.pool.begin().await?;

        if !lock_product(&mut tx, product_id).await? {
            warn!(product_id = %product_id, "Decrement for unknown product ignored");
            return Ok(DecrementOutcome::untouched(quantity));
        }
        let Some(mut product) = fetch_product(&mut tx, product_id).await? else {
            return Ok(DecrementOutcome::untouched(quantity));
        };

        let outcome = product.decrement(size, quantity, Utc::now());
        write_stock(&mut tx, &product).await?;
        tx.commit().await?;

        if outcome.is_short() {
            warn!(
                product_id = %product_id,
                size = %size,
                requested = outcome.requested,
                removed = outcome.removed,
                "Short decrement"
            );
        } else {
            debug!(product_id = %product_id, size = %size, removed = outcome.removed, "Decremented");
        }

        Ok(outcome)
    }

    /// The eagerly maintained aggregate, or `None` for unknown products.
    pub async fn total_inventory(&self, product_id: &str) -> DbResult<Option<u32>> {
        let total: Option<i64> = sqlx::query_scalar("SELECT inventory FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(total.map(|t| u32::try_from(t).unwrap_or(0)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use swell_core::{Money, ProductType};

    async fn seeded(sizes: SizeInventory) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut p = Product::new("Reef Triangle Top", ProductType::Top, Money::from_cents(6400), Utc::now());
        p.set_size_inventory(sizes, Utc::now());
        db.products().insert(&p).await.unwrap();
        (db, p.id)
    }

    #[tokio::test]
    async fn test_decrement_updates_size_and_aggregate() {
        let (db, id) = seeded(SizeInventory::from_pairs([("S", 5), ("M", 5)])).await;

        let outcome = db.ledger().decrement(&id, "S", 2).await.unwrap();

        assert_eq!(outcome.removed, 2);
        let p = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(p.size_inventory.get("S"), Some(3));
        assert_eq!(p.inventory, 8);
        assert_eq!(db.ledger().total_inventory(&id).await.unwrap(), Some(8));
    }

    #[tokio::test]
    async fn test_decrement_floors_and_reports_shortfall() {
        let (db, id) = seeded(SizeInventory::from_pairs([("M", 1)])).await;

        let outcome = db.ledger().decrement(&id, "M", 4).await.unwrap();

        assert!(outcome.is_short());
        assert_eq!(outcome.removed, 1);
        assert_eq!(db.ledger().total_inventory(&id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_decrement_unknown_size_adds_zero_entry() {
        let (db, id) = seeded(SizeInventory::from_pairs([("S", 2)])).await;

        db.ledger().decrement(&id, "XL", 1).await.unwrap();

        let p = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(p.size_inventory.get("XL"), Some(0));
        assert_eq!(p.inventory, 2);
    }

    #[tokio::test]
    async fn test_unknown_product_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let outcome = db.ledger().decrement("nope", "S", 3).await.unwrap();

        assert_eq!(outcome, DecrementOutcome::untouched(3));
        assert_eq!(db.ledger().total_inventory("nope").await.unwrap(), None);
        assert!(db
            .ledger()
            .set_size_inventory("nope", SizeInventory::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_size_inventory_refreshes_timestamp() {
        let (db, id) = seeded(SizeInventory::from_pairs([("S", 1)])).await;
        let before = db.products().get_by_id(&id).await.unwrap().unwrap().updated_at;

        let p = db
            .ledger()
            .set_size_inventory(&id, SizeInventory::from_pairs([("S", 4), ("L", 2)]))
            .await
            .unwrap();

        assert_eq!(p.inventory, 6);
        assert!(p.updated_at >= before);
    }

    #[tokio::test]
    async fn test_unsized_inventory_refused_for_sized_product() {
        let (db, id) = seeded(SizeInventory::from_pairs([("S", 1)])).await;

        let err = db.ledger().set_unsized_inventory(&id, 7).await.unwrap_err();

        assert!(matches!(err, DbError::Domain(_)));
    }
}
