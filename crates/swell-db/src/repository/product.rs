//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD on descriptive fields
//! - Soft delete
//! - Batched upsert used by the Square pull
//!
//! ## Pull Upsert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert_batch([p1, p2, p3])                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    INSERT p1 ... ON CONFLICT(id) DO UPDATE   ✓ written                 │
//! │    INSERT p2 ... ON CONFLICT(id) DO UPDATE   ✗ UNIQUE item_number      │
//! │    INSERT p3 ... ON CONFLICT(id) DO UPDATE   ✓ written                 │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BatchWriteOutcome { written: 2, failed: [("p2", "...")] }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A failed statement does not abort a SQLite transaction, so one bad row
//! costs only itself.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use swell_core::{Product, ProductType, SizeInventory};

// =============================================================================
// Row Mapping
// =============================================================================

pub(crate) const PRODUCT_COLUMNS: &str = "id, title, description, product_type, price_cents, \
     image_url, size_inventory, inventory, is_deleted, item_number, created_at, updated_at";

/// Raw `products` row. `size_inventory` is JSON text.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    title: String,
    description: String,
    product_type: ProductType,
    price_cents: i64,
    image_url: Option<String>,
    size_inventory: String,
    inventory: i64,
    is_deleted: bool,
    item_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let size_inventory: SizeInventory = serde_json::from_str(&row.size_inventory)?;
        let inventory = u32::try_from(row.inventory)
            .map_err(|_| DbError::CorruptRow(format!("inventory out of range for {}", row.id)))?;

        Ok(Product {
            id: row.id,
            title: row.title,
            description: row.description,
            product_type: row.product_type,
            price_cents: row.price_cents,
            image_url: row.image_url,
            size_inventory,
            inventory,
            is_deleted: row.is_deleted,
            item_number: row.item_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Loads one product on an existing connection or transaction.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Product::try_from).transpose()
}

fn rows_to_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Inserts or fully replaces a product row on the given connection.
async fn upsert_on(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    let sizes = serde_json::to_string(&product.size_inventory)?;

    sqlx::query(
        r#"
        INSERT INTO products (
            id, title, description, product_type, price_cents,
            image_url, size_inventory, inventory, is_deleted, item_number,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            product_type = excluded.product_type,
            price_cents = excluded.price_cents,
            image_url = excluded.image_url,
            size_inventory = excluded.size_inventory,
            inventory = excluded.inventory,
            is_deleted = excluded.is_deleted,
            item_number = excluded.item_number,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&product.id)
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.product_type)
    .bind(product.price_cents)
    .bind(&product.image_url)
    .bind(sizes)
    .bind(product.inventory as i64)
    .bind(product.is_deleted)
    .bind(&product.item_number)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Batch Outcome
// =============================================================================

/// Per-row accounting for a batched write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchWriteOutcome {
    /// Rows written successfully.
    pub written: usize,
    /// `(product_id, error message)` for each row that failed.
    pub failed: Vec<(String, String)>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let live = repo.list_active().await?;
/// let by_sku = repo.get_by_item_number("SW-TOP-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID, deleted or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product by its item number (SKU).
    pub async fn get_by_item_number(&self, item_number: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE item_number = ?1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(item_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists products that are not soft deleted, by title.
    ///
    /// This is what the storefront catalog and the push pass read.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_deleted = 0 ORDER BY title, id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded active products");
        rows_to_products(rows)
    }

    /// Lists every product including soft-deleted ones.
    ///
    /// The pull pass needs deleted rows so it can skip their Square twins
    /// instead of resurrecting them.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY title, id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows_to_products(rows)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id or item_number already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, title = %product.title, "Inserting product");

        let sizes = serde_json::to_string(&product.size_inventory)?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, description, product_type, price_cents,
                image_url, size_inventory, inventory, is_deleted, item_number,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.product_type)
        .bind(product.price_cents)
        .bind(&product.image_url)
        .bind(sizes)
        .bind(product.inventory as i64)
        .bind(product.is_deleted)
        .bind(&product.item_number)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.contains("item_number") => {
                DbError::duplicate("item_number", product.item_number.clone().unwrap_or_default())
            }
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Updates descriptive fields: title, description, type, price, image,
    /// item number.
    ///
    /// Stock columns are left alone; use the ledger for those. `updated_at`
    /// is refreshed only when the price changes, so editing copy does not
    /// make local stock look newer than Square's.
    pub async fn update_details(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product details");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                title = ?2,
                description = ?3,
                product_type = ?4,
                image_url = ?6,
                item_number = ?7,
                updated_at = CASE WHEN price_cents != ?5 THEN ?8 ELSE updated_at END,
                price_cents = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.product_type)
        .bind(product.price_cents)
        .bind(&product.image_url)
        .bind(&product.item_number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.get_by_id(&product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Soft-deletes a product.
    ///
    /// ## Why Soft Delete?
    /// - Historical orders still reference this product
    /// - A later pull must not recreate it from Square
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_deleted = 1, updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Writes resolved pull records in one transaction.
    ///
    /// Each row is an upsert keyed by id. Row failures are collected and the
    /// rest of the batch still commits.
    pub async fn upsert_batch(&self, products: &[Product]) -> DbResult<BatchWriteOutcome> {
        let mut outcome = BatchWriteOutcome::default();
        if products.is_empty() {
            return Ok(outcome);
        }

        let mut tx = self.pool.begin().await?;

        for product in products {
            match upsert_on(&mut tx, product).await {
                Ok(()) => outcome.written += 1,
                Err(e) => {
                    warn!(product_id = %product.id, error = %e, "Upsert failed");
                    outcome.failed.push((product.id.clone(), e.to_string()));
                }
            }
        }

        tx.commit().await?;

        debug!(
            written = outcome.written,
            failed = outcome.failed.len(),
            "Batch upsert committed"
        );
        Ok(outcome)
    }

    /// Counts live products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_deleted = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
