//! # Spreadsheet Bulk Import
//!
//! The admin UI parses a product sheet and posts its rows here.
//!
//! ## Row Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  row ──► validate (title, price, item_number, sizes)                    │
//! │            │                                                            │
//! │            ├── invalid ───────────────► rejected { row, message }       │
//! │            │                                                            │
//! │            ▼                                                            │
//! │     item_number matches a product?                                      │
//! │            │                                                            │
//! │            ├── yes ──► update details, stock through the ledger         │
//! │            │                              ──► updated                   │
//! │            └── no  ──► insert new product ──► imported                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Rows are independent: one bad row never blocks the rest of the sheet.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::ledger::LedgerRepository;
use crate::repository::product::ProductRepository;
use swell_core::catalog::classify_product_type;
use swell_core::validation::{
    validate_item_number, validate_price_cents, validate_size_inventory, validate_title,
};
use swell_core::{Money, Product, ProductType, SizeInventory, ValidationError};

/// One spreadsheet row.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Classified from the title when blank.
    pub product_type: Option<ProductType>,
    /// Decimal string, e.g. `"64.00"`.
    pub price: String,
    pub item_number: Option<String>,
    pub image_url: Option<String>,
    /// Stock per size; leave empty for size-less products.
    #[serde(default)]
    pub sizes: SizeInventory,
    /// Stock for size-less products.
    pub inventory: Option<u32>,
}

/// A row that was not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// Zero-based row index within the posted sheet.
    pub row: usize,
    pub message: String,
}

/// Per-sheet accounting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub updated: usize,
    pub rejected: Vec<RejectedRow>,
}

/// A row that passed validation.
struct ValidRow {
    title: String,
    description: String,
    product_type: ProductType,
    price: Money,
    item_number: Option<String>,
    image_url: Option<String>,
    sizes: SizeInventory,
    inventory: u32,
}

fn validate_row(row: ImportRow) -> Result<ValidRow, ValidationError> {
    validate_title(&row.title)?;
    let price = Money::parse_decimal(&row.price)?;
    validate_price_cents(price.cents())?;

    let item_number = row
        .item_number
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(item_number) = &item_number {
        validate_item_number(item_number)?;
    }
    validate_size_inventory(&row.sizes)?;

    let title = row.title.trim().to_string();
    let product_type = row
        .product_type
        .unwrap_or_else(|| classify_product_type(&title));

    Ok(ValidRow {
        product_type,
        title,
        description: row.description.trim().to_string(),
        price,
        item_number,
        image_url: row.image_url.filter(|s| !s.trim().is_empty()),
        inventory: row.inventory.unwrap_or(0),
        sizes: row.sizes,
    })
}

/// Writes validated sheet rows.
#[derive(Debug, Clone)]
pub struct BulkImporter {
    products: ProductRepository,
    ledger: LedgerRepository,
}

impl BulkImporter {
    /// Creates an importer over the product and ledger repositories.
    pub fn new(products: ProductRepository, ledger: LedgerRepository) -> Self {
        BulkImporter { products, ledger }
    }

    /// Imports every row and reports what happened to each.
    pub async fn import(&self, rows: Vec<ImportRow>) -> DbResult<ImportReport> {
        let mut report = ImportReport::default();

        for (index, row) in rows.into_iter().enumerate() {
            let valid = match validate_row(row) {
                Ok(v) => v,
                Err(e) => {
                    debug!(row = index, error = %e, "Import row rejected");
                    report.rejected.push(RejectedRow {
                        row: index,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let existing = match &valid.item_number {
                Some(item_number) => self.products.get_by_item_number(item_number).await?,
                None => None,
            };

            let written = match existing {
                Some(existing) => self.update_existing(existing, valid).await.map(|_| false),
                None => self.create(valid).await.map(|_| true),
            };

            match written {
                Ok(true) => report.imported += 1,
                Ok(false) => report.updated += 1,
                Err(e @ (DbError::UniqueViolation { .. } | DbError::Domain(_))) => {
                    report.rejected.push(RejectedRow {
                        row: index,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            imported = report.imported,
            updated = report.updated,
            rejected = report.rejected.len(),
            "Bulk import finished"
        );
        Ok(report)
    }

    async fn create(&self, row: ValidRow) -> DbResult<Product> {
        let now = Utc::now();
        let mut product = Product::new(row.title, row.product_type, row.price, now);
        product.description = row.description;
        product.item_number = row.item_number;
        product.image_url = row.image_url;
        if row.sizes.is_empty() {
            product.set_unsized_inventory(row.inventory, now)?;
        } else {
            product.set_size_inventory(row.sizes, now);
        }

        self.products.insert(&product).await
    }

    async fn update_existing(&self, mut existing: Product, row: ValidRow) -> DbResult<Product> {
        existing.title = row.title;
        existing.description = row.description;
        existing.product_type = row.product_type;
        existing.price_cents = row.price.cents();
        if row.image_url.is_some() {
            existing.image_url = row.image_url;
        }
        self.products.update_details(&existing).await?;

        if !row.sizes.is_empty() {
            self.ledger.set_size_inventory(&existing.id, row.sizes).await
        } else if existing.has_sizes() {
            // Sheet carries no size columns for a sized product: leave stock alone.
            self.products
                .get_by_id(&existing.id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", &existing.id))
        } else {
            self.ledger
                .set_unsized_inventory(&existing.id, row.inventory)
                .await
        }
    }
}
