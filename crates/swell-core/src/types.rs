//! # Domain Types
//!
//! Core domain types used throughout Swell.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │    SyncRun      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  item_number    │   │  status         │   │  direction      │       │
//! │  │  size_inventory │   │  channel        │   │  succeeded      │       │
//! │  │  inventory      │   │  items (JSON)   │   │  summary (JSON) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ProductType    │   │  OrderStatus    │   │  OrderChannel   │       │
//! │  │  Top, Bottom    │   │  Pending        │   │  Web            │       │
//! │  │  OnePiece       │   │  Processing     │   │  Pos            │       │
//! │  │  CoverUp, Other │   │  Shipped ...    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A product has:
//! - `id`: a local UUID, or the Square item id when a pull created it
//! - `item_number`: optional SKU, the secondary join key to Square variations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::{DecrementOutcome, SizeInventory};
use crate::money::Money;

// =============================================================================
// Product Type
// =============================================================================

/// Storefront product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
pub enum ProductType {
    Top,
    Bottom,
    #[serde(rename = "One-Piece")]
    OnePiece,
    #[serde(rename = "Cover-up")]
    CoverUp,
    Other,
}

impl Default for ProductType {
    fn default() -> Self {
        ProductType::Other
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the storefront catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Local UUID, or the Square item id for products created by a pull.
    pub id: String,

    pub title: String,

    pub description: String,

    pub product_type: ProductType,

    /// Price in cents. Rendered as a decimal string at the API edge.
    pub price_cents: i64,

    pub image_url: Option<String>,

    /// Stock per size. Empty for size-less products.
    pub size_inventory: SizeInventory,

    /// Aggregate stock. Equals the size total whenever sizes exist.
    pub inventory: u32,

    /// Soft delete flag.
    pub is_deleted: bool,

    /// Optional SKU used to match Square variations.
    pub item_number: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Last mutation time, used for conflict resolution against Square.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a size-less product with a fresh UUID and zero stock.
    pub fn new(
        title: impl Into<String>,
        product_type: ProductType,
        price: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Product {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            product_type,
            price_cents: price.cents(),
            image_url: None,
            size_inventory: SizeInventory::new(),
            inventory: 0,
            is_deleted: false,
            item_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when stock is broken down by size.
    #[inline]
    pub fn has_sizes(&self) -> bool {
        !self.size_inventory.is_empty()
    }

    /// Replaces the whole size map and recomputes the aggregate.
    pub fn set_size_inventory(&mut self, sizes: SizeInventory, now: DateTime<Utc>) {
        self.inventory = sizes.total();
        self.size_inventory = sizes;
        self.updated_at = now;
    }

    /// Sets stock on a size-less product.
    ///
    /// Fails when the product has sizes; the aggregate is derived then.
    pub fn set_unsized_inventory(&mut self, quantity: u32, now: DateTime<Utc>) -> CoreResult<()> {
        if self.has_sizes() {
            return Err(CoreError::Validation(ValidationError::InvalidFormat {
                field: "inventory".to_string(),
                reason: "product has sizes; set size_inventory instead".to_string(),
            }));
        }
        self.inventory = quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Floor-at-zero decrement of one size.
    ///
    /// A size-less product asked for the blank size draws from the aggregate
    /// directly; asked for a named size it removes nothing and keeps both its
    /// aggregate and its empty size map. On a sized product the label goes
    /// through the size map, which creates it at zero when it is missing.
    pub fn decrement(&mut self, size: &str, quantity: u32, now: DateTime<Utc>) -> DecrementOutcome {
        let size = size.trim();
        let outcome = if !self.has_sizes() {
            if !size.is_empty() {
                return DecrementOutcome::untouched(quantity);
            }
            let removed = quantity.min(self.inventory);
            self.inventory -= removed;
            DecrementOutcome {
                requested: quantity,
                removed,
            }
        } else {
            let outcome = self.size_inventory.decrement(size, quantity);
            self.inventory = self.size_inventory.total();
            outcome
        };
        self.updated_at = now;
        outcome
    }

    /// Marks the product deleted.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.is_deleted = true;
        self.updated_at = now;
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    /// Cancelled and Delivered orders never change again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    const fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    /// Checks a status change.
    ///
    /// ```text
    /// Pending ──► Processing ──► Shipped ──► Delivered
    ///    │            │             │
    ///    └────────────┴─────────────┴──────► Cancelled
    /// ```
    /// Forward skips are allowed; going backwards is not. Setting the same
    /// status again is a no-op and allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == OrderStatus::Cancelled || next.rank() > self.rank()
    }
}

// =============================================================================
// Order Channel
// =============================================================================

/// Which front door created an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderChannel {
    /// Online checkout after payment capture.
    Web,
    /// In-person sale confirmed on the POS.
    Pos,
}

impl OrderChannel {
    /// Status a freshly fulfilled order starts in.
    ///
    /// A counter sale leaves the shop with the customer.
    pub const fn initial_status(&self) -> OrderStatus {
        match self {
            OrderChannel::Web => OrderStatus::Pending,
            OrderChannel::Pos => OrderStatus::Delivered,
        }
    }
}

// =============================================================================
// Order Items
// =============================================================================

/// A purchased line, frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub product_id: String,
    /// Title at time of sale (frozen).
    pub title: String,
    pub quantity: u32,
    /// Unit price in cents at time of sale (frozen).
    pub price_cents: i64,
    /// Size label; empty for size-less products.
    #[serde(default)]
    pub size: String,
    pub image: Option<String>,
}

impl OrderItem {
    /// Unit price times quantity.
    pub fn line_total(&self) -> Result<Money, ValidationError> {
        Money::from_cents(self.price_cents)
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| order_total_overflow("items"))
    }
}

fn order_total_overflow(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

/// A ledger draw-down request: one product, one size, a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,
    #[serde(default)]
    pub size: String,
    pub quantity: u32,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub total_cents: i64,
    pub shipping_cost_cents: i64,
    pub item_cost_cents: i64,
    pub status: OrderStatus,
    pub channel: OrderChannel,
    pub tracking_number: Option<String>,
    pub payment_reference: Option<String>,
    pub items: Vec<OrderItem>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to write an order once stock has been drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_cost_cents: i64,
    pub channel: OrderChannel,
    pub payment_reference: Option<String>,
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    /// Sum of line totals.
    pub fn item_cost(&self) -> Result<Money, ValidationError> {
        self.items.iter().try_fold(Money::zero(), |acc, item| {
            acc.checked_add(item.line_total()?)
                .ok_or_else(|| order_total_overflow("items"))
        })
    }

    /// Item cost plus shipping.
    pub fn total(&self) -> Result<Money, ValidationError> {
        self.item_cost()?
            .checked_add(Money::from_cents(self.shipping_cost_cents))
            .ok_or_else(|| order_total_overflow("total"))
    }

    /// The ledger draw-downs this draft implies.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|item| LineItem {
                product_id: item.product_id.clone(),
                size: item.size.clone(),
                quantity: item.quantity,
            })
            .collect()
    }

    /// Turns the draft into an order with computed totals.
    ///
    /// Fails when a line total or the order total does not fit in cents.
    pub fn into_order(self, now: DateTime<Utc>) -> Result<Order, ValidationError> {
        let item_cost = self.item_cost()?;
        let total = self.total()?;
        Ok(Order {
            id: Uuid::new_v4().to_string(),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            date: now,
            total_cents: total.cents(),
            shipping_cost_cents: self.shipping_cost_cents,
            item_cost_cents: item_cost.cents(),
            status: self.channel.initial_status(),
            channel: self.channel,
            tracking_number: None,
            payment_reference: self.payment_reference,
            items: self.items,
            updated_at: now,
        })
    }
}

// =============================================================================
// Sync Runs
// =============================================================================

/// Direction of a Square sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Square → storefront.
    Pull,
    /// Storefront → Square.
    Push,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncDirection::Pull => write!(f, "pull"),
            SyncDirection::Push => write!(f, "push"),
        }
    }
}

/// One recorded sync pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncRun {
    pub id: String,
    pub direction: SyncDirection,
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub finished_at: DateTime<Utc>,
    pub succeeded: bool,
    /// The pass report as JSON, when the pass completed.
    pub summary: Option<String>,
    /// The fatal error message, when the pass failed.
    pub error: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
