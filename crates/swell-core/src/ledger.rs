//! # Inventory Ledger
//!
//! Size-partitioned stock counts and their aggregate.
//!
//! ## Ledger Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product "Reef Triangle Top"                                            │
//! │                                                                         │
//! │    size_inventory  { "L": 1, "M": 5, "S": 3 }   (sorted map)           │
//! │    inventory       9                            (always the sum)       │
//! │                                                                         │
//! │  Product "Beach Sarong" (size-less)                                     │
//! │                                                                         │
//! │    size_inventory  { }                                                  │
//! │    inventory       12                           (carried directly)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Writers
//! Web checkout, POS sale confirmation, admin edits and the Square pull all
//! mutate stock through `set_size_inventory` and `decrement`. The durable
//! twin of [`InventoryLedger`] is `swell_db::LedgerRepository`; both delegate
//! to the same `Product` methods so the arithmetic lives in one place.
//!
//! ## Floor at Zero
//! A decrement never drives a size negative and never fails. It reports how
//! much it actually removed so a caller can spot short fulfillment.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Product;

// =============================================================================
// Size Inventory
// =============================================================================

/// Stock per size label.
///
/// Backed by a `BTreeMap` so JSON serialization is deterministic, which keeps
/// the `size_inventory` column stable across repeated pulls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct SizeInventory(BTreeMap<String, u32>);

impl SizeInventory {
    /// Creates an empty (size-less) inventory.
    pub fn new() -> Self {
        SizeInventory(BTreeMap::new())
    }

    /// Builds an inventory from `(label, quantity)` pairs.
    ///
    /// Later pairs win when a label repeats.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        SizeInventory(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Sum of every size.
    pub fn total(&self) -> u32 {
        self.0.values().fold(0u32, |acc, q| acc.saturating_add(*q))
    }

    /// Quantity for one size, if the size exists.
    pub fn get(&self, size: &str) -> Option<u32> {
        self.0.get(size).copied()
    }

    /// Sets one size to an exact quantity.
    pub fn set(&mut self, size: impl Into<String>, quantity: u32) {
        self.0.insert(size.into(), quantity);
    }

    /// Floor-at-zero subtraction on one size.
    ///
    /// An absent size is first created at 0, so the call always leaves an
    /// entry for `size` behind.
    pub fn decrement(&mut self, size: &str, quantity: u32) -> DecrementOutcome {
        let current = self.0.entry(size.to_string()).or_insert(0);
        let removed = quantity.min(*current);
        *current -= removed;
        DecrementOutcome {
            requested: quantity,
            removed,
        }
    }

    /// Returns true when the product has no size breakdown.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of size labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates sizes in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Size labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, u32)> for SizeInventory {
    fn from_iter<T: IntoIterator<Item = (String, u32)>>(iter: T) -> Self {
        SizeInventory(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, u32>> for SizeInventory {
    fn from(map: BTreeMap<String, u32>) -> Self {
        SizeInventory(map)
    }
}

// =============================================================================
// Decrement Outcome
// =============================================================================

/// What a decrement actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DecrementOutcome {
    /// Quantity the caller asked to remove.
    pub requested: u32,
    /// Quantity removed before hitting zero.
    pub removed: u32,
}

impl DecrementOutcome {
    /// Outcome for a product that does not exist.
    pub const fn untouched(requested: u32) -> Self {
        DecrementOutcome {
            requested,
            removed: 0,
        }
    }

    /// True when less was removed than requested.
    #[inline]
    pub const fn is_short(&self) -> bool {
        self.removed < self.requested
    }

    /// Units that could not be taken from stock.
    #[inline]
    pub const fn shortfall(&self) -> u32 {
        self.requested - self.removed
    }
}

// =============================================================================
// In-Memory Ledger
// =============================================================================

/// An in-memory ledger keyed by product id.
///
/// Holds whole products so it can be loaded straight from the repository or
/// a fixture and then exercised without a database.
#[derive(Debug, Clone, Default)]
pub struct InventoryLedger {
    products: HashMap<String, Product>,
}

impl InventoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Looks up a product.
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.get(product_id)
    }

    /// Replaces the whole size map of a product.
    ///
    /// Returns false when the product is unknown.
    pub fn set_size_inventory(
        &mut self,
        product_id: &str,
        sizes: SizeInventory,
        now: DateTime<Utc>,
    ) -> bool {
        match self.products.get_mut(product_id) {
            Some(product) => {
                product.set_size_inventory(sizes, now);
                true
            }
            None => false,
        }
    }

    /// Decrements one size of a product. Unknown products are a no-op.
    pub fn decrement(
        &mut self,
        product_id: &str,
        size: &str,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> DecrementOutcome {
        match self.products.get_mut(product_id) {
            Some(product) => product.decrement(size, quantity, now),
            None => DecrementOutcome::untouched(quantity),
        }
    }

    /// The aggregate stock of a product.
    pub fn total_inventory(&self, product_id: &str) -> Option<u32> {
        self.products.get(product_id).map(|p| p.inventory)
    }
}

impl FromIterator<Product> for InventoryLedger {
    fn from_iter<T: IntoIterator<Item = Product>>(iter: T) -> Self {
        let mut ledger = InventoryLedger::new();
        for product in iter {
            ledger.insert(product);
        }
        ledger
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::ProductType;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn bikini_top(sizes: SizeInventory) -> Product {
        let mut p = Product::new(
            "Reef Triangle Top",
            ProductType::Top,
            Money::from_cents(6400),
            t0(),
        );
        p.id = "p1".to_string();
        p.set_size_inventory(sizes, t0());
        p
    }

    #[test]
    fn test_size_inventory_total_and_order() {
        let sizes = SizeInventory::from_pairs([("M", 5), ("S", 3), ("L", 1)]);
        assert_eq!(sizes.total(), 9);
        let labels: Vec<_> = sizes.labels().collect();
        assert_eq!(labels, vec!["L", "M", "S"]);
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut sizes = SizeInventory::from_pairs([("M", 1)]);
        let outcome = sizes.decrement("M", 3);

        assert_eq!(sizes.get("M"), Some(0));
        assert_eq!(outcome.removed, 1);
        assert!(outcome.is_short());
        assert_eq!(outcome.shortfall(), 2);
    }

    #[test]
    fn test_decrement_unknown_size_creates_zero_entry() {
        let mut ledger: InventoryLedger =
            vec![bikini_top(SizeInventory::from_pairs([("S", 3)]))].into_iter().collect();

        let outcome = ledger.decrement("p1", "XL", 1, t0());

        let product = ledger.get("p1").unwrap();
        assert_eq!(product.size_inventory.get("XL"), Some(0));
        assert_eq!(product.inventory, 3);
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn test_aggregate_matches_sizes_after_every_mutation() {
        let mut ledger: InventoryLedger = vec![bikini_top(SizeInventory::from_pairs([
            ("S", 5),
            ("M", 5),
        ]))]
        .into_iter()
        .collect();

        let check = |l: &InventoryLedger| {
            let p = l.get("p1").unwrap();
            assert_eq!(p.inventory, p.size_inventory.total());
        };

        ledger.decrement("p1", "S", 2, t0());
        check(&ledger);
        ledger.decrement("p1", "M", 9, t0());
        check(&ledger);
        ledger.set_size_inventory("p1", SizeInventory::from_pairs([("L", 4)]), t0());
        check(&ledger);
        assert_eq!(ledger.total_inventory("p1"), Some(4));
    }

    #[test]
    fn test_mutations_refresh_updated_at() {
        let mut ledger: InventoryLedger =
            vec![bikini_top(SizeInventory::from_pairs([("S", 5)]))].into_iter().collect();
        let later = t0() + Duration::minutes(5);

        ledger.decrement("p1", "S", 1, later);

        assert_eq!(ledger.get("p1").unwrap().updated_at, later);
    }

    #[test]
    fn test_unknown_product_is_noop() {
        let mut ledger = InventoryLedger::new();

        let outcome = ledger.decrement("missing", "S", 2, t0());

        assert_eq!(outcome, DecrementOutcome::untouched(2));
        assert!(!ledger.set_size_inventory("missing", SizeInventory::new(), t0()));
        assert_eq!(ledger.total_inventory("missing"), None);
    }

    #[test]
    fn test_sizeless_product_decrements_aggregate() {
        let mut sarong = Product::new(
            "Beach Sarong",
            ProductType::CoverUp,
            Money::from_cents(3800),
            t0(),
        );
        sarong.id = "p2".to_string();
        sarong.inventory = 4;
        let mut ledger: InventoryLedger = vec![sarong].into_iter().collect();

        let outcome = ledger.decrement("p2", "", 6, t0());

        assert_eq!(outcome.removed, 4);
        assert_eq!(ledger.total_inventory("p2"), Some(0));
        assert!(ledger.get("p2").unwrap().size_inventory.is_empty());
    }

    #[test]
    fn test_named_size_on_sizeless_product_keeps_aggregate() {
        let mut sarong = Product::new(
            "Beach Sarong",
            ProductType::CoverUp,
            Money::from_cents(3800),
            t0(),
        );
        sarong.id = "p2".to_string();
        sarong.inventory = 12;
        let mut ledger: InventoryLedger = vec![sarong].into_iter().collect();

        let outcome = ledger.decrement("p2", "M", 1, t0() + Duration::minutes(1));

        let product = ledger.get("p2").unwrap();
        assert_eq!(outcome, DecrementOutcome::untouched(1));
        assert_eq!(product.inventory, 12);
        assert!(product.size_inventory.is_empty());
        assert_eq!(product.updated_at, t0());
    }
}
