//! # swell-core: Pure Storefront Logic for Swell
//!
//! This crate holds the inventory rules of the Swell storefront as pure
//! functions. Both the web checkout and the in-store Square POS draw stock
//! from the ledger defined here, and the Square sync engine arbitrates
//! between the two catalogs with the resolver defined here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Swell Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/admin-api (axum)                        │   │
//! │  │    POST /api/sync, checkout, POS sale, products, orders         │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────┐   ┌───────────────▼───────────────┐   │
//! │  │   swell-sync                │   │   swell-db                    │   │
//! │  │   Square client, mapper,    │──►│   products, ledger, orders,   │   │
//! │  │   pull/push orchestrator    │   │   fulfillment, sync runs      │   │
//! │  └──────────────┬──────────────┘   └───────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────────────────────▼───────────────┐   │
//! │  │               ★ swell-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  ledger   │  │ conflict  │  │  catalog  │  │   │
//! │  │   │  Product  │  │ SizeInv.  │  │  resolve  │  │ classify  │  │   │
//! │  │   │   Order   │  │ decrement │  │  TieBreak │  │ size label│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, SyncRun, etc.)
//! - [`money`] - Integer cents with decimal-string parsing for prices
//! - [`ledger`] - Size-partitioned stock and the in-memory ledger
//! - [`conflict`] - Last-write-wins arbitration between local and Square
//! - [`catalog`] - Product type classification and variation size labels
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use swell_core::ledger::SizeInventory;
//!
//! let mut sizes = SizeInventory::from_pairs([("S", 5), ("M", 5)]);
//! let outcome = sizes.decrement("S", 2);
//!
//! assert_eq!(outcome.removed, 2);
//! assert_eq!(sizes.total(), 8);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod conflict;
pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use conflict::{InventorySnapshot, InventorySource, Resolution, TieBreak};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{DecrementOutcome, InventoryLedger, SizeInventory};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Size key used for a size-less variation when an item has several variations.
pub const ONE_SIZE_LABEL: &str = "One Size";

/// Maximum quantity of a single line in an order.
///
/// ## Business Reason
/// Guards against a mistyped quantity draining a whole size in one click.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Maximum number of lines in a single order.
pub const MAX_ORDER_LINES: usize = 50;

/// Highest accepted unit price or shipping charge, in cents ($100,000.00).
pub const MAX_PRICE_CENTS: i64 = 10_000_000;
