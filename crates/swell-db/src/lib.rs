//! # swell-db: Database Layer for Swell
//!
//! This crate is the storefront's database of record. It uses SQLite with
//! sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Swell Data Flow                                │
//! │                                                                         │
//! │  admin-api handler        swell-sync orchestrator                      │
//! │       │                        │                                        │
//! │       ▼                        ▼                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     swell-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Services    │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ ProductRepo   │    │ Fulfillment  │  │   │
//! │  │   │ SqlitePool    │◄───│ LedgerRepo    │◄───│ BulkImporter │  │   │
//! │  │   │ Migrations    │    │ OrderRepo     │    │              │  │   │
//! │  │   │               │    │ SyncRunRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Products, ledger, orders, sync runs
//! - [`fulfillment`] - Decrement-then-persist order placement
//! - [`import`] - Spreadsheet bulk import
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swell_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("swell.db")).await?;
//!
//! let outcome = db.ledger().decrement(&product_id, "M", 1).await?;
//! if outcome.is_short() {
//!     tracing::warn!("sold more than we had");
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fulfillment;
pub mod import;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use fulfillment::{FulfillmentResult, LineOutcome, OrderFulfillment};
pub use import::{BulkImporter, ImportReport, ImportRow, RejectedRow};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::ledger::LedgerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::{BatchWriteOutcome, ProductRepository};
pub use repository::sync_run::SyncRunRepository;
