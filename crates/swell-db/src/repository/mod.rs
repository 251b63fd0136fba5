//! # Repository Module
//!
//! Database repository implementations for Swell.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes What                                      │
//! │                                                                         │
//! │  ProductRepository   descriptive fields, soft delete, pull upserts     │
//! │  LedgerRepository    size_inventory / inventory (read-modify-write)    │
//! │  OrderRepository     order rows, status, tracking                      │
//! │  SyncRunRepository   pass history                                      │
//! │                                                                         │
//! │  Stock columns are only touched by LedgerRepository and by the pull    │
//! │  upsert, which writes whole resolved records in one transaction.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository)
//! - [`LedgerRepository`](ledger::LedgerRepository)
//! - [`OrderRepository`](order::OrderRepository)
//! - [`SyncRunRepository`](sync_run::SyncRunRepository)

pub mod ledger;
pub mod order;
pub mod product;
pub mod sync_run;
