//! # swell-sync: Square Sync Engine for Swell
//!
//! Two-way reconciliation between the storefront's product table and the
//! Square catalog used by the in-store POS.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                SyncService (auth → token → pass → record)        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 SyncOrchestrator (pull / push)                   │  │
//! │  └──────┬──────────────────────┬──────────────────────┬─────────────┘  │
//! │         ▼                      ▼                      ▼                 │
//! │  ┌────────────────┐  ┌────────────────────┐  ┌────────────────────┐    │
//! │  │ CatalogMapper  │  │ ConflictResolver   │  │ PosCatalog         │    │
//! │  │                │  │ (swell-core)       │  │                    │    │
//! │  │ id / SKU keys  │  │                    │  │ SquareClient       │    │
//! │  │ images, sizes  │  │ last write wins    │  │ (reqwest)          │    │
//! │  └────────────────┘  └────────────────────┘  └────────────────────┘    │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                  swell-db ProductRepository / SyncRunRepository         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`auth`] - Bearer JWT verification and Square token precedence
//! - [`config`] - Square and pass settings (TOML + env)
//! - [`error`] - Sync error types
//! - [`mapper`] - Local ↔ Square identity, images, size maps
//! - [`mock`] - In-memory catalog for tests
//! - [`orchestrator`] - Pull and push passes with reports
//! - [`protocol`] - Square wire types and the [`PosCatalog`] trait
//! - [`service`] - Authorized, recorded pass entry point
//! - [`square`] - Square REST client
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swell_sync::{JwtVerifier, SyncConfig, SyncRequest, SyncService};
//!
//! let config = SyncConfig::load(None)?;
//! let service = SyncService::new(db, config, JwtVerifier::new(secret));
//!
//! let report = service
//!     .run(SyncRequest {
//!         direction: SyncDirection::Pull,
//!         bearer: Some(token),
//!         client_token: None,
//!     })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod config;
pub mod error;
pub mod mapper;
pub mod mock;
pub mod orchestrator;
pub mod protocol;
pub mod service;
pub mod square;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{authorize, extract_bearer_token, Claims, JwtVerifier, PosToken, Role, TokenSource};
pub use config::{SquareEnvironment, SquareSettings, SyncConfig, SyncSettings};
pub use error::{SyncError, SyncResult};
pub use mapper::{CatalogMapping, LocalMatch};
pub use orchestrator::{PullReport, PushReport, SyncOrchestrator, SyncReport};
pub use protocol::PosCatalog;
pub use service::{SyncRequest, SyncService};
pub use square::SquareClient;
