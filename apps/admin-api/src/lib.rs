//! # Swell Admin API
//!
//! HTTP server for the storefront back office: Square sync, product and
//! order administration, and the two order front doors.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Admin API Routes                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  sync (admin)  │  │ products       │  │  orders (staff, admin)     ││
//! │  │                │  │ (admin)        │  │                            ││
//! │  │ • POST /sync   │  │ • create, list │  │ • list, get                ││
//! │  │ • GET runs     │  │ • sizes, del   │  │ • status, tracking         ││
//! │  │                │  │ • import       │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │ checkout (web) │  │ pos sales      │  │ health         │            │
//! │  │ fulfillment    │  │ fulfillment    │  │ DB ping        │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  swell-sync (SyncService, JWT)     swell-db (SQLite repositories)│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - HTTP server port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: swell.db)
//! - `JWT_SECRET` - Secret for verifying bearer tokens
//! - `SWELL_SYNC_CONFIG` - Square settings file (default: platform config dir)
//! - `RUST_LOG` - log filter (default: info)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use axum::routing::{get, post, put};
use axum::Router;
use swell_db::Database;
use swell_sync::{JwtVerifier, SyncService};

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub sync: SyncService,
    pub verifier: JwtVerifier,
}

impl AppState {
    pub fn new(db: Database, sync: SyncService, verifier: JwtVerifier) -> Self {
        AppState { db, sync, verifier }
    }
}

/// Builds the full router (separated from `main` for testing).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/sync", post(routes::sync::trigger))
        .route("/api/sync/runs", get(routes::sync::runs))
        .route(
            "/api/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route("/api/products/import", post(routes::products::import))
        .route(
            "/api/products/{id}",
            get(routes::products::get)
                .put(routes::products::update)
                .delete(routes::products::delete),
        )
        .route("/api/products/{id}/sizes", put(routes::products::set_sizes))
        .route("/api/orders", get(routes::orders::list))
        .route("/api/orders/{id}", get(routes::orders::get))
        .route("/api/orders/{id}/status", put(routes::orders::update_status))
        .route("/api/orders/{id}/tracking", put(routes::orders::set_tracking))
        .route("/api/checkout/complete", post(routes::checkout::complete))
        .route("/api/pos/sales", post(routes::checkout::pos_sale))
        .with_state(state)
}
