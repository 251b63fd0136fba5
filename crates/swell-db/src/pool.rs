//! # Storefront Database Handle
//!
//! Opens the SQLite store, brings the schema up to date and hands out
//! repositories.
//!
//! ## Who Writes Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   web checkout     POS sale      admin edit      sync pull             │
//! │        │               │              │               │                 │
//! │        └───────────────┴──────┬───────┴───────────────┘                 │
//! │                               ▼                                         │
//! │                 SqlitePool (max_connections)                            │
//! │                               │                                         │
//! │                               ▼                                         │
//! │        one writer at a time: a ledger transaction that finds the        │
//! │        write lock taken waits up to `busy_timeout` for it               │
//! │                                                                         │
//! │   readers (product listing, order history) run beside the writer (WAL)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Test Databases
//! `DbConfig::in_memory()` gives every test its own private store on a single
//! connection. A second connection to `:memory:` would open a different,
//! empty database, so the pool is pinned to one.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::fulfillment::OrderFulfillment;
use crate::import::BulkImporter;
use crate::migrations;
use crate::repository::ledger::LedgerRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sync_run::SyncRunRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the store lives and how many connections may share it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Default 5: one storefront and a few admin sessions.
    pub max_connections: u32,
    /// How long a stock write waits for another writer before failing.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// A file-backed store; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// A private, empty store for one test.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            busy_timeout: Duration::from_secs(1),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY_PATH)
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new()
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout);

        if self.is_in_memory() {
            options.in_memory(true)
        } else {
            options
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let max_connections = if config.is_in_memory() {
            1
        } else {
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::Unavailable(e.to_string()))?;

        info!(
            path = %config.database_path.display(),
            max_connections,
            "Database opened"
        );

        migrations::run_migrations(&pool).await?;
        Ok(Database { pool })
    }

    /// Raw pool access for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Every stock change (checkout, POS, admin edit) goes through here.
    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn sync_runs(&self) -> SyncRunRepository {
        SyncRunRepository::new(self.pool.clone())
    }

    pub fn fulfillment(&self) -> OrderFulfillment {
        OrderFulfillment::new(self.ledger(), self.orders())
    }

    /// Spreadsheet bulk import.
    pub fn importer(&self) -> BulkImporter {
        BulkImporter::new(self.products(), self.ledger())
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True when the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
