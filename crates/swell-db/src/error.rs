//! # Storage Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ────────┐                                                  │
//! │  serde_json::Error ──┼──► DbError ──┬──► ApiError   (admin-api)         │
//! │  CoreError ──────────┘              └──► SyncError  (swell-sync)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! SQLite reports constraint failures only as message text, so the sqlx
//! conversion reads the message to tell a duplicate SKU from a CHECK failure.

use swell_core::CoreError;
use thiserror::Error;

/// Everything a repository call can fail with.
#[derive(Debug, Error)]
pub enum DbError {
    /// No product, order or run with that id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A second product claimed an id or `item_number` already in use.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A CHECK on the schema refused the row (negative stock, unknown status text).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A domain rule refused the write, e.g. a Delivered order moved back to
    /// Pending, or aggregate stock set on a sized product.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A stored row no longer decodes: bad `size_inventory` / `items` JSON or
    /// an out-of-range stock count.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// The store could not be opened or no connection became free in time.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other SQLite failure.
    #[error("SQLite error: {0}")]
    Sqlite(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

const UNIQUE_FAILED: &str = "UNIQUE constraint failed: ";
const CHECK_FAILED: &str = "CHECK constraint failed";

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // "UNIQUE constraint failed: products.item_number"
                if let Some((_, column)) = msg.split_once(UNIQUE_FAILED) {
                    DbError::duplicate(column, "unknown")
                } else if msg.contains(CHECK_FAILED) {
                    DbError::ConstraintViolation(msg.to_string())
                } else {
                    DbError::Sqlite(msg.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Unavailable("no free connection".to_string()),
            sqlx::Error::PoolClosed => DbError::Unavailable("pool closed".to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::CorruptRow(err.to_string())
            }
            other => DbError::Sqlite(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::CorruptRow(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_sqlite_failures_are_classified() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query("CREATE TABLE t (sku TEXT UNIQUE, qty INTEGER CHECK (qty >= 0))")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO t VALUES ('RT-1', 1)")
            .execute(db.pool())
            .await
            .unwrap();

        let dup: DbError = sqlx::query("INSERT INTO t VALUES ('RT-1', 2)")
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();
        assert!(matches!(dup, DbError::UniqueViolation { ref field, .. } if field == "t.sku"));

        let negative: DbError = sqlx::query("INSERT INTO t VALUES ('RT-2', -1)")
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();
        assert!(matches!(negative, DbError::ConstraintViolation(_)));
    }

    #[test]
    fn test_bad_json_column_is_corrupt_row() {
        let err: DbError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, DbError::CorruptRow(_)));
    }
}
