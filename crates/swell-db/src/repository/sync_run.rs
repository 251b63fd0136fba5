//! # Sync Run Repository
//!
//! Append-only history of Square sync passes.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use swell_core::{SyncDirection, SyncRun};

#[derive(Debug, sqlx::FromRow)]
struct SyncRunRow {
    id: String,
    direction: SyncDirection,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    succeeded: bool,
    summary: Option<String>,
    error: Option<String>,
}

impl From<SyncRunRow> for SyncRun {
    fn from(row: SyncRunRow) -> Self {
        SyncRun {
            id: row.id,
            direction: row.direction,
            started_at: row.started_at,
            finished_at: row.finished_at,
            succeeded: row.succeeded,
            summary: row.summary,
            error: row.error,
        }
    }
}

/// Repository for the `sync_runs` table.
#[derive(Debug, Clone)]
pub struct SyncRunRepository {
    pool: SqlitePool,
}

impl SyncRunRepository {
    /// Creates a new SyncRunRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncRunRepository { pool }
    }

    /// Appends a finished pass.
    pub async fn record(&self, run: &SyncRun) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_runs (id, direction, started_at, finished_at, succeeded, summary, error)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&run.id)
        .bind(run.direction)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.succeeded)
        .bind(&run.summary)
        .bind(&run.error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent passes first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<SyncRun>> {
        let rows = sqlx::query_as::<_, SyncRunRow>(
            r#"
            SELECT id, direction, started_at, finished_at, succeeded, summary, error
            FROM sync_runs
            ORDER BY started_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SyncRun::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;

    fn run(direction: SyncDirection, started_at: DateTime<Utc>, ok: bool) -> SyncRun {
        SyncRun {
            id: uuid::Uuid::new_v4().to_string(),
            direction,
            started_at,
            finished_at: started_at + Duration::seconds(3),
            succeeded: ok,
            summary: ok.then(|| r#"{"synced":2}"#.to_string()),
            error: (!ok).then(|| "Square catalog API error: 503".to_string()),
        }
    }

    #[tokio::test]
    async fn test_record_and_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let t0 = Utc::now();

        db.sync_runs()
            .record(&run(SyncDirection::Pull, t0, true))
            .await
            .unwrap();
        db.sync_runs()
            .record(&run(SyncDirection::Push, t0 + Duration::minutes(1), false))
            .await
            .unwrap();

        let runs = db.sync_runs().list_recent(10).await.unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].direction, SyncDirection::Push);
        assert!(!runs[0].succeeded);
        assert_eq!(runs[1].summary.as_deref(), Some(r#"{"synced":2}"#));
    }
}
