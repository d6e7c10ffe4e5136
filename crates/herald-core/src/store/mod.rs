//! Persistent announcement ledger.
//!
//! One local SQLite file shared by the webhook path and every poller. Every
//! operation is a short single-statement read or upsert on a primary key, so
//! two concurrent observers of the same logical event converge on one row
//! instead of racing. Correctness survives process restarts because nothing
//! here is cached in memory.

mod gc;
mod ledger;
mod meta;
mod quality;
mod schema;
mod seasons;
mod suppression;

pub use gc::GcCounts;
pub use ledger::AnnouncementRecord;
pub use quality::SnapshotOutcome;
pub use seasons::SeasonProgressRecord;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to prepare database path: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the ledger database at `path`.
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        schema::run_migrations(&pool).await?;
        info!(path = %path.display(), "Ledger database ready");
        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps every query
    /// on the same memory database.
    pub async fn connect_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        schema::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
