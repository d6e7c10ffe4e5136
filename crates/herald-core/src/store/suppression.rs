use chrono::{DateTime, Duration, Utc};
use herald_models::LogicalKey;

use super::ledger::parse_ts;
use super::{Store, StoreError};

impl Store {
    /// Record "a quality-update notification for this key was just sent".
    pub async fn touch_quality_update(
        &self,
        key: &LogicalKey,
        item_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO recent_quality_updates (logical_key, item_id, notified_at)
            VALUES (?, ?, ?)
            ON CONFLICT(logical_key) DO UPDATE SET
                item_id = excluded.item_id,
                notified_at = excluded.notified_at
            "#,
        )
        .bind(key.as_str())
        .bind(item_id)
        .bind(now.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Whether a quality update for this key was announced within `window`.
    /// The webhook "new item" path short-circuits on this so the ingest event
    /// behind a poller-detected upgrade is not re-announced as new.
    pub async fn is_recent_quality_update(
        &self,
        key: &LogicalKey,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT notified_at FROM recent_quality_updates WHERE logical_key = ?")
                .bind(key.as_str())
                .fetch_optional(self.pool())
                .await?;
        Ok(match raw {
            Some(raw) => now - parse_ts(&raw) < window,
            None => false,
        })
    }

    pub async fn quality_update_marker_count(&self) -> Result<i64, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM recent_quality_updates")
                .fetch_one(self.pool())
                .await?,
        )
    }

    /// Drop markers older than `window`; they can never suppress again.
    pub async fn prune_quality_updates(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let cutoff = now - window;
        let result = sqlx::query("DELETE FROM recent_quality_updates WHERE notified_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
