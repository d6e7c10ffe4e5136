use chrono::{DateTime, Utc};
use herald_models::{LogicalKey, QualitySnapshot};
use sqlx::Row;

use super::ledger::parse_ts;
use super::{Store, StoreError};

/// What `store_snapshot` decided about one observation.
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    /// First substantial quality row for this logical key.
    pub inserted: bool,
    /// Signatures differ and both old and new snapshots are substantial.
    pub changed: bool,
    pub old_snapshot: Option<QualitySnapshot>,
    pub new_snapshot: QualitySnapshot,
}

impl Store {
    /// Record an observed snapshot and decide whether it is a material
    /// quality change.
    ///
    /// The per-item-id history row is upserted unconditionally. The
    /// per-logical-key row is only created from a substantial snapshot and
    /// only replaced when both sides are substantial and the signatures
    /// differ; a transient empty parse right after ingestion can therefore
    /// never read as a change.
    pub async fn store_snapshot(
        &self,
        item_id: &str,
        key: &LogicalKey,
        snapshot: &QualitySnapshot,
        now: DateTime<Utc>,
    ) -> Result<SnapshotOutcome, StoreError> {
        let signature = snapshot.signature();
        let snapshot_json = serde_json::to_string(snapshot)?;

        // Physical-file history, one row per internal id ever seen
        sqlx::query(
            r#"
            INSERT INTO media_quality (item_id, logical_key, snapshot_json, signature, date_seen)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(item_id) DO UPDATE SET
                logical_key = excluded.logical_key,
                snapshot_json = excluded.snapshot_json,
                signature = excluded.signature,
                date_seen = excluded.date_seen
            "#,
        )
        .bind(item_id)
        .bind(key.as_str())
        .bind(&snapshot_json)
        .bind(signature.as_str())
        .bind(now.to_rfc3339())
        .execute(self.pool())
        .await?;

        let existing = sqlx::query(
            "SELECT snapshot_json, signature FROM content_quality WHERE logical_key = ?",
        )
        .bind(key.as_str())
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = existing else {
            if !snapshot.is_substantial() {
                return Ok(SnapshotOutcome {
                    inserted: false,
                    changed: false,
                    old_snapshot: None,
                    new_snapshot: snapshot.clone(),
                });
            }
            sqlx::query(
                r#"
                INSERT INTO content_quality
                    (logical_key, item_id, snapshot_json, signature, date_seen)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(logical_key) DO NOTHING
                "#,
            )
            .bind(key.as_str())
            .bind(item_id)
            .bind(&snapshot_json)
            .bind(signature.as_str())
            .bind(now.to_rfc3339())
            .execute(self.pool())
            .await?;
            return Ok(SnapshotOutcome {
                inserted: true,
                changed: false,
                old_snapshot: None,
                new_snapshot: snapshot.clone(),
            });
        };

        let old_signature: String = row.get("signature");
        let old_snapshot: QualitySnapshot =
            serde_json::from_str(&row.get::<String, _>("snapshot_json")).unwrap_or_default();

        let changed = old_signature != signature.as_str()
            && old_snapshot.is_substantial()
            && snapshot.is_substantial();

        if changed {
            sqlx::query(
                r#"
                UPDATE content_quality
                SET item_id = ?, snapshot_json = ?, signature = ?, date_seen = ?
                WHERE logical_key = ?
                "#,
            )
            .bind(item_id)
            .bind(&snapshot_json)
            .bind(signature.as_str())
            .bind(now.to_rfc3339())
            .bind(key.as_str())
            .execute(self.pool())
            .await?;
        }

        Ok(SnapshotOutcome {
            inserted: false,
            changed,
            old_snapshot: Some(old_snapshot),
            new_snapshot: snapshot.clone(),
        })
    }

    /// Last accepted snapshot for a logical key, if any.
    pub async fn content_quality(
        &self,
        key: &LogicalKey,
    ) -> Result<Option<(QualitySnapshot, DateTime<Utc>)>, StoreError> {
        let row = sqlx::query(
            "SELECT snapshot_json, date_seen FROM content_quality WHERE logical_key = ?",
        )
        .bind(key.as_str())
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|row| {
            let snapshot =
                serde_json::from_str(&row.get::<String, _>("snapshot_json")).unwrap_or_default();
            (snapshot, parse_ts(&row.get::<String, _>("date_seen")))
        }))
    }

    pub async fn content_quality_count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM content_quality")
            .fetch_one(self.pool())
            .await?)
    }

    pub async fn media_quality_count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM media_quality")
            .fetch_one(self.pool())
            .await?)
    }
}
