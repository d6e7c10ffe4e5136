use chrono::{DateTime, Utc};
use sqlx::Row;
use std::collections::HashSet;

use super::{Store, StoreError};

/// Rows removed by one garbage-collection sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct GcCounts {
    pub content_quality: u64,
    pub media_quality: u64,
    pub announced: u64,
    pub season_progress: u64,
    pub season_quality: u64,
}

impl GcCounts {
    pub fn total(&self) -> u64 {
        self.content_quality
            + self.media_quality
            + self.announced
            + self.season_progress
            + self.season_quality
    }
}

/// Sweeps run row-at-a-time in Rust rather than with giant `IN` clauses:
/// the ledger is small enough and this keeps each delete a short statement.
impl Store {
    /// Delete `content_quality` rows whose key is no longer in the catalog
    /// and whose last sighting predates `cutoff`.
    pub async fn gc_content_quality(
        &self,
        live_keys: &HashSet<String>,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let rows = sqlx::query("SELECT logical_key, date_seen FROM content_quality")
            .fetch_all(self.pool())
            .await?;
        let mut removed = 0u64;
        for row in rows {
            let key: String = row.get("logical_key");
            let date_seen = super::ledger::parse_ts(&row.get::<String, _>("date_seen"));
            if !live_keys.contains(&key) && date_seen < cutoff {
                sqlx::query("DELETE FROM content_quality WHERE logical_key = ?")
                    .bind(&key)
                    .execute(self.pool())
                    .await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn gc_media_quality(
        &self,
        live_item_ids: &HashSet<String>,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let rows = sqlx::query("SELECT item_id, date_seen FROM media_quality")
            .fetch_all(self.pool())
            .await?;
        let mut removed = 0u64;
        for row in rows {
            let item_id: String = row.get("item_id");
            let date_seen = super::ledger::parse_ts(&row.get::<String, _>("date_seen"));
            if !live_item_ids.contains(&item_id) && date_seen < cutoff {
                sqlx::query("DELETE FROM media_quality WHERE item_id = ?")
                    .bind(&item_id)
                    .execute(self.pool())
                    .await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn gc_announced(
        &self,
        kind: herald_models::ContentKind,
        live_keys: &HashSet<String>,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let table = match kind {
            herald_models::ContentKind::Movie => "movie_announced",
            herald_models::ContentKind::Album => "album_announced",
            herald_models::ContentKind::Book => "book_announced",
            herald_models::ContentKind::MusicVideo => "musicvideo_announced",
            _ => return Ok(0),
        };
        let rows = sqlx::query(&format!("SELECT logical_key, announced_at FROM {table}"))
            .fetch_all(self.pool())
            .await?;
        let mut removed = 0u64;
        for row in rows {
            let key: String = row.get("logical_key");
            let announced_at = super::ledger::parse_ts(&row.get::<String, _>("announced_at"));
            if !live_keys.contains(&key) && announced_at < cutoff {
                sqlx::query(&format!("DELETE FROM {table} WHERE logical_key = ?"))
                    .bind(&key)
                    .execute(self.pool())
                    .await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn gc_seasons(
        &self,
        live_season_ids: &HashSet<String>,
        cutoff: DateTime<Utc>,
    ) -> Result<(u64, u64), StoreError> {
        let mut removed_progress = 0u64;
        let rows = sqlx::query("SELECT season_id, updated_at FROM season_progress")
            .fetch_all(self.pool())
            .await?;
        for row in rows {
            let season_id: String = row.get("season_id");
            let updated_at = super::ledger::parse_ts(&row.get::<String, _>("updated_at"));
            if !live_season_ids.contains(&season_id) && updated_at < cutoff {
                sqlx::query("DELETE FROM season_progress WHERE season_id = ?")
                    .bind(&season_id)
                    .execute(self.pool())
                    .await?;
                removed_progress += 1;
            }
        }

        let mut removed_quality = 0u64;
        let rows = sqlx::query("SELECT season_id, updated_at FROM season_quality")
            .fetch_all(self.pool())
            .await?;
        for row in rows {
            let season_id: String = row.get("season_id");
            let updated_at = super::ledger::parse_ts(&row.get::<String, _>("updated_at"));
            if !live_season_ids.contains(&season_id) && updated_at < cutoff {
                sqlx::query("DELETE FROM season_quality WHERE season_id = ?")
                    .bind(&season_id)
                    .execute(self.pool())
                    .await?;
                removed_quality += 1;
            }
        }
        Ok((removed_progress, removed_quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use herald_models::{ContentKind, LogicalKey, QualitySnapshot};

    fn substantial() -> QualitySnapshot {
        QualitySnapshot {
            video_codec: Some("h264".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_gc_spares_live_and_recent_rows() {
        let store = Store::connect_in_memory().await.unwrap();
        let old = Utc::now() - Duration::days(90);
        let now = Utc::now();
        let cutoff = now - Duration::days(30);

        let live = LogicalKey::new("movie:imdb:tt1");
        let dead_old = LogicalKey::new("movie:imdb:tt2");
        let dead_recent = LogicalKey::new("movie:imdb:tt3");

        store.store_snapshot("a", &live, &substantial(), old).await.unwrap();
        store.store_snapshot("b", &dead_old, &substantial(), old).await.unwrap();
        store.store_snapshot("c", &dead_recent, &substantial(), now).await.unwrap();

        let live_keys: HashSet<String> = [live.as_str().to_string()].into_iter().collect();
        let removed = store.gc_content_quality(&live_keys, cutoff).await.unwrap();

        // Only the dead row older than the grace period goes
        assert_eq!(removed, 1);
        assert!(store.content_quality(&live).await.unwrap().is_some());
        assert!(store.content_quality(&dead_old).await.unwrap().is_none());
        assert!(store.content_quality(&dead_recent).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_gc_announced_respects_grace() {
        let store = Store::connect_in_memory().await.unwrap();
        let old = Utc::now() - Duration::days(90);
        let cutoff = Utc::now() - Duration::days(30);
        let dead = LogicalKey::new("movie:imdb:tt9");

        store
            .mark_announced(ContentKind::Movie, &dead, Some("x"), Some("Gone"), Some(1999), old)
            .await
            .unwrap();

        let removed = store
            .gc_announced(ContentKind::Movie, &HashSet::new(), cutoff)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.announced(ContentKind::Movie, &dead).await.unwrap().is_none());
    }
}
