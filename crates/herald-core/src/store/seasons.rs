use chrono::{DateTime, Utc};
use sqlx::Row;

use super::ledger::parse_ts;
use super::{Store, StoreError};

/// Persisted fill state of one season.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonProgressRecord {
    pub season_id: String,
    pub series_id: Option<String>,
    pub series_name: Option<String>,
    pub season_number: Option<i32>,
    pub year: Option<i32>,
    pub present: i64,
    pub total: i64,
    pub last_notified_present: i64,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub async fn season_progress(
        &self,
        season_id: &str,
    ) -> Result<Option<SeasonProgressRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT season_id, series_id, series_name, season_number, year,
                   present, total, last_notified_present, updated_at
            FROM season_progress WHERE season_id = ?
            "#,
        )
        .bind(season_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|row| SeasonProgressRecord {
            season_id: row.get("season_id"),
            series_id: row.get("series_id"),
            series_name: row.get("series_name"),
            season_number: row.get("season_number"),
            year: row.get("year"),
            present: row.get("present"),
            total: row.get("total"),
            last_notified_present: row.get("last_notified_present"),
            updated_at: parse_ts(&row.get::<String, _>("updated_at")),
        }))
    }

    /// Decide whether a season's current fill warrants a notification.
    ///
    /// True when `present_now` strictly exceeds the highest present count a
    /// notification was ever recorded for, or (policy permitting) when the
    /// season has never been seen at all.
    pub async fn should_notify_season(
        &self,
        season_id: &str,
        present_now: i64,
        announce_on_first_sight: bool,
    ) -> Result<bool, StoreError> {
        if present_now <= 0 {
            return Ok(false);
        }
        match self.season_progress(season_id).await? {
            None => Ok(announce_on_first_sight),
            Some(record) => Ok(present_now > record.last_notified_present),
        }
    }

    /// Conditional upsert of a season's fill state.
    ///
    /// Writes only happen when `present`, `total`, or (with `mark_notified`)
    /// the notified watermark actually changed, so high-frequency polling of
    /// a static season does not churn timestamps. `last_notified_present` is
    /// monotonic: it only ever moves up.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_season_progress(
        &self,
        season_id: &str,
        series_id: Option<&str>,
        series_name: Option<&str>,
        season_number: Option<i32>,
        year: Option<i32>,
        present: i64,
        total: i64,
        mark_notified: bool,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(existing) = self.season_progress(season_id).await? {
            let watermark_would_move =
                mark_notified && present > existing.last_notified_present;
            if existing.present == present && existing.total == total && !watermark_would_move {
                return Ok(());
            }
        }

        sqlx::query(
            r#"
            INSERT INTO season_progress
                (season_id, series_id, series_name, season_number, year,
                 present, total, last_notified_present, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(season_id) DO UPDATE SET
                series_id = COALESCE(excluded.series_id, series_id),
                series_name = COALESCE(excluded.series_name, series_name),
                season_number = COALESCE(excluded.season_number, season_number),
                year = COALESCE(excluded.year, year),
                present = excluded.present,
                total = excluded.total,
                last_notified_present =
                    MAX(last_notified_present, excluded.last_notified_present),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(season_id)
        .bind(series_id)
        .bind(series_name)
        .bind(season_number)
        .bind(year)
        .bind(present)
        .bind(total)
        .bind(if mark_notified { present } else { 0 })
        .bind(now.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn season_progress_count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM season_progress")
            .fetch_one(self.pool())
            .await?)
    }

    /// Aggregate quality signature across a season's available episodes.
    pub async fn season_quality(
        &self,
        season_id: &str,
    ) -> Result<Option<(String, i64)>, StoreError> {
        let row =
            sqlx::query("SELECT signature, episode_count FROM season_quality WHERE season_id = ?")
                .bind(season_id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|row| (row.get("signature"), row.get("episode_count"))))
    }

    pub async fn upsert_season_quality(
        &self,
        season_id: &str,
        signature: &str,
        episode_count: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO season_quality (season_id, signature, episode_count, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(season_id) DO UPDATE SET
                signature = excluded.signature,
                episode_count = excluded.episode_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(season_id)
        .bind(signature)
        .bind(episode_count)
        .bind(now.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn observe(
        store: &Store,
        present: i64,
        total: i64,
        mark_notified: bool,
    ) {
        store
            .upsert_season_progress(
                "season1",
                Some("series1"),
                Some("Foo"),
                Some(1),
                Some(2020),
                present,
                total,
                mark_notified,
                Utc::now(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_monotonic_notification_watermark() {
        let store = Store::connect_in_memory().await.unwrap();

        // 0/10: nothing to announce
        assert!(!store.should_notify_season("season1", 0, false).await.unwrap());
        observe(&store, 0, 10, false).await;

        // 3/10: net increase
        assert!(store.should_notify_season("season1", 3, false).await.unwrap());
        observe(&store, 3, 10, true).await;

        // 3/10 again: unchanged, no re-announcement
        assert!(!store.should_notify_season("season1", 3, false).await.unwrap());
        observe(&store, 3, 10, false).await;

        // 7/10: next net increase
        assert!(store.should_notify_season("season1", 7, false).await.unwrap());
        observe(&store, 7, 10, true).await;

        let record = store.season_progress("season1").await.unwrap().unwrap();
        assert_eq!(record.last_notified_present, 7);
    }

    #[tokio::test]
    async fn test_watermark_never_decreases() {
        let store = Store::connect_in_memory().await.unwrap();
        observe(&store, 7, 10, true).await;

        // An out-of-order lower observation must not lower the watermark
        observe(&store, 3, 10, true).await;
        let record = store.season_progress("season1").await.unwrap().unwrap();
        assert_eq!(record.last_notified_present, 7);
        assert!(!store.should_notify_season("season1", 7, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_first_sight_policy() {
        let store = Store::connect_in_memory().await.unwrap();
        assert!(!store.should_notify_season("season1", 3, false).await.unwrap());
        assert!(store.should_notify_season("season1", 3, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_unchanged_observation_skips_write() {
        let store = Store::connect_in_memory().await.unwrap();
        observe(&store, 3, 10, false).await;
        let before = store.season_progress("season1").await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        observe(&store, 3, 10, false).await;
        let after = store.season_progress("season1").await.unwrap().unwrap();
        assert_eq!(before.updated_at, after.updated_at);
    }

    #[tokio::test]
    async fn test_season_quality_round_trip() {
        let store = Store::connect_in_memory().await.unwrap();
        assert!(store.season_quality("season1").await.unwrap().is_none());
        store
            .upsert_season_quality("season1", "sig-a", 8, Utc::now())
            .await
            .unwrap();
        assert_eq!(
            store.season_quality("season1").await.unwrap(),
            Some(("sig-a".to_string(), 8))
        );
    }
}
