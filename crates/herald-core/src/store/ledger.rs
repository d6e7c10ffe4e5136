use chrono::{DateTime, Utc};
use herald_models::{ContentKind, LogicalKey};
use sqlx::Row;

use super::{Store, StoreError};

/// Row in a per-kind `<kind>_announced` table. Presence alone means "never
/// announce this logical entity as new again".
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementRecord {
    pub logical_key: LogicalKey,
    pub item_id: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub announced_at: DateTime<Utc>,
}

/// The closed set of kinds with their own announcement ledger table.
fn announced_table(kind: ContentKind) -> Option<&'static str> {
    match kind {
        ContentKind::Movie => Some("movie_announced"),
        ContentKind::Album => Some("album_announced"),
        ContentKind::Book => Some("book_announced"),
        ContentKind::MusicVideo => Some("musicvideo_announced"),
        _ => None,
    }
}

impl Store {
    pub async fn announced(
        &self,
        kind: ContentKind,
        key: &LogicalKey,
    ) -> Result<Option<AnnouncementRecord>, StoreError> {
        let Some(table) = announced_table(kind) else {
            return Ok(None);
        };
        let row = sqlx::query(&format!(
            "SELECT logical_key, item_id, name, year, announced_at FROM {table} WHERE logical_key = ?"
        ))
        .bind(key.as_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|row| AnnouncementRecord {
            logical_key: LogicalKey::new(row.get::<String, _>("logical_key")),
            item_id: row.get("item_id"),
            name: row.get("name"),
            year: row.get("year"),
            announced_at: parse_ts(&row.get::<String, _>("announced_at")),
        }))
    }

    /// Idempotent upsert of the "already announced" fact.
    ///
    /// On conflict only display fields move, and identity fields coalesce so
    /// a later observation with partial data never erases a known item id or
    /// name. `announced_at` is written once and then left alone, so it can
    /// never move backward.
    pub async fn mark_announced(
        &self,
        kind: ContentKind,
        key: &LogicalKey,
        item_id: Option<&str>,
        name: Option<&str>,
        year: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let Some(table) = announced_table(kind) else {
            return Ok(());
        };
        sqlx::query(&format!(
            r#"
            INSERT INTO {table} (logical_key, item_id, name, year, announced_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(logical_key) DO UPDATE SET
                item_id = COALESCE(excluded.item_id, item_id),
                name = COALESCE(excluded.name, name),
                year = COALESCE(excluded.year, year)
            "#
        ))
        .bind(key.as_str())
        .bind(item_id)
        .bind(name)
        .bind(year)
        .bind(now.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn announced_count(&self, kind: ContentKind) -> Result<i64, StoreError> {
        let Some(table) = announced_table(kind) else {
            return Ok(0);
        };
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

pub(super) fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key() -> LogicalKey {
        LogicalKey::new("movie:imdb:tt1")
    }

    #[tokio::test]
    async fn test_mark_then_get() {
        let store = Store::connect_in_memory().await.unwrap();
        let now = Utc::now();
        assert!(store
            .announced(ContentKind::Movie, &key())
            .await
            .unwrap()
            .is_none());

        store
            .mark_announced(
                ContentKind::Movie,
                &key(),
                Some("item1"),
                Some("Foo"),
                Some(2020),
                now,
            )
            .await
            .unwrap();

        let record = store
            .announced(ContentKind::Movie, &key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.item_id.as_deref(), Some("item1"));
        assert_eq!(record.name.as_deref(), Some("Foo"));
        assert_eq!(record.year, Some(2020));
    }

    #[tokio::test]
    async fn test_mark_is_idempotent_and_keeps_announced_at() {
        let store = Store::connect_in_memory().await.unwrap();
        let first = Utc::now();
        store
            .mark_announced(ContentKind::Movie, &key(), Some("item1"), Some("Foo"), Some(2020), first)
            .await
            .unwrap();
        let original = store
            .announced(ContentKind::Movie, &key())
            .await
            .unwrap()
            .unwrap();

        // A later re-mark must not move announced_at backward or forward
        store
            .mark_announced(
                ContentKind::Movie,
                &key(),
                Some("item2"),
                Some("Foo"),
                Some(2020),
                first + Duration::hours(1),
            )
            .await
            .unwrap();
        let after = store
            .announced(ContentKind::Movie, &key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.announced_at, original.announced_at);
        assert_eq!(after.item_id.as_deref(), Some("item2"));
    }

    #[tokio::test]
    async fn test_null_identity_fields_do_not_erase() {
        let store = Store::connect_in_memory().await.unwrap();
        let now = Utc::now();
        store
            .mark_announced(ContentKind::Album, &key(), Some("item1"), Some("Kid A"), Some(2000), now)
            .await
            .unwrap();
        store
            .mark_announced(ContentKind::Album, &key(), None, None, None, now)
            .await
            .unwrap();

        let record = store
            .announced(ContentKind::Album, &key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.item_id.as_deref(), Some("item1"));
        assert_eq!(record.name.as_deref(), Some("Kid A"));
        assert_eq!(record.year, Some(2000));
    }

    #[tokio::test]
    async fn test_kinds_without_ledger_are_noops() {
        let store = Store::connect_in_memory().await.unwrap();
        store
            .mark_announced(ContentKind::Season, &key(), None, None, None, Utc::now())
            .await
            .unwrap();
        assert!(store
            .announced(ContentKind::Season, &key())
            .await
            .unwrap()
            .is_none());
    }
}
