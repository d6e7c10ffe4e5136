use chrono::{DateTime, Utc};

use super::{Store, StoreError};

const DB_CREATED_AT: &str = "db_created_at";

impl Store {
    pub async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM app_meta WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;
        Ok(value)
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO app_meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// When this ledger database first existed. Initialized exactly once; the
    /// pre-ledger cutoff compares candidate creation timestamps against it so
    /// a first deployment never floods notifications for historical content.
    pub async fn db_created_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, StoreError> {
        // Insert-if-absent first so concurrent callers agree on one value
        sqlx::query(
            r#"
            INSERT INTO app_meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO NOTHING
            "#,
        )
        .bind(DB_CREATED_AT)
        .bind(now.to_rfc3339())
        .execute(self.pool())
        .await?;

        let raw: String = sqlx::query_scalar("SELECT value FROM app_meta WHERE key = ?")
            .bind(DB_CREATED_AT)
            .fetch_one(self.pool())
            .await?;
        Ok(DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now))
    }
}
