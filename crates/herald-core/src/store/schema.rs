use sqlx::SqlitePool;

use super::StoreError;

/// Idempotent schema creation. Every table keys on the identity its writers
/// upsert against, which is what turns concurrent duplicate inserts into
/// harmless conflict-updates.
pub(super) async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS app_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_quality (
            logical_key TEXT PRIMARY KEY,
            item_id TEXT,
            name TEXT,
            year INTEGER,
            snapshot_json TEXT NOT NULL,
            signature TEXT NOT NULL,
            date_seen TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_quality (
            item_id TEXT PRIMARY KEY,
            logical_key TEXT NOT NULL,
            snapshot_json TEXT NOT NULL,
            signature TEXT NOT NULL,
            date_seen TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for table in [
        "movie_announced",
        "album_announced",
        "book_announced",
        "musicvideo_announced",
    ] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                logical_key TEXT PRIMARY KEY,
                item_id TEXT,
                name TEXT,
                year INTEGER,
                announced_at TEXT NOT NULL
            )
            "#
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS season_progress (
            season_id TEXT PRIMARY KEY,
            series_id TEXT,
            series_name TEXT,
            season_number INTEGER,
            year INTEGER,
            present INTEGER NOT NULL DEFAULT 0,
            total INTEGER NOT NULL DEFAULT 0,
            last_notified_present INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS season_quality (
            season_id TEXT PRIMARY KEY,
            signature TEXT NOT NULL,
            episode_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recent_quality_updates (
            logical_key TEXT PRIMARY KEY,
            item_id TEXT,
            notified_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_media_quality_logical_key ON media_quality(logical_key)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_content_quality_date_seen ON content_quality(date_seen)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
