use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    pub jellyfin: JellyfinConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub gc: GcConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct JellyfinConfig {
    /// Base URL of the media server, e.g. "http://jellyfin:8096".
    pub url: String,
    // The API key lives in the credential store, not here.
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct TelegramConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub chat_id: Option<String>,
    // The bot token lives in the credential store, not here.
}

/// Optional third-party lookups folded into notifications. Each one is
/// skipped when its key is absent; a failed lookup never blocks delivery.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct EnrichmentConfig {
    pub mdblist_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
    pub tmdb_api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollConfig {
    #[serde(default = "default_movie_interval_minutes")]
    pub movie_interval_minutes: u64,
    #[serde(default = "default_series_interval_minutes")]
    pub series_interval_minutes: u64,
    #[serde(default = "default_episode_quality_interval_minutes")]
    pub episode_quality_interval_minutes: u64,
    #[serde(default = "default_music_interval_minutes")]
    pub album_interval_minutes: u64,
    #[serde(default = "default_music_interval_minutes")]
    pub book_interval_minutes: u64,
    #[serde(default = "default_music_interval_minutes")]
    pub music_video_interval_minutes: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Items younger than this are left to the webhook path; the pollers
    /// skip them so a file still being parsed is not fingerprinted early.
    #[serde(default = "default_new_item_grace_minutes")]
    pub new_item_grace_minutes: i64,

    /// Advisory gate: wait at cycle start while the server reports a
    /// library scan in progress.
    #[serde(default = "default_true")]
    pub wait_for_scan_idle: bool,
    /// Cap on the scan-idle wait; 0 means wait forever.
    #[serde(default = "default_scan_idle_timeout_minutes")]
    pub scan_idle_timeout_minutes: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            movie_interval_minutes: default_movie_interval_minutes(),
            series_interval_minutes: default_series_interval_minutes(),
            episode_quality_interval_minutes: default_episode_quality_interval_minutes(),
            album_interval_minutes: default_music_interval_minutes(),
            book_interval_minutes: default_music_interval_minutes(),
            music_video_interval_minutes: default_music_interval_minutes(),
            page_size: default_page_size(),
            new_item_grace_minutes: default_new_item_grace_minutes(),
            wait_for_scan_idle: default_true(),
            scan_idle_timeout_minutes: default_scan_idle_timeout_minutes(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotifyConfig {
    /// Rolling window during which a webhook "new item" is suppressed after
    /// a quality-update notification for the same logical key.
    #[serde(default = "default_suppression_window_minutes")]
    pub suppression_window_minutes: i64,

    /// Announce a season the first time it is ever seen, instead of waiting
    /// for the next net episode increase.
    #[serde(default)]
    pub season_announce_on_first_sight: bool,

    /// Episodes are only announced when they premiered within this window.
    #[serde(default = "default_episode_premiered_within_days")]
    pub episode_premiered_within_days: i64,
    /// ...and their season was not itself added within this window (the
    /// season path already covers a season-sized drop).
    #[serde(default = "default_season_added_within_days")]
    pub season_added_within_days: i64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            suppression_window_minutes: default_suppression_window_minutes(),
            season_announce_on_first_sight: false,
            episode_premiered_within_days: default_episode_premiered_within_days(),
            season_added_within_days: default_season_added_within_days(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GcConfig {
    /// Ledger rows whose content no longer exists in the catalog are removed
    /// once older than this.
    #[serde(default = "default_gc_grace_days")]
    pub grace_days: i64,
    #[serde(default = "default_gc_interval_hours")]
    pub interval_hours: u64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            grace_days: default_gc_grace_days(),
            interval_hours: default_gc_interval_hours(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Overrides the PathManager default of `<data_dir>/herald.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_movie_interval_minutes() -> u64 {
    15
}

fn default_series_interval_minutes() -> u64 {
    15
}

fn default_episode_quality_interval_minutes() -> u64 {
    60
}

fn default_music_interval_minutes() -> u64 {
    30
}

fn default_page_size() -> u32 {
    200
}

fn default_new_item_grace_minutes() -> i64 {
    10
}

fn default_scan_idle_timeout_minutes() -> u64 {
    0
}

fn default_suppression_window_minutes() -> i64 {
    30
}

fn default_episode_premiered_within_days() -> i64 {
    14
}

fn default_season_added_within_days() -> i64 {
    3
}

fn default_gc_grace_days() -> i64 {
    30
}

fn default_gc_interval_hours() -> u64 {
    24
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [jellyfin]
            url = "http://jellyfin:8096"
            "#,
        )
        .unwrap();
        assert_eq!(config.jellyfin.url, "http://jellyfin:8096");
        assert_eq!(config.poll.movie_interval_minutes, 15);
        assert_eq!(config.poll.page_size, 200);
        assert_eq!(config.notify.suppression_window_minutes, 30);
        assert!(!config.notify.season_announce_on_first_sight);
        assert_eq!(config.gc.grace_days, 30);
        assert_eq!(config.server.bind, "0.0.0.0:5000");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.jellyfin.url = "http://localhost:8096".to_string();
        config.telegram.chat_id = Some("-100123".to_string());
        config.poll.page_size = 50;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.jellyfin.url, "http://localhost:8096");
        assert_eq!(loaded.telegram.chat_id.as_deref(), Some("-100123"));
        assert_eq!(loaded.poll.page_size, 50);
    }
}
