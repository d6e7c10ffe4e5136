pub mod baseline;
pub mod config;
pub mod serve;
pub mod status;
pub mod sweep;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use herald_config::{Config, CredentialStore, PathManager};
use herald_sources::JellyfinClient;
use std::path::PathBuf;

/// Shared bootstrap: config file, credentials, and the media server client.
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
    pub server: JellyfinClient,
}

pub fn load_context() -> Result<AppContext> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    if !config_file.exists() {
        return Err(eyre!(
            "No configuration found at {}. Run 'herald config jellyfin' first.",
            config_file.display()
        ));
    }
    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let api_key = credentials
        .get_jellyfin_api_key()
        .ok_or_else(|| eyre!("No media server API key stored. Run 'herald config jellyfin'."))?
        .clone();
    if config.jellyfin.url.is_empty() {
        return Err(eyre!(
            "Media server URL is empty. Run 'herald config jellyfin'."
        ));
    }
    let server = JellyfinClient::new(&config.jellyfin.url, api_key);

    Ok(AppContext {
        paths,
        config,
        credentials,
        server,
    })
}

impl AppContext {
    pub fn database_path(&self) -> PathBuf {
        self.config
            .database
            .path
            .clone()
            .unwrap_or_else(|| self.paths.database_file())
    }
}
