use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::Input;
use herald_config::{Config, CredentialStore, PathManager};

use crate::output::Output;

fn load_or_default(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
    } else {
        Ok(Config::default())
    }
}

fn mask(value: Option<&String>) -> String {
    match value {
        Some(v) if v.len() > 4 => format!("{}****", &v[..4]),
        Some(_) => "****".to_string(),
        None => "(not set)".to_string(),
    }
}

pub fn run_show(out: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config = load_or_default(&paths)?;
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    out.println(format!("Config file: {}", paths.config_file().display()));
    out.println(format!(
        "Media server: {}",
        if config.jellyfin.url.is_empty() {
            "(not set)".to_string()
        } else {
            config.jellyfin.url.clone()
        }
    ));
    out.println(format!(
        "Media server API key: {}",
        mask(credentials.get_jellyfin_api_key())
    ));
    out.println(format!(
        "Telegram: enabled={} chat_id={} token={}",
        config.telegram.enabled,
        config.telegram.chat_id.as_deref().unwrap_or("(not set)"),
        mask(credentials.get_telegram_bot_token())
    ));
    out.println(format!(
        "Enrichment: mdblist={} youtube={} tmdb={}",
        config.enrichment.mdblist_api_key.is_some(),
        config.enrichment.youtube_api_key.is_some(),
        config.enrichment.tmdb_api_key.is_some()
    ));
    out.println(format!(
        "Suppression window: {} minutes",
        config.notify.suppression_window_minutes
    ));
    Ok(())
}

pub fn run_jellyfin(url: Option<String>, out: &Output) -> Result<()> {
    let paths = PathManager::default();
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create config directories: {}", e))?;
    let mut config = load_or_default(&paths)?;

    let url = match url {
        Some(url) => url,
        None => Input::new()
            .with_prompt("Media server base URL (e.g. http://jellyfin:8096)")
            .interact_text()?,
    };
    let api_key = rpassword::prompt_password("Media server API key: ")?;

    config.jellyfin.url = url.trim_end_matches('/').to_string();
    config
        .save_to_file(&paths.config_file())
        .map_err(|e| eyre!("Failed to save config: {}", e))?;

    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    credentials.set_jellyfin_api_key(api_key.trim().to_string());
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    out.success("Media server configured");
    Ok(())
}

pub fn run_telegram(chat_id: Option<String>, out: &Output) -> Result<()> {
    let paths = PathManager::default();
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create config directories: {}", e))?;
    let mut config = load_or_default(&paths)?;

    let chat_id = match chat_id {
        Some(chat_id) => chat_id,
        None => Input::new()
            .with_prompt("Telegram chat id (e.g. -1001234567890)")
            .interact_text()?,
    };
    let token = rpassword::prompt_password("Telegram bot token: ")?;

    config.telegram.enabled = true;
    config.telegram.chat_id = Some(chat_id.trim().to_string());
    config
        .save_to_file(&paths.config_file())
        .map_err(|e| eyre!("Failed to save config: {}", e))?;

    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    credentials.set_telegram_bot_token(token.trim().to_string());
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    out.success("Telegram transport configured");
    Ok(())
}
