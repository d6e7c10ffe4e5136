pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    Config, DatabaseConfig, EnrichmentConfig, GcConfig, JellyfinConfig, NotifyConfig, PollConfig,
    ServerConfig, TelegramConfig,
};
pub use credentials::CredentialStore;
pub use paths::{container_base_path, PathManager};
