//! Configuration loading.

pub mod file;

pub use file::FileConfig;

use std::net::SocketAddr;
use std::path::Path;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Load the configuration file, falling back to defaults when the file
/// does not exist. An explicit listen override (from the CLI) wins over
/// the file value.
pub fn load(path: &Path, listen_override: Option<SocketAddr>) -> Result<FileConfig, ConfigError> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)?
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        FileConfig::default()
    };

    if let Some(listen) = listen_override {
        config.server.listen = listen;
    }
    Ok(config)
}

/// The database URL comes from the environment, never from the file.
pub fn database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
