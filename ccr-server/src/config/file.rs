//! TOML file configuration structures.
//!
//! These structs map directly to the `ccr-config.toml` file format.
//! Every field is defaulted so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub partitions: PartitionsConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Materialized-view refresh scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between blocking refresh-all passes.
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,
    /// Seconds between non-blocking (concurrent) refresh passes.
    #[serde(default = "default_nightly_interval_secs")]
    pub nightly_interval_secs: u64,
    /// Seconds between refresh-log cleanup passes.
    #[serde(default = "default_nightly_interval_secs")]
    pub log_cleanup_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval_secs(),
            nightly_interval_secs: default_nightly_interval_secs(),
            log_cleanup_interval_secs: default_nightly_interval_secs(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    60 * 60
}

fn default_nightly_interval_secs() -> u64 {
    24 * 60 * 60
}

/// Partition lifecycle scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionsConfig {
    /// Seconds between partition maintenance passes.
    #[serde(default = "default_partition_interval_secs")]
    pub interval_secs: u64,
    /// Months of partitions kept provisioned beyond today.
    #[serde(default = "default_create_ahead_months")]
    pub create_ahead_months: i32,
}

impl Default for PartitionsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_partition_interval_secs(),
            create_ahead_months: default_create_ahead_months(),
        }
    }
}

fn default_partition_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_create_ahead_months() -> i32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.refresh.interval_secs, 3600);
        assert_eq!(config.partitions.create_ahead_months, 3);
    }

    #[test]
    fn sections_override_independently() {
        let config: FileConfig = toml::from_str(
            r#"
            [refresh]
            interval_secs = 900

            [partitions]
            create_ahead_months = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh.interval_secs, 900);
        assert_eq!(config.refresh.nightly_interval_secs, 86400);
        assert_eq!(config.partitions.create_ahead_months, 6);
        assert_eq!(config.server.listen.port(), 8080);
    }
}
