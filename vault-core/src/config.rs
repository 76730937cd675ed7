//! Configuration for the vault ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Notification configuration
    pub notification: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/vault-ledger"),
            service_name: "vault-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            rocksdb: RocksDbConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 128,
            max_write_buffer_number: 4,
            max_background_jobs: 4,
            enable_statistics: false,
        }
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Broadcast channel capacity; slow subscribers lose oldest events
    pub buffer_size: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { buffer_size: 1024 }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("VAULT_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(buffer) = std::env::var("VAULT_NOTIFY_BUFFER") {
            config.notification.buffer_size = buffer
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid VAULT_NOTIFY_BUFFER: {}", buffer)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "vault-core");
        assert_eq!(config.notification.buffer_size, 1024);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            data_dir = "/tmp/vault"
            service_name = "vault-core"
            service_version = "0.1.0"

            [rocksdb]
            write_buffer_size_mb = 64
            max_write_buffer_number = 2
            max_background_jobs = 2
            enable_statistics = true

            [notification]
            buffer_size = 256
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.rocksdb.write_buffer_size_mb, 64);
        assert_eq!(config.notification.buffer_size, 256);
    }
}
