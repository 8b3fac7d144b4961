//! Configuration loading from rfidlog.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Where the log lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inbound event handling.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Storage configuration.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// How long a request waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Deserialize)]
pub struct IngestConfig {
    /// Seconds subtracted from the arrival time of every event.
    ///
    /// Compensates for the delay between the tag being read and the reader
    /// reporting it.
    #[serde(default = "default_clock_offset_secs")]
    pub clock_offset_secs: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            clock_offset_secs: default_clock_offset_secs(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0:8080".
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("logs.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_clock_offset_secs() -> u32 {
    3
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    pub fn clock_offset(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.ingest.clock_offset_secs))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.storage.path, PathBuf::from("logs.db"));
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.clock_offset(), TimeDelta::seconds(3));
        assert_eq!(config.server.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[storage]
path = "/data/logs.db"

[ingest]
clock_offset_secs = 10

[server]
listen = "127.0.0.1:80"
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.storage.path, PathBuf::from("/data/logs.db"));
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.clock_offset(), TimeDelta::seconds(10));
        assert_eq!(config.server.listen, "127.0.0.1:80");
    }

    #[test]
    fn test_rejects_negative_offset() {
        let toml = "[ingest]\nclock_offset_secs = -3\n";
        assert!(matches!(Config::parse(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("rfidlog.toml")).unwrap();
        assert_eq!(config.ingest.clock_offset_secs, 3);
    }
}
