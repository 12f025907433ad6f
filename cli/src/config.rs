//! Application configuration.
//!
//! Loaded from a TOML file when one is given; CLI flags and `PEMILU_*`
//! environment variables override file values field by field.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pemilu_utils::LogFormat;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncSection {
    /// Master switch; the endpoint is ignored while this is off.
    #[serde(default)]
    pub enabled: bool,

    /// Full URL of the echo endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Seconds between periodic pushes.
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./pemilu_data")
}

fn default_map_size_mb() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sync_interval_secs() -> u64 {
    10
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("AppConfig is always serializable to TOML")
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb * 1024 * 1024
    }

    /// The endpoint to push to, or `None` when sync is switched off.
    pub fn sync_endpoint(&self) -> Option<&str> {
        if self.sync.enabled {
            self.sync.endpoint.as_deref()
        } else {
            None
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            sync: SyncSection::default(),
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            interval_secs: default_sync_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = AppConfig::from_toml_str("").expect("parse");
        assert_eq!(config.data_dir, PathBuf::from("./pemilu_data"));
        assert_eq!(config.map_size_mb, 64);
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(!config.sync.enabled);
        assert!(config.sync_endpoint().is_none());
    }

    #[test]
    fn full_toml_round_trips() {
        let toml = r#"
data_dir = "/var/lib/pemilu"
map_size_mb = 128
log_format = "json"
log_level = "debug"

[sync]
enabled = true
endpoint = "https://dashboard.example/api/sync-vote"
interval_secs = 30
"#;
        let config = AppConfig::from_toml_str(toml).expect("parse");
        assert_eq!(config.map_size_bytes(), 128 * 1024 * 1024);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.sync_endpoint(),
            Some("https://dashboard.example/api/sync-vote")
        );
        assert_eq!(config.sync_interval(), Duration::from_secs(30));

        let reparsed = AppConfig::from_toml_str(&config.to_toml_string()).expect("reparse");
        assert_eq!(reparsed.data_dir, config.data_dir);
        assert_eq!(reparsed.sync.endpoint, config.sync.endpoint);
    }

    #[test]
    fn disabled_sync_hides_the_endpoint() {
        let toml = r#"
[sync]
enabled = false
endpoint = "https://dashboard.example/api/sync-vote"
"#;
        let config = AppConfig::from_toml_str(toml).expect("parse");
        assert!(config.sync_endpoint().is_none());
    }

    #[test]
    fn sync_interval_has_a_floor_of_one_second() {
        let config = AppConfig::from_toml_str("[sync]\ninterval_secs = 0\n").expect("parse");
        assert_eq!(config.sync_interval(), Duration::from_secs(1));
    }
}
