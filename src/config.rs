//! Configuration loading and management
//!
//! Handles parsing of `config.toml` in the data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::filter::FilterMode;
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Alarm checker configuration
    #[serde(default)]
    pub alarms: AlarmConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How long to wait for another process holding a key file
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Seconds between alarm scans
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
}

fn default_scan_interval_secs() -> u64 {
    60
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval_secs(),
        }
    }
}

impl AlarmConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Due time prefilled when scheduling without an explicit time (`HH:MM`)
    #[serde(default = "default_due_time")]
    pub default_due_time: String,

    /// Filter used by `list` when none is given
    #[serde(default = "default_filter")]
    pub default_filter: String,
}

fn default_due_time() -> String {
    "09:00".to_string()
}

fn default_filter() -> String {
    "all".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_due_time: default_due_time(),
            default_filter: default_filter(),
        }
    }
}

impl TasksConfig {
    pub fn due_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.default_due_time.trim(), "%H:%M").map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_due_time must be HH:MM, got '{}'",
                self.default_due_time
            ))
        })
    }

    pub fn filter(&self) -> Result<FilterMode> {
        self.default_filter.parse().map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_filter must be all, active or completed, got '{}'",
                self.default_filter
            ))
        })
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.toml` from the data directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.alarms.scan_interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "alarms.scan_interval_secs must be greater than 0".to_string(),
            ));
        }
        self.tasks.due_time()?;
        self.tasks.filter()?;
        Ok(())
    }
}

/// Platform data directory, or `.todo-alarm` under the working directory
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "todo-alarm")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".todo-alarm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.alarms.scan_interval(), Duration::from_secs(60));
        assert_eq!(
            config.tasks.due_time().unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(config.tasks.filter().unwrap(), FilterMode::All);
        assert_eq!(config.storage.lock_timeout_ms, DEFAULT_LOCK_TIMEOUT_MS);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[storage]
lock_timeout_ms = 250

[alarms]
scan_interval_secs = 15

[tasks]
default_due_time = "07:45"
default_filter = "active"
"#;
        std::fs::write(&path, content).expect("write config");

        let config = Config::load(&path).expect("load");
        assert_eq!(config.storage.lock_timeout_ms, 250);
        assert_eq!(config.alarms.scan_interval_secs, 15);
        assert_eq!(
            config.tasks.due_time().unwrap(),
            NaiveTime::from_hms_opt(7, 45, 0).unwrap()
        );
        assert_eq!(config.tasks.filter().unwrap(), FilterMode::Active);
    }

    #[test]
    fn load_rejects_zero_interval() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[alarms]\nscan_interval_secs = 0\n").expect("write config");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn load_rejects_bad_due_time() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[tasks]\ndefault_due_time = \"9am\"\n").expect("write config");

        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));
    }
}
