//! Configuration management for the bot.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default deadline for a single platform call, in seconds.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;

/// Default number of dispatcher workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Default capacity of each dispatcher queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Main bot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Category registry file. Defaults to `~/.funtimes/roles.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<PathBuf>,
    /// Deadline for every outbound platform call.
    pub call_timeout_secs: u64,
    /// Dispatcher worker count.
    pub workers: usize,
    /// Dispatcher queue capacity.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            registry_path: None,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults
    /// when it does not exist.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Self::default().finish()
        }
    }

    /// Load an explicitly chosen config file, applying environment overrides
    /// and validation like [`Config::load`].
    pub fn load_from(path: &Path) -> CoreResult<Self> {
        Self::load_from_file(path)?.finish()
    }

    fn finish(mut self) -> CoreResult<Self> {
        self.load_from_env();
        self.validate()?;
        Ok(self)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("FUNTIMES_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Rejects values the dispatcher or engine cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.call_timeout_secs == 0 {
            return Err(CoreError::Config("call_timeout_secs must be positive".into()));
        }
        if self.workers == 0 {
            return Err(CoreError::Config("workers must be positive".into()));
        }
        if self.queue_capacity == 0 {
            return Err(CoreError::Config("queue_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Registry file to load: the configured path or the default location.
    pub fn registry_path(&self, paths: &Paths) -> PathBuf {
        self.registry_path
            .clone()
            .unwrap_or_else(|| paths.registry_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
        assert_eq!(config.workers, 8);
        assert_eq!(config.queue_capacity, 1024);
        assert!(config.registry_path.is_none());
    }

    #[test]
    fn test_config_load_partial_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let config_json = r#"{
            "log_level": "debug",
            "workers": 2
        }"#;
        std::fs::write(&config_path, config_json).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.workers, 2);
        assert_eq!(config.call_timeout_secs, DEFAULT_CALL_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            registry_path: Some(PathBuf::from("/etc/funtimes/roles.json")),
            queue_capacity: 16,
            ..Config::default()
        };
        std::fs::write(paths.config_file(), serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_config_rejects_zero_values() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        std::fs::write(paths.config_file(), r#"{ "workers": 0 }"#).unwrap();

        assert!(matches!(Config::load(&paths), Err(CoreError::Config(_))));

        let config = Config {
            call_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_registry_path_falls_back_to_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/srv/funtimes"));
        let mut config = Config::default();
        assert_eq!(
            config.registry_path(&paths),
            PathBuf::from("/srv/funtimes/roles.json")
        );

        config.registry_path = Some(PathBuf::from("custom.json"));
        assert_eq!(config.registry_path(&paths), PathBuf::from("custom.json"));
    }
}
