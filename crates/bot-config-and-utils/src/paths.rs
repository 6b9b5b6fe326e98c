//! File system paths for the bot.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Default registry filename under the base directory.
const REGISTRY_FILE_NAME: &str = "roles.json";

/// Manages file system paths for the bot.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.funtimes)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.funtimes`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".funtimes"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.funtimes).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.funtimes/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the default registry file path (~/.funtimes/roles.json).
    pub fn registry_file(&self) -> PathBuf {
        self.base_dir.join(REGISTRY_FILE_NAME)
    }

    /// Get the logs directory (~/.funtimes/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
