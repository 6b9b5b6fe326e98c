//! # Observability
//!
//! Centralized logging layer for the FunTimes bot.
//!
//! ## Design Philosophy
//!
//! Services are **log producers**, not log consumers. They call
//! `observability::init_with_config()` once at startup and use standard `tracing` macros
//! throughout their code. They have zero knowledge of where logs go or how
//! they are rotated.
//!
//! ## Output
//!
//! Every service writes structured JSONL to `<log_dir>/<service>.jsonl`
//! (`~/.funtimes/logs` by default). At local midnight the file is renamed to
//! `<service>-YYYY-MM-DD.jsonl` and a fresh one is started; only the newest
//! `retain_days` dated files are kept.
//!
//! - `tail -f ~/.funtimes/logs/funtimes-bot.jsonl | jq` for pretty JSON
//! - `lnav ~/.funtimes/logs/` for interactive exploration
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() -> std::io::Result<()> {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "funtimes-bot".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     })?;
//!
//!     tracing::info!("service started");
//!     Ok(())
//! }
//! ```

mod json_layer;
mod rotation;
mod sink;

use std::path::PathBuf;

pub use json_layer::{JsonLayer, LogEntry};
pub use rotation::RotatingFileWriter;

/// Dated log files kept by default (one year).
pub const DEFAULT_RETAIN_DAYS: usize = 365;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "funtimes-bot").
    /// Included in every log line and used as the log file stem.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log directory.
    /// Defaults to `~/.funtimes/logs`.
    pub log_dir: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,

    /// Number of rotated daily files to keep. `0` keeps all of them.
    pub retain_days: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_dir: None,
            also_stderr: false,
            retain_days: DEFAULT_RETAIN_DAYS,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Fails if the log directory cannot be created, the log file cannot be
/// opened, or a global subscriber is already installed.
pub fn init_with_config(config: LogConfig) -> std::io::Result<()> {
    sink::init_subscriber(&config)
}
