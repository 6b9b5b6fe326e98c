//! Logging initialization for the bot.
//!
//! Thin wrapper over the observability crate: structured JSONL written to
//! `<logs_dir>/<service>.jsonl`, rotated daily, mirrored to stderr.

use crate::CoreResult;
use observability::{LogConfig, DEFAULT_RETAIN_DAYS};
use std::path::Path;

/// Service name written into every log line; also the log file stem.
const SERVICE_NAME: &str = "funtimes-bot";

/// Initialize the logging system for the bot.
///
/// `level` is the default filter; `RUST_LOG` takes precedence when set.
pub fn init_logging(level: &str, logs_dir: &Path) -> CoreResult<()> {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_dir: Some(logs_dir.to_path_buf()),
        also_stderr: true,
        retain_days: parse_retain_env("FUNTIMES_LOG_RETAIN_DAYS", DEFAULT_RETAIN_DAYS),
    })?;
    Ok(())
}

fn non_empty_env(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_retain_env(name: &str, fallback: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(non_empty_env)
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(fallback)
}
