//! Subscriber wiring.
//!
//! Writes structured JSONL logs to the service's rotating file, optionally
//! mirrored to stderr in compact form.

use crate::json_layer::JsonLayer;
use crate::rotation::RotatingFileWriter;
use crate::LogConfig;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default log directory, `~/.funtimes/logs`.
fn default_log_dir() -> io::Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".funtimes").join("logs"))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found"))
}

/// MakeWriter implementation for tracing-subscriber
#[derive(Clone)]
pub struct WriterFactory {
    writer: RotatingFileWriter,
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global subscriber described by `config`.
pub fn init_subscriber(config: &LogConfig) -> io::Result<()> {
    let log_dir = match &config.log_dir {
        Some(dir) => dir.clone(),
        None => default_log_dir()?,
    };

    let writer = RotatingFileWriter::new(&log_dir, &config.service_name, config.retain_days)?;
    let log_path = writer.active_path();
    let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory { writer });

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_ansi(true)
            .with_filter(env_filter(&config.default_level))
    });

    tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter(&config.default_level)))
        .with(stderr_layer)
        .try_init()
        .map_err(|err| io::Error::other(err.to_string()))?;

    tracing::info!(
        log_path = %log_path.display(),
        retain_days = config.retain_days,
        "observability initialized"
    );
    Ok(())
}
