//! Core error types for the bot.

use thiserror::Error;

/// Core error type for configuration and bootstrap.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Path error (e.g., home directory not found)
    #[error("Path error: {0}")]
    Path(String),

    /// The bot token environment variable is unset or empty
    #[error("Bot token not set: export {0}")]
    MissingToken(&'static str),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
