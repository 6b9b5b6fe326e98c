//! Error types for the bot binary.

use bot_config_and_utils::CoreError;
use reaction_role_sync::{PlatformError, RegistryError};
use thiserror::Error;

/// Startup and gateway failures. Per-event failures never surface here.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration, paths, logging or token lookup
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Category registry could not be loaded
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Platform adapter could not be built
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Gateway client failure
    #[error("Gateway error: {0}")]
    Gateway(#[from] serenity::Error),
}

/// Result type for the bot binary.
pub type BotResult<T> = Result<T, BotError>;
