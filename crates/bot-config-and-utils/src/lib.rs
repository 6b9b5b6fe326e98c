//! Configuration, paths and process bootstrap for the FunTimes bot.

mod config;
mod error;
mod logging;
mod paths;
mod profile;

pub use config::{
    Config, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_LOG_LEVEL, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
pub use profile::Profile;
