//! Deployment profile and bot token selection.
//!
//! The production bot runs on a Linux host with the main token. Runs on any
//! other OS default to the beta application.

use crate::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// Which bot application to log in as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Main,
    Beta,
}

impl Profile {
    /// `Main` on Linux hosts, `Beta` everywhere else.
    pub fn for_host() -> Self {
        if cfg!(target_os = "linux") {
            Profile::Main
        } else {
            Profile::Beta
        }
    }

    /// Environment variable holding this profile's token.
    pub fn token_var(self) -> &'static str {
        match self {
            Profile::Main => "BOT_TOKEN_MAIN",
            Profile::Beta => "BOT_TOKEN_BETA",
        }
    }

    /// Reads this profile's token from the environment.
    pub fn token(self) -> CoreResult<String> {
        self.token_from(|name| std::env::var(name).ok())
    }

    fn token_from(self, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<String> {
        lookup(self.token_var())
            .map(|raw| raw.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(CoreError::MissingToken(self.token_var()))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Main => f.write_str("main"),
            Profile::Beta => f.write_str("beta"),
        }
    }
}

impl FromStr for Profile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "prod" | "production" => Ok(Profile::Main),
            "beta" | "dev" => Ok(Profile::Beta),
            other => Err(CoreError::Config(format!("unknown profile '{other}'"))),
        }
    }
}
