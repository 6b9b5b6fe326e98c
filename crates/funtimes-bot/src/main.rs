//! FunTimes bot entry point.
//!
//! Usage: funtimes-bot [--profile main|beta] [--registry <path>]
//!
//! The token is read from `BOT_TOKEN_MAIN` or `BOT_TOKEN_BETA` depending on
//! the profile. Without `--profile`, Linux hosts run as main.

mod app;
mod discord;
mod error;

use app::Overrides;
use bot_config_and_utils::Profile;
use clap::Parser;
use error::BotResult;
use std::path::PathBuf;

/// FunTimes bot: reaction-selected roles, one per category.
#[derive(Parser, Debug)]
#[command(name = "funtimes-bot")]
#[command(about = "Keeps reaction-selected roles exclusive per category")]
struct Args {
    /// Base directory for config, registry and logs (default: ~/.funtimes).
    #[arg(long, env = "FUNTIMES_HOME")]
    base_dir: Option<PathBuf>,

    /// Config file to load instead of <base-dir>/config.json.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Category registry file.
    #[arg(long, env = "FUNTIMES_REGISTRY")]
    registry: Option<PathBuf>,

    /// Bot application to log in as (main, beta).
    #[arg(long, env = "FUNTIMES_PROFILE")]
    profile: Option<Profile>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Number of dispatcher workers.
    #[arg(long)]
    workers: Option<usize>,
}

impl From<Args> for Overrides {
    fn from(args: Args) -> Self {
        Self {
            base_dir: args.base_dir,
            config: args.config,
            registry: args.registry,
            profile: args.profile,
            log_level: args.log_level,
            workers: args.workers,
        }
    }
}

#[tokio::main]
async fn main() -> BotResult<()> {
    let args = Args::parse();
    app::run(args.into()).await
}
