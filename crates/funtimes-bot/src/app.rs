//! Startup wiring and the run loop.

use crate::discord::{Handler, SerenityPlatform};
use crate::error::BotResult;
use bot_config_and_utils::{init_logging, Config, Paths, Profile};
use reaction_role_sync::{
    CategoryRegistry, Dispatcher, DispatcherConfig, EngineConfig, RoleSyncEngine,
};
use serenity::all::{Client, GatewayIntents, Http};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub profile: Option<Profile>,
    pub log_level: Option<String>,
    pub workers: Option<usize>,
}

/// Applies overrides and re-validates.
fn resolve_config(paths: &Paths, overrides: &Overrides) -> BotResult<Config> {
    let mut config = match &overrides.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(paths)?,
    };

    if let Some(level) = &overrides.log_level {
        config.log_level = level.clone();
    }
    if let Some(registry) = &overrides.registry {
        config.registry_path = Some(registry.clone());
    }
    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }
    config.validate()?;

    Ok(config)
}

/// Runs the bot until the gateway stops or a shutdown signal arrives.
pub async fn run(overrides: Overrides) -> BotResult<()> {
    let paths = match &overrides.base_dir {
        Some(dir) => Paths::with_base_dir(dir.clone()),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;

    let config = resolve_config(&paths, &overrides)?;
    init_logging(&config.log_level, &paths.logs_dir())?;

    let registry_path = config.registry_path(&paths);
    let registry = Arc::new(CategoryRegistry::load(&registry_path)?);
    info!(
        path = %registry_path.display(),
        guild_id = %registry.guild_id(),
        categories = registry.categories().len(),
        "Registry loaded"
    );

    let profile = overrides.profile.unwrap_or_else(Profile::for_host);
    let token = profile.token()?;
    info!(%profile, "Using bot profile");

    let http = Arc::new(Http::new(&token));
    let platform = Arc::new(SerenityPlatform::new(http, registry.guild_id())?);
    let engine = Arc::new(RoleSyncEngine::new(
        registry,
        platform,
        EngineConfig {
            call_timeout: config.call_timeout(),
        },
    ));

    let dispatcher = Dispatcher::spawn(
        Arc::clone(&engine),
        DispatcherConfig {
            workers: config.workers,
            queue_capacity: config.queue_capacity,
        },
    );

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGE_REACTIONS;
    let mut client = Client::builder(&token, intents)
        .event_handler(Handler::new(dispatcher.sender(), engine))
        .await?;
    let shard_manager = Arc::clone(&client.shard_manager);

    info!(
        workers = config.workers,
        call_timeout_secs = config.call_timeout_secs,
        "Starting gateway client"
    );

    let mut gateway_error = None;
    tokio::select! {
        result = client.start() => {
            if let Err(err) = result {
                error!(error = %err, "Gateway client exited with error");
                gateway_error = Some(err);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, closing gateway...");
            shard_manager.shutdown_all().await;
        }
    }

    drop(client);
    let stats = dispatcher.shutdown().await;
    info!(
        processed = stats.processed,
        selected = stats.selected,
        deselected = stats.deselected,
        tos = stats.tos,
        ignored = stats.ignored,
        abandoned = stats.abandoned,
        failed = stats.failed,
        "Bot stopped"
    );

    match gateway_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
