//! Gateway event handler.
//!
//! Translates reaction notifications into engine events and hands them to
//! the dispatcher. No role logic runs here.

use super::conversions::emoji_key;
use reaction_role_sync::{
    ChannelId, EventSender, GuildId, MessageId, ReactionEvent, ReactionKind, RoleSyncEngine,
    UserId,
};
use serenity::all::{Context, EventHandler, Reaction, ReactionType, Ready};
use serenity::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

/// Why a gateway reaction was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    /// Direct-message reaction.
    NoGuild,
    /// The gateway did not say who reacted.
    NoUser,
    /// A reaction placed or removed by the bot user. Removals the bot makes
    /// on a member's reaction carry the member's id and are forwarded; the
    /// engine absorbs them as ordinary removals.
    OwnReaction,
    /// An emoji kind the registry cannot name.
    UnsupportedEmoji,
}

/// Fields of a gateway reaction the engine needs.
struct RawReaction<'a> {
    guild_id: Option<u64>,
    channel_id: u64,
    message_id: u64,
    user_id: Option<u64>,
    emoji: &'a ReactionType,
}

impl<'a> From<&'a Reaction> for RawReaction<'a> {
    fn from(reaction: &'a Reaction) -> Self {
        Self {
            guild_id: reaction.guild_id.map(|id| id.get()),
            channel_id: reaction.channel_id.get(),
            message_id: reaction.message_id.get(),
            user_id: reaction.user_id.map(|id| id.get()),
            emoji: &reaction.emoji,
        }
    }
}

fn translate(
    kind: ReactionKind,
    raw: RawReaction<'_>,
    bot_user: Option<u64>,
) -> Result<ReactionEvent, Skip> {
    let guild_id = raw.guild_id.ok_or(Skip::NoGuild)?;
    let user_id = raw.user_id.ok_or(Skip::NoUser)?;
    if bot_user == Some(user_id) {
        return Err(Skip::OwnReaction);
    }
    let emoji = emoji_key(raw.emoji).ok_or(Skip::UnsupportedEmoji)?;

    Ok(ReactionEvent {
        kind,
        guild_id: GuildId(guild_id),
        channel_id: ChannelId(raw.channel_id),
        message_id: MessageId(raw.message_id),
        emoji,
        user_id: UserId(user_id),
    })
}

/// Forwards reaction events to the dispatcher.
pub struct Handler {
    events: EventSender,
    engine: Arc<RoleSyncEngine>,
    bot_user: OnceLock<u64>,
    roles_verified: AtomicBool,
}

impl Handler {
    pub fn new(events: EventSender, engine: Arc<RoleSyncEngine>) -> Self {
        Self {
            events,
            engine,
            bot_user: OnceLock::new(),
            roles_verified: AtomicBool::new(false),
        }
    }

    async fn forward(&self, kind: ReactionKind, reaction: &Reaction) {
        match translate(kind, reaction.into(), self.bot_user.get().copied()) {
            Ok(event) => {
                if !self.events.submit(event).await {
                    error!(message_id = %reaction.message_id, "Dispatcher rejected reaction event");
                }
            }
            Err(skip) => {
                debug!(message_id = %reaction.message_id, ?skip, "Skipping reaction");
            }
        }
    }

    /// Warns about registry roles missing from the guild. Runs on the first
    /// ready only; reconnects do not repeat it.
    async fn verify_roles(&self) {
        if self.roles_verified.swap(true, Ordering::SeqCst) {
            return;
        }

        match self.engine.missing_registry_roles().await {
            Ok(missing) if missing.is_empty() => {
                info!(
                    categories = self.engine.registry().categories().len(),
                    "All configured roles exist"
                );
            }
            Ok(missing) => {
                for role_id in missing {
                    warn!(role_id = %role_id, "Configured role does not exist in the guild");
                }
            }
            Err(err) => {
                warn!(error = %err, "Could not verify configured roles");
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        self.forward(ReactionKind::Added, &reaction).await;
    }

    async fn reaction_remove(&self, _ctx: Context, reaction: Reaction) {
        self.forward(ReactionKind::Removed, &reaction).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        let _ = self.bot_user.set(ready.user.id.get());

        let guild_id = self.engine.registry().guild_id().get();
        let in_guild = ready.guilds.iter().any(|guild| guild.id.get() == guild_id);
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            in_guild,
            "Connected to gateway"
        );
        if !in_guild {
            warn!(guild_id, "Bot is not a member of the configured guild");
        }

        self.verify_roles().await;
    }
}
