//! Inbound reaction events.

use crate::ids::{ChannelId, EmojiKey, GuildId, MessageId, UserId};

/// Whether a reaction was placed or taken away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    Added,
    Removed,
}

/// A reaction-added or reaction-removed notification from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub kind: ReactionKind,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub emoji: EmojiKey,
    pub user_id: UserId,
}

impl ReactionEvent {
    /// Builds a reaction-added event.
    pub fn added(
        guild_id: GuildId,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: EmojiKey,
        user_id: UserId,
    ) -> Self {
        Self {
            kind: ReactionKind::Added,
            guild_id,
            channel_id,
            message_id,
            emoji,
            user_id,
        }
    }

    /// Builds a reaction-removed event.
    pub fn removed(
        guild_id: GuildId,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: EmojiKey,
        user_id: UserId,
    ) -> Self {
        Self {
            kind: ReactionKind::Removed,
            guild_id,
            channel_id,
            message_id,
            emoji,
            user_id,
        }
    }
}
