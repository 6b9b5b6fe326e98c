//! Conversions between gateway model types and engine identifiers.

use reaction_role_sync::{EmojiKey, PlatformError, PlatformResult};
use serenity::model::channel::ReactionType;
use serenity::model::id::EmojiId;
use std::num::NonZeroU64;

/// Converts a raw id into a gateway id type. Zero is not a valid snowflake.
pub fn snowflake<T: From<NonZeroU64>>(raw: u64) -> PlatformResult<T> {
    NonZeroU64::new(raw)
        .map(T::from)
        .ok_or_else(|| PlatformError::Transport("zero is not a valid snowflake".to_string()))
}

/// Emoji key of an incoming reaction. `None` for reaction kinds the
/// registry cannot name.
pub fn emoji_key(reaction: &ReactionType) -> Option<EmojiKey> {
    match reaction {
        ReactionType::Custom { id, .. } => Some(EmojiKey::Custom(id.get())),
        ReactionType::Unicode(name) => Some(EmojiKey::Unicode(name.clone())),
        _ => None,
    }
}

/// Reaction type addressing `emoji` in REST calls.
pub fn reaction_type(emoji: &EmojiKey) -> PlatformResult<ReactionType> {
    match emoji {
        EmojiKey::Custom(id) => Ok(ReactionType::from(snowflake::<EmojiId>(*id)?)),
        EmojiKey::Unicode(name) => Ok(ReactionType::Unicode(name.clone())),
    }
}
