//! Outbound port to the chat platform.
//!
//! The engine only talks to the platform through this trait. The bot binary
//! implements it on top of the gateway client; tests use an in-memory fake.
//! Implementations are bound to the single configured guild.

use crate::error::PlatformResult;
use crate::ids::{ChannelId, EmojiKey, MessageId, RoleId, UserId};
use async_trait::async_trait;
use std::collections::HashSet;

/// Calls the engine issues against the chat platform.
///
/// Each call may fail independently. Role grants and revokes must be
/// idempotent on the platform side: granting a held role or revoking a role
/// the member lacks succeeds without effect.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Grants `role_id` to the member.
    async fn grant_role(&self, user_id: UserId, role_id: RoleId) -> PlatformResult<()>;

    /// Revokes all of `role_ids` from the member.
    async fn revoke_roles(&self, user_id: UserId, role_ids: &[RoleId]) -> PlatformResult<()>;

    /// Removes `user_id`'s reaction `emoji` from a message.
    async fn remove_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &EmojiKey,
        user_id: UserId,
    ) -> PlatformResult<()>;

    /// Users currently holding reaction `emoji` on a message.
    async fn fetch_reaction_users(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &EmojiKey,
    ) -> PlatformResult<HashSet<UserId>>;

    /// Roles the member holds right now.
    ///
    /// Returns [`PlatformError::MemberNotFound`](crate::PlatformError::MemberNotFound)
    /// when the user is not a member of the guild.
    async fn fetch_member_roles(&self, user_id: UserId) -> PlatformResult<HashSet<RoleId>>;

    /// Every role defined in the guild. Used for startup verification only.
    async fn fetch_guild_roles(&self) -> PlatformResult<HashSet<RoleId>>;
}

/// Runs a platform call under a deadline, mapping expiry to
/// [`PlatformError::Timeout`](crate::PlatformError::Timeout).
pub(crate) async fn bounded<T>(
    timeout: std::time::Duration,
    call: impl std::future::Future<Output = PlatformResult<T>>,
) -> PlatformResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(crate::error::PlatformError::Timeout(timeout)),
    }
}
