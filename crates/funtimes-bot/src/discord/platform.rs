//! REST implementation of the engine's platform port for one guild.

use super::conversions::{reaction_type, snowflake};
use reaction_role_sync::{
    ChannelId, EmojiKey, GuildId, MessageId, Platform, PlatformError, PlatformResult, RoleId,
    UserId,
};
use serenity::async_trait;
use serenity::http::{Http, HttpError};
use serenity::model::id as sf;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Reaction users returned per page; the platform maximum.
const REACTION_PAGE_SIZE: u8 = 100;

/// Audit log reason attached to role changes.
const AUDIT_REASON: &str = "Reaction role selection";

const UNKNOWN_MEMBER: isize = 10007;
const UNKNOWN_ROLE: isize = 10011;

/// Who a failed call was about, for error classification.
#[derive(Debug, Clone, Copy, Default)]
struct Subject {
    user_id: Option<UserId>,
    role_id: Option<RoleId>,
}

impl Subject {
    fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role_id: None,
        }
    }

    fn role(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            user_id: Some(user_id),
            role_id: Some(role_id),
        }
    }
}

/// Maps an unsuccessful HTTP response onto the engine's error taxonomy.
fn classify(status: u16, code: isize, message: &str, subject: Subject) -> PlatformError {
    match (status, code, subject.user_id, subject.role_id) {
        (_, UNKNOWN_ROLE, _, Some(role_id)) => PlatformError::RoleNotFound(role_id),
        (_, UNKNOWN_MEMBER, Some(user_id), _) => PlatformError::MemberNotFound(user_id),
        (404, _, Some(user_id), None) => PlatformError::MemberNotFound(user_id),
        (403, ..) => PlatformError::Forbidden(message.to_string()),
        (429, ..) => PlatformError::RateLimited(message.to_string()),
        _ => PlatformError::Transport(format!("HTTP {status} ({code}): {message}")),
    }
}

fn map_error(err: serenity::Error, subject: Subject) -> PlatformError {
    match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => classify(
            response.status_code.as_u16(),
            response.error.code,
            &response.error.message,
            subject,
        ),
        _ => PlatformError::Transport(err.to_string()),
    }
}

/// Platform port backed by the REST client, bound to one guild.
pub struct SerenityPlatform {
    http: Arc<Http>,
    guild_id: sf::GuildId,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> PlatformResult<Self> {
        Ok(Self {
            http,
            guild_id: snowflake(guild_id.get())?,
        })
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn grant_role(&self, user_id: UserId, role_id: RoleId) -> PlatformResult<()> {
        self.http
            .add_member_role(
                self.guild_id,
                snowflake(user_id.get())?,
                snowflake(role_id.get())?,
                Some(AUDIT_REASON),
            )
            .await
            .map_err(|err| map_error(err, Subject::role(user_id, role_id)))
    }

    /// One request per role; each delete is idempotent on the platform.
    async fn revoke_roles(&self, user_id: UserId, role_ids: &[RoleId]) -> PlatformResult<()> {
        let user = snowflake(user_id.get())?;
        for role_id in role_ids {
            self.http
                .remove_member_role(self.guild_id, user, snowflake(role_id.get())?, Some(AUDIT_REASON))
                .await
                .map_err(|err| map_error(err, Subject::role(user_id, *role_id)))?;
        }
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &EmojiKey,
        user_id: UserId,
    ) -> PlatformResult<()> {
        self.http
            .delete_reaction(
                snowflake(channel_id.get())?,
                snowflake(message_id.get())?,
                snowflake(user_id.get())?,
                &reaction_type(emoji)?,
            )
            .await
            .map_err(|err| map_error(err, Subject::default()))
    }

    async fn fetch_reaction_users(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &EmojiKey,
    ) -> PlatformResult<HashSet<UserId>> {
        let channel: sf::ChannelId = snowflake(channel_id.get())?;
        let message: sf::MessageId = snowflake(message_id.get())?;
        let reaction = reaction_type(emoji)?;

        let mut users = HashSet::new();
        let mut after = None;
        let mut pages = 0usize;
        loop {
            let page = self
                .http
                .get_reaction_users(channel, message, &reaction, REACTION_PAGE_SIZE, after)
                .await
                .map_err(|err| map_error(err, Subject::default()))?;
            pages += 1;

            let full = page.len() >= usize::from(REACTION_PAGE_SIZE);
            after = page.last().map(|user| user.id.get());
            users.extend(page.iter().map(|user| UserId(user.id.get())));

            if !full {
                break;
            }
        }

        debug!(message_id = %message_id, emoji = %emoji, users = users.len(), pages, "Fetched reaction users");
        Ok(users)
    }

    async fn fetch_member_roles(&self, user_id: UserId) -> PlatformResult<HashSet<RoleId>> {
        let member = self
            .http
            .get_member(self.guild_id, snowflake(user_id.get())?)
            .await
            .map_err(|err| map_error(err, Subject::user(user_id)))?;

        Ok(member.roles.iter().map(|role| RoleId(role.get())).collect())
    }

    async fn fetch_guild_roles(&self) -> PlatformResult<HashSet<RoleId>> {
        let roles = self
            .http
            .get_guild_roles(self.guild_id)
            .await
            .map_err(|err| map_error(err, Subject::default()))?;

        Ok(roles.iter().map(|role| RoleId(role.id.get())).collect())
    }
}
