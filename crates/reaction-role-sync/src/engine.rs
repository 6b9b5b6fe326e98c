//! Role sync engine: turns one reaction event into corrective platform calls.
//!
//! There is no stored per-member state. Every event re-reads the member's
//! live role list and diffs it against the category, so a failed call is
//! repaired by the next event for that member.

use crate::cache::ReactionerCache;
use crate::error::{PlatformError, PlatformResult};
use crate::event::{ReactionEvent, ReactionKind};
use crate::ids::{EmojiKey, RoleId, UserId};
use crate::platform::{bounded, Platform};
use crate::registry::{conflicting_roles, Category, CategoryRegistry, TosRemovalPolicy};
use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

/// Default deadline for a single platform call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Deadline applied to every outbound platform call.
    pub call_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Why an event was dropped without any platform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event belongs to another guild.
    OtherGuild,
    /// The message is neither a category message nor the TOS message.
    UntrackedMessage,
    /// The emoji is not part of the message's category.
    UnknownEmoji,
}

/// What handling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored(IgnoreReason),
    /// The TOS role was granted (or granted again).
    TosGranted,
    /// The TOS role was revoked.
    TosRevoked,
    /// A category role was granted and the rest of the category cleaned up.
    RoleSelected {
        granted: RoleId,
        /// Conflicting roles revoked; empty if there were none or the revoke failed.
        revoked: Vec<RoleId>,
        /// Stale reactions successfully removed from the message.
        reactions_cleared: usize,
    },
    /// A category role was revoked after its reaction was removed.
    RoleDeselected { revoked: RoleId },
    /// The member could not be resolved; nothing was mutated.
    Abandoned(PlatformError),
    /// The primary mutation of the event failed.
    Failed(PlatformError),
}

/// Applies reaction events to member roles.
pub struct RoleSyncEngine {
    registry: Arc<CategoryRegistry>,
    cache: ReactionerCache,
    platform: Arc<dyn Platform>,
    config: EngineConfig,
}

impl RoleSyncEngine {
    pub fn new(
        registry: Arc<CategoryRegistry>,
        platform: Arc<dyn Platform>,
        config: EngineConfig,
    ) -> Self {
        let cache = ReactionerCache::new(&registry);
        Self {
            registry,
            cache,
            platform,
            config,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ReactionerCache {
        &self.cache
    }

    /// Processes one event to completion.
    ///
    /// Never fails: every platform error is logged and reported through the
    /// returned [`Outcome`].
    pub async fn handle(&self, event: &ReactionEvent) -> Outcome {
        let span = info_span!(
            "reaction",
            kind = ?event.kind,
            message_id = %event.message_id,
            emoji = %event.emoji,
            user_id = %event.user_id,
        );
        self.route(event).instrument(span).await
    }

    async fn route(&self, event: &ReactionEvent) -> Outcome {
        if event.guild_id != self.registry.guild_id() {
            trace!(guild_id = %event.guild_id, "Ignoring event from another guild");
            return Outcome::Ignored(IgnoreReason::OtherGuild);
        }

        if self.registry.tos().matches(event.message_id, &event.emoji) {
            return self.handle_tos(event).await;
        }

        let Some(category) = self.registry.category(event.message_id) else {
            trace!("Ignoring reaction on untracked message");
            return Outcome::Ignored(IgnoreReason::UntrackedMessage);
        };

        let Some(role_id) = category.role_for(&event.emoji) else {
            trace!(category = %category.name(), "Ignoring emoji outside the category");
            return Outcome::Ignored(IgnoreReason::UnknownEmoji);
        };

        match event.kind {
            ReactionKind::Added => self.select(category, role_id, event).await,
            ReactionKind::Removed => self.deselect(category, role_id, event).await,
        }
    }

    async fn handle_tos(&self, event: &ReactionEvent) -> Outcome {
        let tos = self.registry.tos();
        let revoke = event.kind == ReactionKind::Removed && tos.on_remove == TosRemovalPolicy::Revoke;

        if revoke {
            return match self
                .call(self.platform.revoke_roles(event.user_id, &[tos.role_id]))
                .await
            {
                Ok(()) => {
                    info!(role_id = %tos.role_id, "TOS role revoked");
                    Outcome::TosRevoked
                }
                Err(err) => {
                    error!(
                        role_id = %tos.role_id,
                        error = %err,
                        retryable = err.is_retryable(),
                        "Failed to revoke TOS role"
                    );
                    Outcome::Failed(err)
                }
            };
        }

        match self
            .call(self.platform.grant_role(event.user_id, tos.role_id))
            .await
        {
            Ok(()) => {
                info!(role_id = %tos.role_id, "TOS role granted");
                Outcome::TosGranted
            }
            Err(err) => {
                error!(
                    role_id = %tos.role_id,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Failed to grant TOS role"
                );
                Outcome::Failed(err)
            }
        }
    }

    /// Reaction added on a category message.
    ///
    /// Order matters: grant first, then revoke conflicts, then clean up stale
    /// reactions. A failure at any step leaves earlier steps in place.
    async fn select(&self, category: &Category, role_id: RoleId, event: &ReactionEvent) -> Outcome {
        let user_id = event.user_id;

        let held = match self.call(self.platform.fetch_member_roles(user_id)).await {
            Ok(held) => held,
            Err(err) => {
                warn!(
                    category = %category.name(),
                    error = %err,
                    "Member could not be resolved, abandoning event"
                );
                return Outcome::Abandoned(err);
            }
        };

        if let Err(err) = self.call(self.platform.grant_role(user_id, role_id)).await {
            error!(
                category = %category.name(),
                role = %category.label(role_id),
                role_id = %role_id,
                error = %err,
                retryable = err.is_retryable(),
                "Failed to grant category role"
            );
            self.cache
                .record_added(event.message_id, &event.emoji, user_id)
                .await;
            return Outcome::Failed(err);
        }

        let hydrated = self
            .cache
            .ensure_hydrated(category, self.platform.as_ref(), self.config.call_timeout)
            .await;
        self.cache
            .record_added(event.message_id, &event.emoji, user_id)
            .await;

        let revoked = self.revoke_conflicts(category, user_id, &held, role_id).await;
        let stale = self.stale_reactions(category, event, &held, hydrated).await;
        let reactions_cleared = self.clear_stale_reactions(category, event, stale).await;

        info!(
            category = %category.name(),
            role = %category.label(role_id),
            role_id = %role_id,
            revoked = revoked.len(),
            reactions_cleared,
            "Category role selected"
        );

        Outcome::RoleSelected {
            granted: role_id,
            revoked,
            reactions_cleared,
        }
    }

    async fn revoke_conflicts(
        &self,
        category: &Category,
        user_id: UserId,
        held: &HashSet<RoleId>,
        granted: RoleId,
    ) -> Vec<RoleId> {
        let conflicts = conflicting_roles(held, category, granted);
        if conflicts.is_empty() {
            return conflicts;
        }

        match self
            .call(self.platform.revoke_roles(user_id, &conflicts))
            .await
        {
            Ok(()) => {
                debug!(category = %category.name(), roles = ?conflicts, "Conflicting roles revoked");
                conflicts
            }
            Err(err) => {
                error!(
                    category = %category.name(),
                    roles = ?conflicts,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Failed to revoke conflicting roles"
                );
                Vec::new()
            }
        }
    }

    /// The member's other reactions on the message that may be removed.
    ///
    /// A reaction known only from hydration can belong to an add event still
    /// queued behind this one, so it is only stale when the member holds its
    /// role. Without a hydrated cache the held roles alone decide.
    async fn stale_reactions(
        &self,
        category: &Category,
        event: &ReactionEvent,
        held: &HashSet<RoleId>,
        hydrated: bool,
    ) -> BTreeSet<EmojiKey> {
        let role_held = |emoji: &EmojiKey| {
            category
                .role_for(emoji)
                .is_some_and(|role_id| held.contains(&role_id))
        };

        let mut stale: BTreeSet<EmojiKey> = self
            .cache
            .other_reactions_of(event.message_id, event.user_id, &event.emoji)
            .await
            .into_iter()
            .filter(|reaction| reaction.confirmed || role_held(&reaction.emoji))
            .map(|reaction| reaction.emoji)
            .collect();

        if !hydrated {
            stale.extend(
                category
                    .emojis()
                    .filter(|emoji| **emoji != event.emoji && role_held(*emoji))
                    .cloned(),
            );
        }
        stale
    }

    /// Removes stale reactions so the visible selection matches the exclusive
    /// role. Best effort: failures are summarised in one log line, and a
    /// timeout ends the cleanup for this event.
    async fn clear_stale_reactions(
        &self,
        category: &Category,
        event: &ReactionEvent,
        stale: BTreeSet<EmojiKey>,
    ) -> usize {
        let mut cleared = 0;
        let mut failed = Vec::new();
        let mut last_error = None;

        for emoji in stale {
            let removed = self
                .call(self.platform.remove_reaction(
                    category.channel_id(),
                    event.message_id,
                    &emoji,
                    event.user_id,
                ))
                .await;

            match removed {
                Ok(()) => {
                    self.cache
                        .record_removed(event.message_id, &emoji, event.user_id)
                        .await;
                    cleared += 1;
                }
                Err(err) => {
                    let timed_out = matches!(err, PlatformError::Timeout(_));
                    failed.push(emoji);
                    last_error = Some(err);
                    if timed_out {
                        break;
                    }
                }
            }
        }

        if let Some(err) = last_error {
            warn!(
                category = %category.name(),
                failed = ?failed,
                cleared,
                error = %err,
                retryable = err.is_retryable(),
                "Failed to remove stale reactions"
            );
        }
        cleared
    }

    /// Reaction removed on a category message.
    async fn deselect(&self, category: &Category, role_id: RoleId, event: &ReactionEvent) -> Outcome {
        let revoked = self
            .call(self.platform.revoke_roles(event.user_id, &[role_id]))
            .await;

        self.cache
            .record_removed(event.message_id, &event.emoji, event.user_id)
            .await;

        match revoked {
            Ok(()) => {
                info!(
                    category = %category.name(),
                    role = %category.label(role_id),
                    role_id = %role_id,
                    "Category role deselected"
                );
                Outcome::RoleDeselected { revoked: role_id }
            }
            Err(err) => {
                error!(
                    category = %category.name(),
                    role_id = %role_id,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Failed to revoke deselected role"
                );
                Outcome::Failed(err)
            }
        }
    }

    /// Registry roles that do not exist in the guild.
    pub async fn missing_registry_roles(&self) -> PlatformResult<Vec<RoleId>> {
        let existing = self.call(self.platform.fetch_guild_roles()).await?;
        Ok(self
            .registry
            .all_role_ids()
            .into_iter()
            .filter(|role| !existing.contains(role))
            .collect())
    }

    async fn call<T>(&self, call: impl Future<Output = PlatformResult<T>>) -> PlatformResult<T> {
        bounded(self.config.call_timeout, call).await
    }
}
