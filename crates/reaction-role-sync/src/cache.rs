//! Reactioner cache: who is believed to hold which reaction on each tracked message.
//!
//! Entries are created up front for every tracked message and hydrated lazily
//! from the platform on first use. Each message entry sits behind its own
//! async mutex; hydration runs while holding it, so concurrent first touches
//! wait for one fetch instead of issuing their own.
//!
//! The cache is advisory. The platform stays the authority, and a stale
//! entry only costs a redundant corrective call.

use crate::ids::{EmojiKey, MessageId, UserId};
use crate::platform::{bounded, Platform};
use crate::registry::{Category, CategoryRegistry};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct MessageReactioners {
    hydrated: bool,
    by_emoji: HashMap<EmojiKey, HashSet<UserId>>,
    /// Reactions seen only in a hydration snapshot, with no processed event yet.
    unconfirmed: HashSet<(EmojiKey, UserId)>,
}

/// One of a member's reactions as recorded in the cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CachedReaction {
    pub emoji: EmojiKey,
    /// An add event for this reaction has been processed. Reactions known
    /// only from hydration may still have their add event queued.
    pub confirmed: bool,
}

/// Per-message, per-emoji sets of reacting users.
#[derive(Debug)]
pub struct ReactionerCache {
    entries: HashMap<MessageId, Arc<Mutex<MessageReactioners>>>,
}

impl ReactionerCache {
    /// Creates an empty, un-hydrated entry for every tracked message.
    pub fn new(registry: &CategoryRegistry) -> Self {
        let entries = registry
            .categories()
            .iter()
            .map(|category| {
                (
                    category.message_id(),
                    Arc::new(Mutex::new(MessageReactioners::default())),
                )
            })
            .collect();

        Self { entries }
    }

    fn entry(&self, message_id: MessageId) -> Option<&Arc<Mutex<MessageReactioners>>> {
        self.entries.get(&message_id)
    }

    /// Populates the entry for `category` from the platform unless already done.
    ///
    /// Returns whether the entry is hydrated afterwards. On failure the entry
    /// keeps whatever it had recorded so far and stays un-hydrated, so the
    /// next access retries.
    pub async fn ensure_hydrated(
        &self,
        category: &Category,
        platform: &dyn Platform,
        call_timeout: Duration,
    ) -> bool {
        let Some(entry) = self.entry(category.message_id()) else {
            return false;
        };

        let mut guard = entry.lock().await;
        if guard.hydrated {
            return true;
        }

        let mut snapshot = HashMap::new();
        for emoji in category.emojis() {
            let fetched = bounded(
                call_timeout,
                platform.fetch_reaction_users(category.channel_id(), category.message_id(), emoji),
            )
            .await;

            match fetched {
                Ok(users) => {
                    snapshot.insert(emoji.clone(), users);
                }
                Err(err) => {
                    warn!(
                        category = %category.name(),
                        message_id = %category.message_id(),
                        emoji = %emoji,
                        error = %err,
                        "Reactioner hydration failed, will retry on next access"
                    );
                    return false;
                }
            }
        }

        let total: usize = snapshot.values().map(HashSet::len).sum();
        let unconfirmed: HashSet<(EmojiKey, UserId)> = snapshot
            .iter()
            .flat_map(|(emoji, users)| users.iter().map(move |user| (emoji.clone(), *user)))
            .filter(|(emoji, user)| {
                !guard
                    .by_emoji
                    .get(emoji)
                    .is_some_and(|known| known.contains(user))
            })
            .collect();
        guard.by_emoji = snapshot;
        guard.unconfirmed = unconfirmed;
        guard.hydrated = true;

        info!(
            category = %category.name(),
            message_id = %category.message_id(),
            reactioners = total,
            "Reactioner cache hydrated"
        );
        true
    }

    /// Records that `user_id` holds `emoji` on `message_id`.
    pub async fn record_added(&self, message_id: MessageId, emoji: &EmojiKey, user_id: UserId) {
        let Some(entry) = self.entry(message_id) else {
            return;
        };
        let mut guard = entry.lock().await;
        guard.unconfirmed.remove(&(emoji.clone(), user_id));
        if guard
            .by_emoji
            .entry(emoji.clone())
            .or_default()
            .insert(user_id)
        {
            debug!(message_id = %message_id, emoji = %emoji, user_id = %user_id, "Reactioner recorded");
        }
    }

    /// Records that `user_id` no longer holds `emoji` on `message_id`.
    ///
    /// Removing an absent user is a no-op.
    pub async fn record_removed(&self, message_id: MessageId, emoji: &EmojiKey, user_id: UserId) {
        let Some(entry) = self.entry(message_id) else {
            return;
        };
        let mut guard = entry.lock().await;
        guard.unconfirmed.remove(&(emoji.clone(), user_id));
        if let Some(users) = guard.by_emoji.get_mut(emoji) {
            if users.remove(&user_id) {
                debug!(message_id = %message_id, emoji = %emoji, user_id = %user_id, "Reactioner dropped");
            }
        }
    }

    /// Reactions other than `except` that `user_id` is recorded under on `message_id`.
    pub async fn other_reactions_of(
        &self,
        message_id: MessageId,
        user_id: UserId,
        except: &EmojiKey,
    ) -> Vec<CachedReaction> {
        let Some(entry) = self.entry(message_id) else {
            return Vec::new();
        };
        let guard = entry.lock().await;
        let mut reactions: Vec<CachedReaction> = guard
            .by_emoji
            .iter()
            .filter(|(emoji, users)| *emoji != except && users.contains(&user_id))
            .map(|(emoji, _)| CachedReaction {
                emoji: emoji.clone(),
                confirmed: !guard.unconfirmed.contains(&(emoji.clone(), user_id)),
            })
            .collect();
        reactions.sort();
        reactions
    }

    /// Users recorded under `emoji` on `message_id`.
    pub async fn reactioners(&self, message_id: MessageId, emoji: &EmojiKey) -> HashSet<UserId> {
        let Some(entry) = self.entry(message_id) else {
            return HashSet::new();
        };
        let guard = entry.lock().await;
        guard.by_emoji.get(emoji).cloned().unwrap_or_default()
    }

    pub async fn is_hydrated(&self, message_id: MessageId) -> bool {
        match self.entry(message_id) {
            Some(entry) => entry.lock().await.hydrated,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::harness::{fixture_registry, FakePlatform, COLOUR_MSG};
    use crate::EmojiKey;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn record_and_remove_are_idempotent() {
        let registry = fixture_registry();
        let cache = ReactionerCache::new(&registry);
        let emoji = EmojiKey::Custom(1);

        cache.record_added(COLOUR_MSG, &emoji, UserId(7)).await;
        cache.record_added(COLOUR_MSG, &emoji, UserId(7)).await;
        assert_eq!(cache.reactioners(COLOUR_MSG, &emoji).await.len(), 1);

        cache.record_removed(COLOUR_MSG, &emoji, UserId(7)).await;
        cache.record_removed(COLOUR_MSG, &emoji, UserId(7)).await;
        cache.record_removed(COLOUR_MSG, &EmojiKey::Custom(99), UserId(7)).await;
        assert!(cache.reactioners(COLOUR_MSG, &emoji).await.is_empty());
    }

    #[tokio::test]
    async fn untracked_messages_are_ignored() {
        let registry = fixture_registry();
        let cache = ReactionerCache::new(&registry);
        let untracked = MessageId(424242);

        cache.record_added(untracked, &EmojiKey::Custom(1), UserId(7)).await;
        assert!(cache.reactioners(untracked, &EmojiKey::Custom(1)).await.is_empty());
        assert!(!cache.is_hydrated(untracked).await);
    }

    #[tokio::test]
    async fn hydration_loads_platform_snapshot_once() {
        let registry = fixture_registry();
        let category = registry.category(COLOUR_MSG).unwrap();
        let platform = FakePlatform::new();
        platform.seed_reaction(COLOUR_MSG, EmojiKey::Custom(1), UserId(7));
        platform.seed_reaction(COLOUR_MSG, EmojiKey::Custom(2), UserId(7));
        platform.seed_reaction(COLOUR_MSG, EmojiKey::Custom(2), UserId(8));

        let cache = ReactionerCache::new(&registry);
        assert!(cache.ensure_hydrated(category, &platform, TIMEOUT).await);
        assert!(cache.ensure_hydrated(category, &platform, TIMEOUT).await);

        assert_eq!(platform.fetch_reaction_calls(), category.emojis().count());
        assert_eq!(
            cache.other_reactions_of(COLOUR_MSG, UserId(7), &EmojiKey::Custom(2)).await,
            vec![CachedReaction {
                emoji: EmojiKey::Custom(1),
                confirmed: false,
            }]
        );
        assert_eq!(cache.reactioners(COLOUR_MSG, &EmojiKey::Custom(2)).await.len(), 2);
    }

    #[tokio::test]
    async fn failed_hydration_retries_on_next_access() {
        let registry = fixture_registry();
        let category = registry.category(COLOUR_MSG).unwrap();
        let platform = FakePlatform::new();
        platform.seed_reaction(COLOUR_MSG, EmojiKey::Custom(3), UserId(9));
        platform.fail_fetches(true);

        let cache = ReactionerCache::new(&registry);
        assert!(!cache.ensure_hydrated(category, &platform, TIMEOUT).await);
        assert!(!cache.is_hydrated(COLOUR_MSG).await);
        assert!(cache.reactioners(COLOUR_MSG, &EmojiKey::Custom(3)).await.is_empty());

        platform.fail_fetches(false);
        assert!(cache.ensure_hydrated(category, &platform, TIMEOUT).await);
        assert!(cache.reactioners(COLOUR_MSG, &EmojiKey::Custom(3)).await.contains(&UserId(9)));
    }

    /// Only reactions whose add event was processed count as confirmed.
    #[tokio::test]
    async fn processed_events_confirm_hydrated_reactions() {
        let registry = fixture_registry();
        let category = registry.category(COLOUR_MSG).unwrap();
        let platform = FakePlatform::new();
        platform.seed_reaction(COLOUR_MSG, EmojiKey::Custom(1), UserId(7));
        platform.seed_reaction(COLOUR_MSG, EmojiKey::Custom(3), UserId(7));

        let cache = ReactionerCache::new(&registry);
        cache.record_added(COLOUR_MSG, &EmojiKey::Custom(3), UserId(7)).await;
        assert!(cache.ensure_hydrated(category, &platform, TIMEOUT).await);

        let others = cache.other_reactions_of(COLOUR_MSG, UserId(7), &EmojiKey::Custom(2)).await;
        assert_eq!(
            others,
            vec![
                CachedReaction {
                    emoji: EmojiKey::Custom(1),
                    confirmed: false,
                },
                CachedReaction {
                    emoji: EmojiKey::Custom(3),
                    confirmed: true,
                },
            ]
        );

        cache.record_added(COLOUR_MSG, &EmojiKey::Custom(1), UserId(7)).await;
        let others = cache.other_reactions_of(COLOUR_MSG, UserId(7), &EmojiKey::Custom(2)).await;
        assert!(others.iter().all(|reaction| reaction.confirmed));
    }
}
