//! Category registry: which message, emoji and role belong together.
//!
//! The registry is loaded once at startup from a JSON file and never changes
//! afterwards. Lookups are pure and synchronous.

use crate::error::{RegistryError, RegistryResult};
use crate::ids::{ChannelId, EmojiKey, GuildId, MessageId, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

/// What removing the TOS acceptance reaction does to the TOS role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TosRemovalPolicy {
    /// Grant the role again (the role stays once accepted).
    #[default]
    Regrant,
    /// Revoke the role.
    Revoke,
}

/// The terms-of-service gate: one emoji on one message grants one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TosConfig {
    pub message_id: MessageId,
    pub emoji: EmojiKey,
    pub role_id: RoleId,
    #[serde(default)]
    pub on_remove: TosRemovalPolicy,
}

impl TosConfig {
    /// Whether a reaction on `message_id` with `emoji` is the acceptance reaction.
    pub fn matches(&self, message_id: MessageId, emoji: &EmojiKey) -> bool {
        self.message_id == message_id && &self.emoji == emoji
    }
}

/// One emoji → role pair in a category file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub emoji: EmojiKey,
    pub role_id: RoleId,
    /// Human-readable role name, only used in logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A category as written in the registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub roles: Vec<RoleEntry>,
}

/// Registry file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The single community the bot manages.
    pub guild_id: GuildId,
    pub tos: TosConfig,
    pub categories: Vec<CategoryConfig>,
}

impl RegistryConfig {
    /// Reads a registry file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses registry JSON.
    pub fn from_json(content: &str) -> RegistryResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// A validated category: mutually exclusive roles selected on one message.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    channel_id: ChannelId,
    message_id: MessageId,
    roles: BTreeMap<EmojiKey, RoleId>,
    role_set: BTreeSet<RoleId>,
    labels: HashMap<RoleId, String>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Role selected by `emoji`, or `None` for an emoji outside the category.
    pub fn role_for(&self, emoji: &EmojiKey) -> Option<RoleId> {
        self.roles.get(emoji).copied()
    }

    /// Whether `role_id` is one of this category's roles.
    pub fn contains_role(&self, role_id: RoleId) -> bool {
        self.role_set.contains(&role_id)
    }

    pub fn role_ids(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.role_set.iter().copied()
    }

    pub fn emojis(&self) -> impl Iterator<Item = &EmojiKey> + '_ {
        self.roles.keys()
    }

    /// Configured label for a role, falling back to its id.
    pub fn label(&self, role_id: RoleId) -> String {
        self.labels
            .get(&role_id)
            .cloned()
            .unwrap_or_else(|| role_id.to_string())
    }
}

/// Roles the member must lose after being granted `granted` in `category`.
///
/// Every held role that belongs to the category, except the one just
/// granted. Returned sorted so the revoke call is deterministic.
pub fn conflicting_roles<'a>(
    held: impl IntoIterator<Item = &'a RoleId>,
    category: &Category,
    granted: RoleId,
) -> Vec<RoleId> {
    let conflicts: BTreeSet<RoleId> = held
        .into_iter()
        .copied()
        .filter(|role| *role != granted && category.contains_role(*role))
        .collect();
    conflicts.into_iter().collect()
}

/// Immutable lookup table built once from a [`RegistryConfig`].
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    guild_id: GuildId,
    tos: TosConfig,
    categories: Vec<Category>,
    by_message: HashMap<MessageId, usize>,
}

impl CategoryRegistry {
    /// Validates `config` and freezes it into a registry.
    pub fn from_config(config: RegistryConfig) -> RegistryResult<Self> {
        let mut categories = Vec::with_capacity(config.categories.len());
        let mut by_message = HashMap::new();
        let mut seen_roles = HashSet::from([config.tos.role_id]);

        for raw in config.categories {
            if raw.roles.is_empty() {
                return Err(RegistryError::EmptyCategory(raw.name));
            }
            if raw.message_id == config.tos.message_id {
                return Err(RegistryError::TosMessageTracked(raw.message_id));
            }
            if by_message.contains_key(&raw.message_id) {
                return Err(RegistryError::DuplicateMessage(raw.message_id));
            }

            let mut roles = BTreeMap::new();
            let mut labels = HashMap::new();
            for entry in raw.roles {
                if !seen_roles.insert(entry.role_id) {
                    return Err(RegistryError::DuplicateRole(entry.role_id));
                }
                if roles.contains_key(&entry.emoji) {
                    return Err(RegistryError::DuplicateEmoji {
                        category: raw.name,
                        emoji: entry.emoji.to_string(),
                    });
                }
                if let Some(label) = entry.label {
                    labels.insert(entry.role_id, label);
                }
                roles.insert(entry.emoji, entry.role_id);
            }

            by_message.insert(raw.message_id, categories.len());
            categories.push(Category {
                name: raw.name,
                channel_id: raw.channel_id,
                message_id: raw.message_id,
                role_set: roles.values().copied().collect(),
                roles,
                labels,
            });
        }

        Ok(Self {
            guild_id: config.guild_id,
            tos: config.tos,
            categories,
            by_message,
        })
    }

    /// Loads and validates a registry file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        Self::from_config(RegistryConfig::load(path)?)
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn tos(&self) -> &TosConfig {
        &self.tos
    }

    /// Category tracked on `message_id`, or `None` if the message is not tracked.
    pub fn category(&self, message_id: MessageId) -> Option<&Category> {
        self.by_message
            .get(&message_id)
            .map(|index| &self.categories[*index])
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Every role the registry references, TOS role included.
    pub fn all_role_ids(&self) -> BTreeSet<RoleId> {
        self.categories
            .iter()
            .flat_map(|category| category.role_ids())
            .chain(std::iter::once(self.tos.role_id))
            .collect()
    }
}
