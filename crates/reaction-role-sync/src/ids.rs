//! Platform identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw snowflake value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// A community (guild) on the chat platform.
    GuildId
);
snowflake!(
    /// A text channel.
    ChannelId
);
snowflake!(
    /// A message within a channel.
    MessageId
);
snowflake!(
    /// A user, and the member handle for that user within the guild.
    UserId
);
snowflake!(
    /// A guild role.
    RoleId
);

/// Identifies the emoji of a reaction.
///
/// Custom guild emoji are addressed by id; built-in unicode emoji only have
/// a name. In configuration files a JSON number is a custom emoji id and a
/// JSON string is a unicode emoji.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmojiKey {
    /// Custom emoji id.
    Custom(u64),
    /// Unicode emoji, e.g. "✅".
    Unicode(String),
}

impl EmojiKey {
    /// Creates a unicode emoji key.
    pub fn unicode(name: impl Into<String>) -> Self {
        Self::Unicode(name.into())
    }
}

impl fmt::Display for EmojiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(id) => write!(f, "<:{id}>"),
            Self::Unicode(name) => f.write_str(name),
        }
    }
}
