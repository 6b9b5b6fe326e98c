//! Error types for the reaction-role engine.

use crate::ids::{MessageId, RoleId, UserId};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating the category registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// IO error reading the registry file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed registry JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A category has no emoji/role pairs
    #[error("Category '{0}' has no roles")]
    EmptyCategory(String),

    /// Two categories are attached to the same message
    #[error("Message {0} is configured for more than one category")]
    DuplicateMessage(MessageId),

    /// An emoji appears twice within one category
    #[error("Category '{category}' maps emoji {emoji} more than once")]
    DuplicateEmoji { category: String, emoji: String },

    /// A role is configured twice, including the TOS role reused in a category
    #[error("Role {0} is configured more than once")]
    DuplicateRole(RoleId),

    /// The TOS message is also a tracked category message
    #[error("TOS message {0} is also configured as a category message")]
    TosMessageTracked(MessageId),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Failure of an outbound platform call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The member left the guild or never existed
    #[error("Member {0} not found")]
    MemberNotFound(UserId),

    /// The role does not exist in the guild
    #[error("Role {0} not found")]
    RoleNotFound(RoleId),

    /// Missing permissions (e.g. role above the bot in the hierarchy)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The platform asked us to slow down
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The call did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl PlatformError {
    /// Whether repeating the call later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Timeout(_) | Self::Transport(_)
        )
    }
}

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(PlatformError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(PlatformError::RateLimited("slow down".into()).is_retryable());
        assert!(PlatformError::Transport("reset".into()).is_retryable());
        assert!(!PlatformError::MemberNotFound(UserId(1)).is_retryable());
        assert!(!PlatformError::Forbidden("hierarchy".into()).is_retryable());
    }

    #[test]
    fn error_messages_carry_ids() {
        let err = RegistryError::DuplicateRole(RoleId(42));
        assert_eq!(err.to_string(), "Role 42 is configured more than once");
    }
}
