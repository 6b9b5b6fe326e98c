//! Reaction-role synchronization engine.
//!
//! Members pick roles by reacting to tracked messages. Each tracked message
//! belongs to a category (colour, region, gender, age band) whose roles are
//! mutually exclusive; categories are independent of each other. The platform
//! has no notion of exclusive reaction groups, so the engine restores the
//! invariant after the fact with corrective calls.
//!
//! # Core Invariants
//!
//! 1. **One Role Per Category**: after an event is processed a member holds at
//!    most one role from that category's role set
//! 2. **Grant Before Revoke**: the new role is granted before conflicting
//!    roles are revoked, so a member is never role-less mid-transition
//! 3. **Idempotent**: duplicate or self-generated events converge on the same
//!    role and cache state
//! 4. **Per-Member Order**: events for one member are processed in the order
//!    they were submitted to the dispatcher. The gateway client runs each
//!    handler call in its own task, so two events for one member that arrive
//!    close together may reach `submit` in either order
//!
//! # Architecture
//!
//! ```text
//! Gateway -> Dispatcher -> worker[hash(user) % N] -> RoleSyncEngine -> Platform
//!                                                        |
//!                                     CategoryRegistry + ReactionerCache
//! ```

pub mod cache;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod ids;
pub mod platform;
pub mod registry;

#[cfg(test)]
mod tests;

pub use cache::{CachedReaction, ReactionerCache};
pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherHandle, DispatcherStats, EventSender};
pub use engine::{EngineConfig, IgnoreReason, Outcome, RoleSyncEngine};
pub use error::{PlatformError, PlatformResult, RegistryError, RegistryResult};
pub use event::{ReactionEvent, ReactionKind};
pub use ids::{ChannelId, EmojiKey, GuildId, MessageId, RoleId, UserId};
pub use platform::Platform;
pub use registry::{
    conflicting_roles, Category, CategoryConfig, CategoryRegistry, RegistryConfig, RoleEntry,
    TosConfig, TosRemovalPolicy,
};
