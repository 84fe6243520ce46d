//! Core data types for the Ephemeral Roles bot.
//!
//! This crate holds the in-process view of the chat platform:
//! - Typed snowflake identifiers ([`GuildId`], [`ChannelId`], [`UserId`], [`RoleId`])
//! - The guild object graph ([`Guild`], [`Channel`], [`Member`], [`Role`])
//! - Voice-state events ([`VoiceState`])
//! - Ephemeral role naming ([`RoleSettings`])
//! - Permission computation ([`Permissions`], [`channel_permissions`])
//! - The process-wide mirror of that graph ([`StateCache`])

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ids;
mod model;
mod permissions;
mod role;
mod state;

pub use ids::{ChannelId, GuildId, RoleId, UserId};
pub use model::{
    Channel, ChannelKind, Guild, GuildInfo, GuildSummary, Member, OverwriteTarget,
    PermissionOverwrite, Role, VoiceState,
};
pub use permissions::{Permissions, channel_permissions};
pub use role::{DEFAULT_ROLE_COLOR, DEFAULT_ROLE_PREFIX, RoleSettings};
pub use state::StateCache;
