//! Trait definitions for the Ephemeral Roles bot.
//!
//! The reconciler never talks to a concrete chat platform. It consumes the traits
//! defined here, which the platform adapter implements and tests mock:
//! - [`PlatformClient`] - REST reads and role mutations
//! - [`PresenceUpdater`] - the bot's status line
//! - [`LogLevelControl`] - runtime log filter changes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod control;
mod traits;
mod types;

pub use control::{LogLevel, LogLevelControl};
pub use traits::{MEMBER_PAGE_LIMIT, PlatformClient, PresenceUpdater};
pub use types::{
    Embed, EmbedBuilder, EmbedField, IncomingMessage, OutgoingMessage, ReadyInfo, RoleEdit,
};
