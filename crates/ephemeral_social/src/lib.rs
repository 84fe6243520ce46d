//! Discord integration for the Ephemeral Roles bot.
//!
//! Connects the platform-neutral reconciler to Discord through Serenity.
//!
//! # Layers
//!
//! - [`StateMirror`] applies guild, member, role and channel events to the state
//!   cache. It works on workspace types only and is always available.
//! - `discord` (requires the `discord` feature, on by default):
//!   - `SerenityPlatform` implements `PlatformClient` over Serenity's REST client
//!   - `EphemeralHandler` implements Serenity's `EventHandler`, mirroring state and
//!     dispatching voice-state, channel-delete, message and ready events
//!   - `EphemeralBot` owns the gateway client and its shards

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod mirror;

#[cfg(feature = "discord")]
mod discord;

pub use mirror::StateMirror;

#[cfg(feature = "discord")]
pub use discord::{
    ContextPresence, EphemeralBot, EphemeralHandler, SerenityPlatform, ShardManagerHandle,
    platform_error,
};
