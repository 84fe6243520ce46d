//! Discord integration through Serenity.
//!
//! ## Integration Layer
//! - **platform**: `PlatformClient` over Serenity's REST client
//! - **conversions**: Serenity models to workspace types, and error classification
//! - **handler**: Serenity `EventHandler` feeding the mirror, reconciler and commands
//! - **client**: gateway client setup and shard lifecycle

mod client;
mod conversions;
mod handler;
mod platform;

pub use client::{EphemeralBot, ShardManagerHandle};
pub use conversions::platform_error;
pub use handler::{ContextPresence, EphemeralHandler};
pub use platform::SerenityPlatform;
