//! Runtime surface around the reconciler.
//!
//! This crate holds the parts of the bot that are not about roles:
//! - **BotConfig**: startup options from flags and environment
//! - **GuildsMonitor / MembersMonitor**: periodic gauges of guild and member counts
//! - **ListingClient**: pushes the guild count to the bot listing service
//! - **admin_router / serve_admin**: the admin HTTP surface and its runner

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod config;
mod listing;
mod monitors;
mod server;

pub use api::{AdminState, GuildEntry, PROFILES, admin_router};
pub use config::{BotConfig, DEFAULT_LISTING_URL, ListingConfig};
pub use listing::ListingClient;
pub use monitors::{GuildsMonitor, MembersMonitor, Monitor, MonitorMetrics, spawn_monitor};
pub use server::{serve_admin, wait_for_shutdown};
