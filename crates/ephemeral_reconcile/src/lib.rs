//! Voice-state reconciliation for the Ephemeral Roles bot.
//!
//! Keeps every guild member's ephemeral role in step with the voice channel they
//! are in:
//! - [`Reconciler`] turns voice-state, channel-delete and ready events into the
//!   minimal set of role mutations
//! - [`OperationsGateway`] is the single door every platform call goes through: it
//!   applies the per-call deadline, classifies failures, keeps the state cache in
//!   step, and ensures at most one role creation per `(guild, name)` is in flight
//! - [`KeyedSingleflight`] is the keyed lock behind that last guarantee
//! - [`CommandHandler`] answers the `info` and `log-level` chat commands
//! - [`ReconcileMetrics`] counts events, role operations and failures

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod commands;
mod gateway;
mod metrics;
mod reconciler;
mod singleflight;

pub use commands::{Command, CommandHandler, CommandOutcome, CommandSettings, parse_command};
pub use gateway::{DEFAULT_CALL_DEADLINE, OperationsGateway};
pub use metrics::ReconcileMetrics;
pub use reconciler::{Reconciler, VoiceOutcome, lookup_role_by_name};
pub use singleflight::{FlightGuard, KeyedSingleflight};
