//! Error types for the Ephemeral Roles bot.
//!
//! This crate provides the error types shared by every other crate in the workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! The reconciler works against [`ReconcileError`], a closed set of failure variants.
//! Raw platform failures ([`PlatformError`]) are classified into it exactly once, by
//! [`ReconcileError::from_platform`].
//!
//! # Examples
//!
//! ```
//! use ephemeral_error::{EphemeralResult, ConfigError};
//!
//! fn load() -> EphemeralResult<String> {
//!     Err(ConfigError::new("BOT_TOKEN is required"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod metrics;
mod platform;
mod reconcile;
mod state;

pub use config::ConfigError;
pub use error::{EphemeralError, EphemeralErrorKind, EphemeralResult};
pub use http::HttpError;
pub use metrics::MetricsError;
pub use platform::{
    CODE_MAX_GUILDS, CODE_MAX_ROLES, PlatformError, PlatformErrorKind, PlatformResult,
};
pub use reconcile::{ReconcileError, ReconcileErrorKind, ReconcileResult};
pub use state::{StateError, StateErrorKind, StateResult};
