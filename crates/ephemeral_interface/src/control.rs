//! Runtime control of the process log level.

use ephemeral_error::ConfigError;
use serde::{Deserialize, Serialize};

/// Log levels accepted in configuration and by the log-level command.
///
/// `warning` is accepted for warn; `fatal` and `panic` are accepted and behave like
/// `error`, since nothing in the process logs above error.
///
/// # Examples
///
/// ```
/// use ephemeral_interface::LogLevel;
/// use std::str::FromStr;
///
/// assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
/// assert_eq!(LogLevel::from_str("PANIC").unwrap(), LogLevel::Panic);
/// assert_eq!(LogLevel::Panic.filter_directive(), "error");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    /// Debug and above
    Debug,
    /// Info and above
    #[default]
    Info,
    /// Warnings and above
    #[strum(to_string = "warning", serialize = "warn")]
    Warn,
    /// Errors only
    Error,
    /// Errors only
    Fatal,
    /// Errors only
    Panic,
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error | Self::Fatal | Self::Panic => "error",
        }
    }
}

/// Changes the process log level while it runs.
pub trait LogLevelControl: Send + Sync {
    /// The level currently in force.
    fn current(&self) -> LogLevel;

    /// Replace the level.
    fn set_level(&self, level: LogLevel) -> Result<(), ConfigError>;
}
