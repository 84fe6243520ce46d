//! Logging setup.
//!
//! One `tracing` subscriber for the whole process: a reloadable level filter, a
//! text or JSON formatter stamping times in the configured zone, and optionally the
//! webhook forwarder.

use crate::webhook::WebhookLayer;
use chrono::{Local, SecondsFormat, Utc};
use chrono_tz::Tz;
use ephemeral_error::ConfigError;
use ephemeral_interface::{LogLevel, LogLevelControl};
use parking_lot::Mutex;
use std::fmt;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Logging options.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Initial level
    pub level: LogLevel,
    /// Emit JSON lines instead of text
    pub json: bool,
    /// Zone for timestamps; local time when unset
    pub timezone: Option<Tz>,
}

/// Resolve a tz database name. Empty means local time.
pub fn parse_timezone(name: Option<&str>) -> Result<Option<Tz>, ConfigError> {
    match name.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse::<Tz>()
            .map(Some)
            .map_err(|e| ConfigError::new(format!("Unknown LOG_TIMEZONE_LOCATION {name:?}: {e}"))),
    }
}

/// RFC 3339 timestamps in a fixed zone, or local time.
#[derive(Debug, Clone, Copy)]
pub struct ZonedTimer {
    zone: Option<Tz>,
}

impl ZonedTimer {
    /// Timer for `zone`; local time when `None`.
    pub fn new(zone: Option<Tz>) -> Self {
        Self { zone }
    }
}

impl FormatTime for ZonedTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let stamp = match self.zone {
            Some(zone) => Utc::now()
                .with_timezone(&zone)
                .to_rfc3339_opts(SecondsFormat::Millis, false),
            None => Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
        };
        w.write_str(&stamp)
    }
}

fn level_filter(level: LogLevel) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(level.filter_directive())
        .map_err(|e| ConfigError::new(format!("Invalid log filter for {level}: {e}")))
}

/// Changes the installed level filter at runtime.
pub struct ReloadLogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    current: Mutex<LogLevel>,
}

impl ReloadLogLevel {
    /// Wraps a reload handle whose filter currently enforces `level`.
    pub fn new(handle: reload::Handle<EnvFilter, Registry>, level: LogLevel) -> Self {
        Self {
            handle,
            current: Mutex::new(level),
        }
    }
}

impl LogLevelControl for ReloadLogLevel {
    fn current(&self) -> LogLevel {
        *self.current.lock()
    }

    fn set_level(&self, level: LogLevel) -> Result<(), ConfigError> {
        let mut current = self.current.lock();
        self.handle
            .reload(level_filter(level)?)
            .map_err(|e| ConfigError::new(format!("Failed to reload log filter: {e}")))?;
        *current = level;
        Ok(())
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_observability(
    config: &ObservabilityConfig,
    webhook: Option<WebhookLayer>,
) -> Result<ReloadLogLevel, ConfigError> {
    let (filter, handle) = reload::Layer::new(level_filter(config.level)?);
    let timer = ZonedTimer::new(config.timezone);

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_timer(timer)
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_timer(timer)
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(webhook)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install log subscriber: {e}")))?;

    Ok(ReloadLogLevel::new(handle, config.level))
}
