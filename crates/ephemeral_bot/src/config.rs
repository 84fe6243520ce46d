//! Startup configuration.

use clap::Parser;
use ephemeral_core::{DEFAULT_ROLE_COLOR, DEFAULT_ROLE_PREFIX, RoleSettings};
use ephemeral_error::ConfigError;
use ephemeral_interface::LogLevel;
use ephemeral_reconcile::CommandSettings;
use std::fmt;
use std::time::Duration;

/// Default listing service endpoint.
pub const DEFAULT_LISTING_URL: &str = "https://discordbots.org/api";

/// Every startup option. Each flag can also be set through its environment variable.
#[derive(Parser, Clone)]
#[command(name = "ephemeral-roles")]
#[command(about = "Gives Discord members a role named after their voice channel")]
#[command(version)]
pub struct BotConfig {
    /// Discord bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Admin HTTP port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Name shown in the info card
    #[arg(long, env = "BOT_NAME", default_value = "Ephemeral Roles")]
    pub bot_name: String,

    /// Command prefix, also shown as the bot's status
    #[arg(long, env = "BOT_KEYWORD", default_value = "!eph")]
    pub bot_keyword: String,

    /// Prefix of ephemeral role names
    #[arg(long, env = "ROLE_PREFIX", default_value = DEFAULT_ROLE_PREFIX)]
    pub role_prefix: String,

    /// Decimal RGB color of created roles
    #[arg(long = "role-color", env = "ROLE_COLOR_HEX2DEC", default_value_t = DEFAULT_ROLE_COLOR)]
    pub role_color: u32,

    /// debug, info, warning, error, fatal or panic
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// tz database name for log timestamps; local time when unset
    #[arg(long, env = "LOG_TIMEZONE_LOCATION")]
    pub log_timezone_location: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Discord webhook receiving warnings and errors
    #[arg(long, env = "DISCORDRUS_WEBHOOK_URL", hide_env_values = true)]
    pub discordrus_webhook_url: Option<String>,

    /// Bot id on the listing service
    #[arg(long, env = "DISCORDBOTS_ORG_BOT_ID")]
    pub discordbots_org_bot_id: Option<String>,

    /// Listing service token
    #[arg(long, env = "DISCORDBOTS_ORG_TOKEN", hide_env_values = true)]
    pub discordbots_org_token: Option<String>,

    /// Listing service base URL
    #[arg(long, env = "DISCORDBOTS_ORG_URL", default_value = DEFAULT_LISTING_URL)]
    pub discordbots_org_url: String,

    /// Number of gateway shards
    #[arg(long, env = "SHARDS", default_value_t = 1)]
    pub shards: u32,

    /// Deadline for each Discord REST call, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 1000)]
    pub request_timeout_ms: u64,

    /// Guild and member sampling period, in seconds
    #[arg(long, env = "MONITOR_INTERVAL_SECS", default_value_t = 60)]
    pub monitor_interval_secs: u64,

    /// Time given to in-flight HTTP requests on shutdown, in seconds
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,
}

/// Credentials for pushing the guild count to the listing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    /// Base URL
    pub base_url: String,
    /// Bot id on the service
    pub bot_id: String,
    /// API token
    pub token: String,
}

impl BotConfig {
    /// Reject values that would fail later at runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::new("BOT_TOKEN must not be empty"));
        }
        if self.role_prefix.trim().is_empty() {
            return Err(ConfigError::new("ROLE_PREFIX must not be empty"));
        }
        if self.bot_keyword.trim().is_empty() {
            return Err(ConfigError::new("BOT_KEYWORD must not be empty"));
        }
        if self.shards == 0 {
            return Err(ConfigError::new("SHARDS must be at least 1"));
        }
        if self.role_color > 0xFF_FF_FF {
            return Err(ConfigError::new(format!(
                "ROLE_COLOR_HEX2DEC {} is not a 24-bit color",
                self.role_color
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::new("REQUEST_TIMEOUT_MS must be positive"));
        }
        if self.monitor_interval_secs == 0 {
            return Err(ConfigError::new("MONITOR_INTERVAL_SECS must be positive"));
        }
        Ok(())
    }

    /// Per-call deadline for Discord REST calls.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Monitor sampling period.
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Shutdown drain deadline.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Naming and styling of ephemeral roles.
    pub fn role_settings(&self) -> RoleSettings {
        RoleSettings::new(self.role_prefix.clone(), self.role_color)
    }

    /// Facts reported by the chat commands.
    pub fn command_settings(&self, version: impl Into<String>) -> CommandSettings {
        CommandSettings {
            bot_name: self.bot_name.clone(),
            keyword: self.bot_keyword.clone(),
            version: version.into(),
        }
    }

    /// Listing service credentials, when both id and token are set.
    pub fn listing(&self) -> Option<ListingConfig> {
        let bot_id = self.discordbots_org_bot_id.as_deref().filter(|s| !s.is_empty())?;
        let token = self.discordbots_org_token.as_deref().filter(|s| !s.is_empty())?;
        Some(ListingConfig {
            base_url: self.discordbots_org_url.trim_end_matches('/').to_string(),
            bot_id: bot_id.to_string(),
            token: token.to_string(),
        })
    }

    /// Webhook URL for log forwarding, if set.
    pub fn webhook_url(&self) -> Option<&str> {
        self.discordrus_webhook_url
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("port", &self.port)
            .field("bot_name", &self.bot_name)
            .field("bot_keyword", &self.bot_keyword)
            .field("role_prefix", &self.role_prefix)
            .field("role_color", &self.role_color)
            .field("log_level", &self.log_level)
            .field("log_timezone_location", &self.log_timezone_location)
            .field("log_json", &self.log_json)
            .field("webhook", &self.webhook_url().is_some())
            .field("listing", &self.listing().is_some())
            .field("shards", &self.shards)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("monitor_interval_secs", &self.monitor_interval_secs)
            .field("shutdown_grace_secs", &self.shutdown_grace_secs)
            .finish()
    }
}
