//! The `info` and `log-level` chat commands.

use crate::OperationsGateway;
use ephemeral_error::ReconcileResult;
use ephemeral_interface::{
    EmbedBuilder, IncomingMessage, LogLevel, LogLevelControl, OutgoingMessage, PlatformClient,
};
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, error, info, instrument, warn};

/// A parsed chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show bot information
    Info,
    /// Change the log level; `None` if the level was missing or unrecognized
    LogLevel(Option<LogLevel>),
    /// Anything else after the keyword
    Usage,
}

/// Parse a message addressed to the bot.
///
/// Returns `None` unless the message starts with `keyword` as a whole word.
///
/// # Examples
///
/// ```
/// use ephemeral_interface::LogLevel;
/// use ephemeral_reconcile::{Command, parse_command};
///
/// assert_eq!(parse_command("!eph", "!eph info"), Some(Command::Info));
/// assert_eq!(
///     parse_command("!eph", "!eph log-level warning"),
///     Some(Command::LogLevel(Some(LogLevel::Warn)))
/// );
/// assert_eq!(parse_command("!eph", "!eph"), Some(Command::Usage));
/// assert_eq!(parse_command("!eph", "!ephemeral info"), None);
/// assert_eq!(parse_command("!eph", "hello"), None);
/// ```
pub fn parse_command(keyword: &str, content: &str) -> Option<Command> {
    let rest = content.trim().strip_prefix(keyword)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut words = rest.split_whitespace();
    let command = match words.next().map(str::to_lowercase).as_deref() {
        Some("info") => Command::Info,
        Some("log-level") => Command::LogLevel(words.next().and_then(|w| LogLevel::from_str(w).ok())),
        _ => Command::Usage,
    };
    Some(command)
}

/// Static facts the commands report.
#[derive(Debug, Clone)]
pub struct CommandSettings {
    /// Display name in the info card
    pub bot_name: String,
    /// Command prefix
    pub keyword: String,
    /// Version shown in the info card
    pub version: String,
}

/// What a message led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Not a command, or sent by a bot
    Ignored,
    /// A reply was sent
    Replied(Command),
    /// The author may not run the command; a refusal was sent
    Denied(Command),
}

/// Answers chat commands.
pub struct CommandHandler<P: PlatformClient> {
    gateway: Arc<OperationsGateway<P>>,
    settings: CommandSettings,
    log_control: Arc<dyn LogLevelControl>,
}

impl<P: PlatformClient> CommandHandler<P> {
    /// Creates a command handler.
    pub fn new(
        gateway: Arc<OperationsGateway<P>>,
        settings: CommandSettings,
        log_control: Arc<dyn LogLevelControl>,
    ) -> Self {
        Self {
            gateway,
            settings,
            log_control,
        }
    }

    /// Handle a message, logging instead of returning failures.
    pub async fn handle_message(&self, message: &IncomingMessage) {
        if let Err(err) = self.on_message(message).await {
            if err.is_classified() {
                debug!(error = %err, "Command reply not sent");
            } else {
                error!(error = %err, "Command failed");
            }
        }
    }

    /// Parse and answer a message.
    ///
    /// Messages from bots are ignored before anything else happens.
    #[instrument(skip(self, message), fields(channel_id = %message.channel_id, user_id = %message.author_id))]
    pub async fn on_message(&self, message: &IncomingMessage) -> ReconcileResult<CommandOutcome> {
        if message.author_bot {
            return Ok(CommandOutcome::Ignored);
        }
        let Some(command) = parse_command(&self.settings.keyword, &message.content) else {
            return Ok(CommandOutcome::Ignored);
        };
        debug!(?command, "Received command");

        let (reply, outcome) = match command {
            Command::Info => (self.info_message(), CommandOutcome::Replied(command)),
            Command::LogLevel(level) => self.log_level(message, level).await?,
            Command::Usage => (
                OutgoingMessage::text(self.usage()),
                CommandOutcome::Replied(command),
            ),
        };
        self.gateway
            .send_message(message.channel_id, &reply)
            .await?;
        Ok(outcome)
    }

    fn info_message(&self) -> OutgoingMessage {
        let cache = self.gateway.cache();
        let mut builder = EmbedBuilder::default();
        builder
            .title(self.settings.bot_name.clone())
            .description(Some(format!(
                "Gives members a role named after the voice channel they are in. \
                 Type `{} log-level <level>` to change logging.",
                self.settings.keyword
            )))
            .color(self.gateway.role_settings().color())
            .field("Version", self.settings.version.clone(), true)
            .field("Guilds", cache.guild_count().to_string(), true)
            .field("Members", cache.member_count_total().to_string(), true)
            .field("Role prefix", self.gateway.role_settings().prefix(), true);
        match builder.build() {
            Ok(embed) => OutgoingMessage::embed(embed),
            Err(err) => {
                warn!(error = %err, "Falling back to a text info reply");
                OutgoingMessage::text(self.settings.bot_name.clone())
            }
        }
    }

    async fn log_level(
        &self,
        message: &IncomingMessage,
        level: Option<LogLevel>,
    ) -> ReconcileResult<(OutgoingMessage, CommandOutcome)> {
        let command = Command::LogLevel(level);
        let is_owner = match message.guild_id {
            Some(guild_id) => {
                self.gateway.lookup_guild(guild_id).await?.owner_id == message.author_id
            }
            None => false,
        };
        if !is_owner {
            return Ok((
                OutgoingMessage::text("Only the server owner can change the log level."),
                CommandOutcome::Denied(command),
            ));
        }

        let Some(level) = level else {
            return Ok((
                OutgoingMessage::text(self.log_level_usage()),
                CommandOutcome::Replied(command),
            ));
        };
        let reply = match self.log_control.set_level(level) {
            Ok(()) => {
                info!(%level, "Log level changed");
                format!("Log level set to {level}.")
            }
            Err(err) => {
                error!(error = %err, %level, "Failed to change log level");
                format!("Could not set log level: {err}")
            }
        };
        Ok((OutgoingMessage::text(reply), CommandOutcome::Replied(command)))
    }

    fn usage(&self) -> String {
        format!(
            "Usage: `{0} info` or `{0} log-level <level>`",
            self.settings.keyword
        )
    }

    fn log_level_usage(&self) -> String {
        let levels: Vec<String> = LogLevel::iter().map(|l| l.to_string()).collect();
        format!(
            "Usage: `{} log-level <{}>` (currently {})",
            self.settings.keyword,
            levels.join("|"),
            self.log_control.current()
        )
    }
}
