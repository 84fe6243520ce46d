//! Request and event value types exchanged with the platform.

use derive_getters::Getters;
use ephemeral_core::{ChannelId, GuildId, Permissions, UserId};
use serde::{Deserialize, Serialize};

/// Full replacement of an ephemeral role's editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEdit {
    /// New name
    pub name: String,
    /// Decimal RGB color
    pub color: u32,
    /// Show members separately in the member list
    pub hoist: bool,
    /// Allow anyone to mention the role
    pub mentionable: bool,
    /// Permissions, carried over from the blank role
    pub permissions: Permissions,
}

/// A field of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field title
    pub name: String,
    /// Field body
    pub value: String,
    /// Render next to the previous field
    pub inline: bool,
}

/// A rich message card.
///
/// # Example
///
/// ```
/// use ephemeral_interface::EmbedBuilder;
///
/// let embed = EmbedBuilder::default()
///     .title("Ephemeral Roles")
///     .color(0xFFA500u32)
///     .build()
///     .expect("valid embed");
/// assert_eq!(embed.title(), "Ephemeral Roles");
/// assert!(embed.fields().is_empty());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Embed {
    /// Card title
    title: String,
    /// Card body
    #[builder(default)]
    description: Option<String>,
    /// Side bar color
    #[builder(default)]
    color: u32,
    /// Fields in display order
    #[builder(default)]
    fields: Vec<EmbedField>,
}

impl EmbedBuilder {
    /// Append a field.
    pub fn field(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> &mut Self {
        self.fields.get_or_insert_with(Vec::new).push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// A message the bot sends.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Plain text body
    pub content: String,
    /// Optional card
    pub embed: Option<Embed>,
}

impl OutgoingMessage {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
        }
    }

    /// A message consisting of a single card.
    pub fn embed(embed: Embed) -> Self {
        Self {
            content: String::new(),
            embed: Some(embed),
        }
    }
}

/// A message the bot received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Guild the message was posted in, absent for direct messages
    pub guild_id: Option<GuildId>,
    /// Channel the message was posted in
    pub channel_id: ChannelId,
    /// Author
    pub author_id: UserId,
    /// Whether the author is a bot account
    pub author_bot: bool,
    /// Raw text
    pub content: String,
}

/// What the gateway tells the bot when a session becomes ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyInfo {
    /// The bot's own user id
    pub user_id: UserId,
    /// The bot's username
    pub username: String,
    /// Number of guilds the session will deliver
    pub guild_count: usize,
    /// Shard index and total, when sharded
    pub shard: Option<(u32, u32)>,
}
