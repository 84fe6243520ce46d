//! `PlatformClient` over Serenity's REST client.

use super::conversions::{self, platform_error};
use async_trait::async_trait;
use ephemeral_core::{Channel, ChannelId, GuildId, GuildInfo, Member, Role, RoleId, UserId};
use ephemeral_error::PlatformResult;
use ephemeral_interface::{OutgoingMessage, PlatformClient, RoleEdit};
use serenity::builder::{CreateEmbed, CreateMessage, EditRole};
use serenity::http::Http;
use serenity::model::permissions::Permissions as SerenityPermissions;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Discord REST access.
///
/// Serenity's HTTP client queues requests per rate-limit bucket, so callers see
/// rate limiting as latency. Dropping a call's future aborts the request.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    /// Creates a client authenticating with a bot token.
    #[instrument(skip(token), fields(token_len = token.as_ref().len()))]
    pub fn new(token: impl AsRef<str>) -> Self {
        debug!("Creating Discord REST client");
        Self {
            http: Arc::new(Http::new(token.as_ref())),
        }
    }

    /// Creates a client sharing an existing HTTP client.
    pub fn with_http(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }
}

#[async_trait]
impl PlatformClient for SerenityPlatform {
    #[instrument(skip(self), fields(guild_id = %guild_id))]
    async fn guild(&self, guild_id: GuildId) -> PlatformResult<GuildInfo> {
        let guild = self
            .http
            .get_guild_with_counts(conversions::guild_id(guild_id))
            .await
            .map_err(platform_error)?;
        Ok(conversions::guild_info(&guild))
    }

    #[instrument(skip(self), fields(guild_id = %guild_id))]
    async fn guild_roles(&self, guild_id: GuildId) -> PlatformResult<Vec<Role>> {
        let roles = self
            .http
            .get_guild_roles(conversions::guild_id(guild_id))
            .await
            .map_err(platform_error)?;
        Ok(roles.iter().map(|r| conversions::role(guild_id, r)).collect())
    }

    #[instrument(skip(self), fields(guild_id = %guild_id))]
    async fn guild_channels(&self, guild_id: GuildId) -> PlatformResult<Vec<Channel>> {
        let channels = self
            .http
            .get_channels(conversions::guild_id(guild_id))
            .await
            .map_err(platform_error)?;
        Ok(channels.iter().map(conversions::channel).collect())
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, after = ?after.map(|u| u.get())))]
    async fn guild_members(
        &self,
        guild_id: GuildId,
        after: Option<UserId>,
        limit: u16,
    ) -> PlatformResult<Vec<Member>> {
        let members = self
            .http
            .get_guild_members(
                conversions::guild_id(guild_id),
                Some(u64::from(limit)),
                after.map(UserId::get),
            )
            .await
            .map_err(platform_error)?;
        Ok(members.iter().map(conversions::member).collect())
    }

    #[instrument(skip(self), fields(guild_id = %guild_id))]
    async fn guild_role_create(&self, guild_id: GuildId) -> PlatformResult<Role> {
        let role = conversions::guild_id(guild_id)
            .create_role(self.http.as_ref(), EditRole::new())
            .await
            .map_err(platform_error)?;
        Ok(conversions::role(guild_id, &role))
    }

    #[instrument(skip(self, edit), fields(guild_id = %guild_id, role_id = %role_id, role_name = %edit.name))]
    async fn guild_role_edit(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        edit: &RoleEdit,
    ) -> PlatformResult<Role> {
        let builder = EditRole::new()
            .name(edit.name.clone())
            .colour(edit.color)
            .hoist(edit.hoist)
            .mentionable(edit.mentionable)
            .permissions(SerenityPermissions::from_bits_truncate(
                edit.permissions.bits(),
            ));
        let role = conversions::guild_id(guild_id)
            .edit_role(self.http.as_ref(), conversions::role_id(role_id), builder)
            .await
            .map_err(platform_error)?;
        Ok(conversions::role(guild_id, &role))
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, role_id = %role_id))]
    async fn guild_role_delete(&self, guild_id: GuildId, role_id: RoleId) -> PlatformResult<()> {
        self.http
            .delete_role(
                conversions::guild_id(guild_id),
                conversions::role_id(role_id),
                None,
            )
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, user_id = %user_id, role_id = %role_id))]
    async fn guild_member_role_add(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.http
            .add_member_role(
                conversions::guild_id(guild_id),
                conversions::user_id(user_id),
                conversions::role_id(role_id),
                None,
            )
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, user_id = %user_id, role_id = %role_id))]
    async fn guild_member_role_remove(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.http
            .remove_member_role(
                conversions::guild_id(guild_id),
                conversions::user_id(user_id),
                conversions::role_id(role_id),
                None,
            )
            .await
            .map_err(platform_error)
    }

    #[instrument(skip(self, message), fields(channel_id = %channel_id))]
    async fn channel_message_send(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> PlatformResult<()> {
        let mut builder = CreateMessage::new();
        if !message.content.is_empty() {
            builder = builder.content(message.content.clone());
        }
        if let Some(embed) = &message.embed {
            let mut card = CreateEmbed::new()
                .title(embed.title().clone())
                .colour(*embed.color());
            if let Some(description) = embed.description() {
                card = card.description(description.clone());
            }
            for field in embed.fields() {
                card = card.field(field.name.clone(), field.value.clone(), field.inline);
            }
            builder = builder.embed(card);
        }
        conversions::channel_id(channel_id)
            .send_message(self.http.as_ref(), builder)
            .await
            .map_err(platform_error)?;
        Ok(())
    }
}
