//! Platform trait definitions.

use crate::{OutgoingMessage, RoleEdit};
use async_trait::async_trait;
use ephemeral_core::{Channel, ChannelId, GuildId, GuildInfo, Member, Role, RoleId, UserId};
use ephemeral_error::PlatformResult;

/// Largest page the platform serves for member listing.
pub const MEMBER_PAGE_LIMIT: u16 = 1000;

/// REST surface of the chat platform.
///
/// Implementations handle rate limiting themselves; callers see it as latency. No
/// method applies a deadline; callers wrap every call in one and abandon the future
/// when it elapses, which aborts the underlying request.
#[async_trait]
pub trait PlatformClient: Send + Sync + 'static {
    /// Fetch a guild's scalar fields.
    async fn guild(&self, guild_id: GuildId) -> PlatformResult<GuildInfo>;

    /// Fetch every role of a guild.
    async fn guild_roles(&self, guild_id: GuildId) -> PlatformResult<Vec<Role>>;

    /// Fetch every channel of a guild.
    async fn guild_channels(&self, guild_id: GuildId) -> PlatformResult<Vec<Channel>>;

    /// Fetch one page of members, ordered by user id, starting after `after`.
    async fn guild_members(
        &self,
        guild_id: GuildId,
        after: Option<UserId>,
        limit: u16,
    ) -> PlatformResult<Vec<Member>>;

    /// Create a blank role.
    async fn guild_role_create(&self, guild_id: GuildId) -> PlatformResult<Role>;

    /// Overwrite a role's name, color, flags and permissions.
    async fn guild_role_edit(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        edit: &RoleEdit,
    ) -> PlatformResult<Role>;

    /// Delete a role.
    async fn guild_role_delete(&self, guild_id: GuildId, role_id: RoleId) -> PlatformResult<()>;

    /// Give a member a role.
    async fn guild_member_role_add(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()>;

    /// Take a role from a member.
    async fn guild_member_role_remove(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()>;

    /// Post a message to a channel.
    async fn channel_message_send(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> PlatformResult<()>;
}

/// Updates the bot's presence on the gateway connection that delivered an event.
pub trait PresenceUpdater: Send + Sync {
    /// Show the bot as "watching `text`".
    fn set_watching(&self, text: &str) -> PlatformResult<()>;
}
