//! In-process mirror of the platform's guild object graph.

use crate::{
    Channel, ChannelId, Guild, GuildId, GuildInfo, GuildSummary, Member, Permissions, Role,
    RoleId, UserId, channel_permissions,
};
use ephemeral_error::{StateError, StateErrorKind, StateResult};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-wide cache of guilds, channels, members and roles.
///
/// Reads return owned snapshots of a single entity taken under a read lock, so a
/// reader never sees a half-applied write. Writes are serialized by the lock. No
/// method suspends.
///
/// A miss on an unknown guild is not an error here; callers resolve it by fetching
/// the guild from the platform and installing it with [`StateCache::add_guild`].
///
/// # Example
///
/// ```
/// use ephemeral_core::{Guild, GuildId, GuildInfo, StateCache, UserId};
///
/// let cache = StateCache::new();
/// let info = GuildInfo {
///     id: GuildId::new(1),
///     name: "guild".to_string(),
///     owner_id: UserId::new(2),
///     member_count: 3,
/// };
/// cache.add_guild(Guild::compose(info, vec![], vec![], vec![]));
/// assert_eq!(cache.guild_count(), 1);
/// assert_eq!(cache.member_count_total(), 3);
/// ```
#[derive(Debug, Default)]
pub struct StateCache {
    guilds: RwLock<HashMap<GuildId, Guild>>,
    current_user: RwLock<Option<UserId>>,
}

impl StateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Reads
    // ============================================================================

    /// Whether the guild has been installed.
    pub fn contains_guild(&self, guild_id: GuildId) -> bool {
        self.guilds.read().contains_key(&guild_id)
    }

    /// Full snapshot of a guild.
    pub fn guild(&self, guild_id: GuildId) -> Option<Guild> {
        self.guilds.read().get(&guild_id).cloned()
    }

    /// Scalar fields of a guild.
    pub fn guild_info(&self, guild_id: GuildId) -> Option<GuildInfo> {
        self.guilds.read().get(&guild_id).map(|g| GuildInfo {
            id: g.id,
            name: g.name.clone(),
            owner_id: g.owner_id,
            member_count: g.member_count,
        })
    }

    /// A channel of a guild.
    pub fn channel(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<Channel> {
        self.guilds
            .read()
            .get(&guild_id)
            .and_then(|g| g.channels.get(&channel_id).cloned())
    }

    /// A member of a guild.
    pub fn member(&self, guild_id: GuildId, user_id: UserId) -> Option<Member> {
        self.guilds
            .read()
            .get(&guild_id)
            .and_then(|g| g.members.get(&user_id).cloned())
    }

    /// A role of a guild.
    pub fn role(&self, guild_id: GuildId, role_id: RoleId) -> Option<Role> {
        self.guilds
            .read()
            .get(&guild_id)
            .and_then(|g| g.roles.get(&role_id).cloned())
    }

    /// All roles of a guild, in no particular order.
    pub fn roles(&self, guild_id: GuildId) -> Option<Vec<Role>> {
        self.guilds
            .read()
            .get(&guild_id)
            .map(|g| g.roles.values().cloned().collect())
    }

    /// First role of a guild with exactly this name.
    pub fn role_by_name(&self, guild_id: GuildId, name: &str) -> Option<Role> {
        self.guilds
            .read()
            .get(&guild_id)
            .and_then(|g| g.roles.values().find(|r| r.name == name).cloned())
    }

    /// Summaries of every cached guild.
    pub fn guild_summaries(&self) -> Vec<GuildSummary> {
        self.guilds.read().values().map(Guild::summary).collect()
    }

    /// Number of cached guilds.
    pub fn guild_count(&self) -> usize {
        self.guilds.read().len()
    }

    /// Sum of member counts across cached guilds.
    pub fn member_count_total(&self) -> u64 {
        self.guilds.read().values().map(|g| g.member_count).sum()
    }

    /// The bot's own user id, once known.
    pub fn current_user(&self) -> Option<UserId> {
        *self.current_user.read()
    }

    /// Effective permissions of a member in a channel.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the guild, member or channel is not cached.
    pub fn user_channel_permissions(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> StateResult<Permissions> {
        let guilds = self.guilds.read();
        let guild = guilds
            .get(&guild_id)
            .ok_or_else(|| StateError::new(StateErrorKind::GuildNotFound(guild_id.get())))?;
        let member = guild.members.get(&user_id).ok_or_else(|| {
            StateError::new(StateErrorKind::MemberNotFound {
                guild_id: guild_id.get(),
                user_id: user_id.get(),
            })
        })?;
        let channel = guild.channels.get(&channel_id).ok_or_else(|| {
            StateError::new(StateErrorKind::ChannelNotFound {
                guild_id: guild_id.get(),
                channel_id: channel_id.get(),
            })
        })?;
        Ok(channel_permissions(
            guild_id,
            guild.owner_id,
            &guild.roles,
            member,
            channel,
        ))
    }

    // ============================================================================
    // Writes
    // ============================================================================

    /// Install or replace a guild record.
    pub fn add_guild(&self, guild: Guild) {
        tracing::debug!(
            guild_id = %guild.id,
            roles = guild.roles.len(),
            channels = guild.channels.len(),
            members = guild.members.len(),
            "Installing guild"
        );
        self.guilds.write().insert(guild.id, guild);
    }

    /// Forget a guild.
    pub fn remove_guild(&self, guild_id: GuildId) -> Option<Guild> {
        tracing::debug!(guild_id = %guild_id, "Removing guild");
        self.guilds.write().remove(&guild_id)
    }

    /// Update the scalar fields of a cached guild.
    pub fn update_guild_info(&self, info: GuildInfo) -> StateResult<()> {
        self.with_guild_mut(info.id, |guild| {
            guild.name = info.name;
            guild.owner_id = info.owner_id;
            guild.member_count = info.member_count;
        })
    }

    /// Shift a guild's member count by `delta`, saturating at zero.
    pub fn adjust_member_count(&self, guild_id: GuildId, delta: i64) -> StateResult<()> {
        self.with_guild_mut(guild_id, |guild| {
            guild.member_count = guild.member_count.saturating_add_signed(delta);
        })
    }

    /// Insert or replace a role.
    pub fn add_role(&self, role: Role) -> StateResult<()> {
        self.with_guild_mut(role.guild_id, |guild| {
            guild.roles.insert(role.id, role);
        })
    }

    /// Remove a role, also dropping it from every member that held it.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the guild or the role is not cached.
    pub fn remove_role(&self, guild_id: GuildId, role_id: RoleId) -> StateResult<Role> {
        let mut guilds = self.guilds.write();
        let guild = guilds
            .get_mut(&guild_id)
            .ok_or_else(|| StateError::new(StateErrorKind::GuildNotFound(guild_id.get())))?;
        let role = guild.roles.remove(&role_id).ok_or_else(|| {
            StateError::new(StateErrorKind::RoleNotFound {
                guild_id: guild_id.get(),
                role_id: role_id.get(),
            })
        })?;
        for member in guild.members.values_mut() {
            member.revoke(role_id);
        }
        Ok(role)
    }

    /// Insert or replace a channel.
    pub fn add_channel(&self, channel: Channel) -> StateResult<()> {
        self.with_guild_mut(channel.guild_id, |guild| {
            guild.channels.insert(channel.id, channel);
        })
    }

    /// Remove a channel.
    pub fn remove_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> StateResult<Channel> {
        let mut guilds = self.guilds.write();
        let guild = guilds
            .get_mut(&guild_id)
            .ok_or_else(|| StateError::new(StateErrorKind::GuildNotFound(guild_id.get())))?;
        guild.channels.remove(&channel_id).ok_or_else(|| {
            StateError::new(StateErrorKind::ChannelNotFound {
                guild_id: guild_id.get(),
                channel_id: channel_id.get(),
            })
        })
    }

    /// Insert or replace a member.
    pub fn upsert_member(&self, member: Member) -> StateResult<()> {
        self.with_guild_mut(member.guild_id, |guild| {
            guild.members.insert(member.user_id, member);
        })
    }

    /// Remove a member.
    pub fn remove_member(&self, guild_id: GuildId, user_id: UserId) -> StateResult<Member> {
        let mut guilds = self.guilds.write();
        let guild = guilds
            .get_mut(&guild_id)
            .ok_or_else(|| StateError::new(StateErrorKind::GuildNotFound(guild_id.get())))?;
        guild.members.remove(&user_id).ok_or_else(|| {
            StateError::new(StateErrorKind::MemberNotFound {
                guild_id: guild_id.get(),
                user_id: user_id.get(),
            })
        })
    }

    /// Record that a member gained a role. Returns false if it was already held.
    pub fn grant_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> StateResult<bool> {
        self.with_member_mut(guild_id, user_id, |member| member.grant(role_id))
    }

    /// Record that a member lost a role. Returns false if it was not held.
    pub fn revoke_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> StateResult<bool> {
        self.with_member_mut(guild_id, user_id, |member| member.revoke(role_id))
    }

    /// Remember the bot's own user id.
    pub fn set_current_user(&self, user_id: UserId) {
        *self.current_user.write() = Some(user_id);
    }

    fn with_guild_mut<T>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&mut Guild) -> T,
    ) -> StateResult<T> {
        let mut guilds = self.guilds.write();
        let guild = guilds
            .get_mut(&guild_id)
            .ok_or_else(|| StateError::new(StateErrorKind::GuildNotFound(guild_id.get())))?;
        Ok(f(guild))
    }

    fn with_member_mut<T>(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        f: impl FnOnce(&mut Member) -> T,
    ) -> StateResult<T> {
        let mut guilds = self.guilds.write();
        let guild = guilds
            .get_mut(&guild_id)
            .ok_or_else(|| StateError::new(StateErrorKind::GuildNotFound(guild_id.get())))?;
        let member = guild.members.get_mut(&user_id).ok_or_else(|| {
            StateError::new(StateErrorKind::MemberNotFound {
                guild_id: guild_id.get(),
                user_id: user_id.get(),
            })
        })?;
        Ok(f(member))
    }
}
