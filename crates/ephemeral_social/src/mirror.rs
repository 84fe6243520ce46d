//! Keeps the state cache in step with gateway events.

use ephemeral_core::{
    Channel, ChannelId, Guild, GuildId, GuildInfo, Member, Role, RoleId, StateCache, UserId,
};
use ephemeral_error::StateError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies guild, member, role and channel events to a [`StateCache`].
///
/// Events for guilds the cache does not hold yet are dropped; the guild is fetched
/// whole the first time a handler needs it.
#[derive(Debug, Clone)]
pub struct StateMirror {
    cache: Arc<StateCache>,
}

impl StateMirror {
    /// Creates a mirror writing into `cache`.
    pub fn new(cache: Arc<StateCache>) -> Self {
        Self { cache }
    }

    /// The cache being written.
    pub fn cache(&self) -> &Arc<StateCache> {
        &self.cache
    }

    /// A guild became available: install the full record.
    pub fn guild_available(&self, guild: Guild) {
        info!(
            guild_id = %guild.id,
            guild_name = %guild.name,
            members = guild.member_count,
            "Guild available"
        );
        self.cache.add_guild(guild);
    }

    /// The guild's scalar fields changed.
    pub fn guild_updated(&self, info: GuildInfo) {
        let guild_id = info.id;
        skip_unknown(guild_id, self.cache.update_guild_info(info));
    }

    /// The bot left the guild, or it became unavailable.
    ///
    /// An outage keeps the cached record; only a real removal drops it.
    pub fn guild_removed(&self, guild_id: GuildId, unavailable: bool) {
        if unavailable {
            warn!(guild_id = %guild_id, "Guild unavailable");
            return;
        }
        if self.cache.remove_guild(guild_id).is_some() {
            info!(guild_id = %guild_id, "Left guild");
        }
    }

    /// A member joined.
    pub fn member_added(&self, member: Member) {
        let guild_id = member.guild_id;
        let known = self.cache.member(guild_id, member.user_id).is_some();
        skip_unknown(guild_id, self.cache.upsert_member(member));
        if !known {
            skip_unknown(guild_id, self.cache.adjust_member_count(guild_id, 1));
        }
    }

    /// A member's roles or name changed, or a fresh member record arrived.
    pub fn member_updated(&self, member: Member) {
        let guild_id = member.guild_id;
        skip_unknown(guild_id, self.cache.upsert_member(member));
    }

    /// A member left.
    pub fn member_removed(&self, guild_id: GuildId, user_id: UserId) {
        match self.cache.remove_member(guild_id, user_id) {
            Ok(_) => skip_unknown(guild_id, self.cache.adjust_member_count(guild_id, -1)),
            // Members outside the cached page still count.
            Err(_) if self.cache.contains_guild(guild_id) => {
                skip_unknown(guild_id, self.cache.adjust_member_count(guild_id, -1));
            }
            Err(err) => debug!(error = %err, "Member left an uncached guild"),
        }
    }

    /// A role was created or changed.
    pub fn role_upserted(&self, role: Role) {
        let guild_id = role.guild_id;
        skip_unknown(guild_id, self.cache.add_role(role));
    }

    /// A role was deleted.
    pub fn role_removed(&self, guild_id: GuildId, role_id: RoleId) {
        skip_unknown(guild_id, self.cache.remove_role(guild_id, role_id).map(|_| ()));
    }

    /// A channel was created or changed.
    pub fn channel_upserted(&self, channel: Channel) {
        let guild_id = channel.guild_id;
        skip_unknown(guild_id, self.cache.add_channel(channel));
    }

    /// A channel was deleted.
    pub fn channel_removed(&self, guild_id: GuildId, channel_id: ChannelId) {
        skip_unknown(
            guild_id,
            self.cache.remove_channel(guild_id, channel_id).map(|_| ()),
        );
    }
}

fn skip_unknown(guild_id: GuildId, result: Result<(), StateError>) {
    if let Err(err) = result {
        debug!(guild_id = %guild_id, error = %err, "Event for uncached entity ignored");
    }
}
