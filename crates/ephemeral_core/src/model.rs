//! The guild object graph.
//!
//! These are semantic records, not wire formats. The platform adapter converts its
//! own models into these at the boundary.

use crate::{ChannelId, GuildId, Permissions, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role id
    pub id: RoleId,
    /// Owning guild
    pub guild_id: GuildId,
    /// Display name
    pub name: String,
    /// RGB color as a decimal integer
    pub color: u32,
    /// Whether members are listed separately in the member list
    pub hoist: bool,
    /// Whether anyone can mention the role
    pub mentionable: bool,
    /// Permissions granted by the role
    pub permissions: Permissions,
    /// Position in the role hierarchy
    pub position: i64,
}

/// Channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum ChannelKind {
    /// Guild text channel
    Text,
    /// Guild voice channel
    Voice,
    /// Guild stage channel
    Stage,
    /// Channel category
    Category,
    /// Direct or group message channel
    Private,
    /// Any other channel type, by raw platform type number
    #[display("Other({_0})")]
    Other(u8),
}

/// Who a permission overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverwriteTarget {
    /// Everyone holding the role
    Role(RoleId),
    /// A single member
    Member(UserId),
}

/// A channel-level permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    /// Role or member the overwrite applies to
    pub target: OverwriteTarget,
    /// Permissions explicitly granted
    pub allow: Permissions,
    /// Permissions explicitly revoked
    pub deny: Permissions,
}

/// A guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel id
    pub id: ChannelId,
    /// Owning guild
    pub guild_id: GuildId,
    /// Display name
    pub name: String,
    /// Channel type
    pub kind: ChannelKind,
    /// Channel permission overwrites
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

impl Channel {
    /// Whether the reconciler manages roles for this channel.
    pub fn is_voice(&self) -> bool {
        self.kind == ChannelKind::Voice
    }
}

/// A guild member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// User id
    pub user_id: UserId,
    /// Owning guild
    pub guild_id: GuildId,
    /// Username
    pub username: String,
    /// Whether the user is a bot account
    pub bot: bool,
    /// Roles held, in platform order, without duplicates
    pub role_ids: Vec<RoleId>,
}

impl Member {
    /// Whether the member holds the role.
    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Record that the member now holds the role. Returns false if it already did.
    pub fn grant(&mut self, role_id: RoleId) -> bool {
        if self.has_role(role_id) {
            return false;
        }
        self.role_ids.push(role_id);
        true
    }

    /// Record that the member no longer holds the role. Returns false if it did not.
    pub fn revoke(&mut self, role_id: RoleId) -> bool {
        let before = self.role_ids.len();
        self.role_ids.retain(|id| *id != role_id);
        self.role_ids.len() != before
    }
}

/// A voice-state transition for one user.
///
/// `channel_id == None` means the user is no longer in any voice channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceState {
    /// Guild the transition happened in
    pub guild_id: GuildId,
    /// User whose state changed
    pub user_id: UserId,
    /// Voice channel the user is now in
    pub channel_id: Option<ChannelId>,
}

/// Guild scalar fields as returned by a single guild fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildInfo {
    /// Guild id
    pub id: GuildId,
    /// Display name
    pub name: String,
    /// Guild owner
    pub owner_id: UserId,
    /// Member count reported by the platform
    pub member_count: u64,
}

/// Lightweight guild view for monitors and the admin surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSummary {
    /// Guild id
    pub id: GuildId,
    /// Display name
    pub name: String,
    /// Member count
    pub member_count: u64,
}

/// A guild and everything the bot mirrors about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Guild id
    pub id: GuildId,
    /// Display name
    pub name: String,
    /// Guild owner
    pub owner_id: UserId,
    /// Member count
    pub member_count: u64,
    /// Roles by id
    pub roles: HashMap<RoleId, Role>,
    /// Channels by id
    pub channels: HashMap<ChannelId, Channel>,
    /// Members by user id
    pub members: HashMap<UserId, Member>,
}

impl Guild {
    /// Compose a guild record from separately fetched parts.
    ///
    /// When the platform did not report a member count, the number of fetched members
    /// is used instead.
    pub fn compose(
        info: GuildInfo,
        roles: Vec<Role>,
        channels: Vec<Channel>,
        members: Vec<Member>,
    ) -> Self {
        let member_count = if info.member_count == 0 {
            members.len() as u64
        } else {
            info.member_count
        };
        Self {
            id: info.id,
            name: info.name,
            owner_id: info.owner_id,
            member_count,
            roles: roles.into_iter().map(|r| (r.id, r)).collect(),
            channels: channels.into_iter().map(|c| (c.id, c)).collect(),
            members: members.into_iter().map(|m| (m.user_id, m)).collect(),
        }
    }

    /// Scalar view of the guild.
    pub fn summary(&self) -> GuildSummary {
        GuildSummary {
            id: self.id,
            name: self.name.clone(),
            member_count: self.member_count,
        }
    }
}
