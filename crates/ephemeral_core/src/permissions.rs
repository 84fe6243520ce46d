//! Permission bitsets and channel permission computation.

use crate::{Channel, GuildId, Member, OverwriteTarget, Role, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// A platform permission bitset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From,
)]
#[serde(transparent)]
pub struct Permissions(u64);

impl Permissions {
    /// No permissions.
    pub const NONE: Self = Self(0);
    /// Administrator: implies every other permission.
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    /// See the channel and, for voice channels, its occupants.
    pub const VIEW_CHANNEL: Self = Self(1 << 10);
    /// Send messages in text channels.
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    /// Join voice channels.
    pub const CONNECT: Self = Self(1 << 20);
    /// Create, edit, assign and delete roles below the bot's highest role.
    pub const MANAGE_ROLES: Self = Self(1 << 28);
    /// Every permission bit.
    pub const ALL: Self = Self(u64::MAX);

    /// Wrap raw permission bits.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw permission bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Permissions {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Compute a member's effective permissions in a channel.
///
/// Follows the platform algorithm: the owner has everything; otherwise the
/// `@everyone` role and the member's roles are unioned, administrators short-circuit,
/// and channel overwrites are applied in the order `@everyone`, roles, member.
pub fn channel_permissions(
    guild_id: GuildId,
    owner_id: UserId,
    roles: &HashMap<RoleId, Role>,
    member: &Member,
    channel: &Channel,
) -> Permissions {
    if member.user_id == owner_id {
        return Permissions::ALL;
    }

    let everyone = guild_id.everyone_role();
    let mut base = roles
        .get(&everyone)
        .map(|r| r.permissions)
        .unwrap_or_default();
    for role_id in &member.role_ids {
        if let Some(role) = roles.get(role_id) {
            base |= role.permissions;
        }
    }
    if base.contains(Permissions::ADMINISTRATOR) {
        return Permissions::ALL;
    }

    let mut perms = base;
    let overwrites = &channel.permission_overwrites;

    if let Some(ow) = overwrites
        .iter()
        .find(|ow| ow.target == OverwriteTarget::Role(everyone))
    {
        perms = (perms & !ow.deny) | ow.allow;
    }

    let mut allow = Permissions::NONE;
    let mut deny = Permissions::NONE;
    for ow in overwrites {
        if let OverwriteTarget::Role(role_id) = ow.target
            && role_id != everyone
            && member.has_role(role_id)
        {
            allow |= ow.allow;
            deny |= ow.deny;
        }
    }
    perms = (perms & !deny) | allow;

    if let Some(ow) = overwrites
        .iter()
        .find(|ow| ow.target == OverwriteTarget::Member(member.user_id))
    {
        perms = (perms & !ow.deny) | ow.allow;
    }

    perms
}
