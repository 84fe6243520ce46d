//! A seeded guild and the components wired over it.

#![allow(dead_code)]

use super::MockPlatform;
use ephemeral_core::{
    Channel, ChannelId, ChannelKind, Guild, GuildId, GuildInfo, Member, OverwriteTarget,
    PermissionOverwrite, Permissions, Role, RoleId, RoleSettings, StateCache, UserId,
    VoiceState,
};
use ephemeral_reconcile::{OperationsGateway, ReconcileMetrics, Reconciler};
use std::sync::Arc;
use std::time::Duration;

pub const GUILD: GuildId = GuildId::new(100);
pub const OWNER: UserId = UserId::new(1);
pub const BOT: UserId = UserId::new(2);
pub const U1: UserId = UserId::new(11);
pub const U2: UserId = UserId::new(12);
pub const U_UNKNOWN: UserId = UserId::new(99);

pub const GENERAL: ChannelId = ChannelId::new(21);
pub const GAMING: ChannelId = ChannelId::new(22);
pub const NEWCHAN: ChannelId = ChannelId::new(23);
pub const HIDDEN: ChannelId = ChannelId::new(24);
pub const TEXT: ChannelId = ChannelId::new(25);

pub const PREFIX: &str = "{eph}";

pub fn voice_channel(id: ChannelId, name: &str) -> Channel {
    Channel {
        id,
        guild_id: GUILD,
        name: name.to_string(),
        kind: ChannelKind::Voice,
        permission_overwrites: Vec::new(),
    }
}

pub fn member(user_id: UserId, role_ids: Vec<RoleId>) -> Member {
    Member {
        user_id,
        guild_id: GUILD,
        username: format!("user-{user_id}"),
        bot: user_id == BOT,
        role_ids,
    }
}

pub fn role(id: u64, name: &str) -> Role {
    Role {
        id: RoleId::new(id),
        guild_id: GUILD,
        name: name.to_string(),
        color: 0,
        hoist: false,
        mentionable: false,
        permissions: Permissions::NONE,
        position: 1,
    }
}

/// A guild with voice channels `general`, `gaming`, `newchan`, a voice channel the bot
/// cannot see, a text channel, and members owner, bot, u1 and u2.
pub fn seeded_guild() -> Guild {
    let everyone = Role {
        permissions: Permissions::VIEW_CHANNEL | Permissions::CONNECT,
        position: 0,
        ..role(GUILD.get(), "@everyone")
    };
    let hidden = Channel {
        permission_overwrites: vec![PermissionOverwrite {
            target: OverwriteTarget::Role(GUILD.everyone_role()),
            allow: Permissions::NONE,
            deny: Permissions::VIEW_CHANNEL,
        }],
        ..voice_channel(HIDDEN, "secret")
    };
    let text = Channel {
        kind: ChannelKind::Text,
        ..voice_channel(TEXT, "chat")
    };
    Guild::compose(
        GuildInfo {
            id: GUILD,
            name: "test guild".to_string(),
            owner_id: OWNER,
            member_count: 4,
        },
        vec![everyone, role(50, "moderators")],
        vec![
            voice_channel(GENERAL, "general"),
            voice_channel(GAMING, "gaming"),
            voice_channel(NEWCHAN, "newchan"),
            hidden,
            text,
        ],
        vec![
            member(OWNER, Vec::new()),
            member(BOT, Vec::new()),
            member(U1, vec![RoleId::new(50)]),
            member(U2, Vec::new()),
        ],
    )
}

pub fn join(user_id: UserId, channel_id: ChannelId) -> VoiceState {
    VoiceState {
        guild_id: GUILD,
        user_id,
        channel_id: Some(channel_id),
    }
}

pub fn leave(user_id: UserId) -> VoiceState {
    VoiceState {
        guild_id: GUILD,
        user_id,
        channel_id: None,
    }
}

/// Everything a test needs, over a fresh platform and an empty cache.
pub struct Harness {
    pub platform: Arc<MockPlatform>,
    pub gateway: Arc<OperationsGateway<MockPlatform>>,
    pub reconciler: Reconciler<MockPlatform>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_platform(MockPlatform::new(vec![seeded_guild()]))
    }

    pub fn with_platform(platform: MockPlatform) -> Self {
        let platform = Arc::new(platform);
        let cache = Arc::new(StateCache::new());
        cache.set_current_user(BOT);
        let gateway = Arc::new(OperationsGateway::new(
            Arc::clone(&platform),
            cache,
            RoleSettings::new(PREFIX, 16_753_920),
            Duration::from_secs(1),
            ReconcileMetrics::detached(),
        ));
        let reconciler = Reconciler::new(Arc::clone(&gateway), "!eph");
        Self {
            platform,
            gateway,
            reconciler,
        }
    }

    pub fn cache(&self) -> &StateCache {
        self.gateway.cache()
    }

    /// Ephemeral role names the platform says a member holds.
    pub fn ephemeral_roles(&self, user_id: UserId) -> Vec<String> {
        self.platform
            .member_role_names(GUILD, user_id)
            .into_iter()
            .filter(|name| name.starts_with(&format!("{PREFIX} ")))
            .collect()
    }

    /// Platform roles carrying `name`.
    pub fn roles_named(&self, name: &str) -> Vec<Role> {
        self.platform
            .roles(GUILD)
            .into_iter()
            .filter(|r| r.name == name)
            .collect()
    }
}
