//! In-memory platform for testing.

#![allow(dead_code)]

use async_trait::async_trait;
use ephemeral_core::{
    Channel, ChannelId, Guild, GuildId, GuildInfo, Member, Permissions, Role, RoleId, UserId,
};
use ephemeral_error::{ConfigError, PlatformError, PlatformResult};
use ephemeral_interface::{
    LogLevel, LogLevelControl, OutgoingMessage, PlatformClient, PresenceUpdater, RoleEdit,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Platform operations, for failure injection and call filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Guild,
    GuildRoles,
    GuildChannels,
    GuildMembers,
    RoleCreate,
    RoleEdit,
    RoleDelete,
    MemberRoleAdd,
    MemberRoleRemove,
    MessageSend,
}

/// A recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Guild(GuildId),
    GuildRoles(GuildId),
    GuildChannels(GuildId),
    GuildMembers {
        guild_id: GuildId,
        after: Option<UserId>,
    },
    RoleCreate(GuildId),
    RoleEdit {
        role_id: RoleId,
        edit: RoleEdit,
    },
    RoleDelete(RoleId),
    MemberRoleAdd {
        user_id: UserId,
        role_id: RoleId,
    },
    MemberRoleRemove {
        user_id: UserId,
        role_id: RoleId,
    },
    MessageSend {
        channel_id: ChannelId,
        message: OutgoingMessage,
    },
}

impl Call {
    /// The operation this call exercised.
    pub fn op(&self) -> Op {
        match self {
            Self::Guild(_) => Op::Guild,
            Self::GuildRoles(_) => Op::GuildRoles,
            Self::GuildChannels(_) => Op::GuildChannels,
            Self::GuildMembers { .. } => Op::GuildMembers,
            Self::RoleCreate(_) => Op::RoleCreate,
            Self::RoleEdit { .. } => Op::RoleEdit,
            Self::RoleDelete(_) => Op::RoleDelete,
            Self::MemberRoleAdd { .. } => Op::MemberRoleAdd,
            Self::MemberRoleRemove { .. } => Op::MemberRoleRemove,
            Self::MessageSend { .. } => Op::MessageSend,
        }
    }
}

/// A platform that keeps its guilds in memory and records every call.
///
/// Failures can be injected per operation, and every call can be slowed down to
/// exercise deadlines (use a paused tokio clock).
pub struct MockPlatform {
    guilds: Mutex<HashMap<GuildId, Guild>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Op, PlatformError>>,
    latency: Mutex<HashMap<Op, Duration>>,
    next_id: AtomicU64,
}

impl MockPlatform {
    /// A platform holding the given guilds.
    pub fn new(guilds: Vec<Guild>) -> Self {
        Self {
            guilds: Mutex::new(guilds.into_iter().map(|g| (g.id, g)).collect()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            latency: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(9_000),
        }
    }

    /// Make every future call of `op` fail with `error`.
    pub fn fail(&self, op: Op, error: PlatformError) {
        self.failures.lock().unwrap().insert(op, error);
    }

    /// Stop failing `op`.
    #[allow(dead_code)]
    pub fn heal(&self, op: Op) {
        self.failures.lock().unwrap().remove(&op);
    }

    /// Delay every future call of `op`.
    pub fn delay(&self, op: Op, latency: Duration) {
        self.latency.lock().unwrap().insert(op, latency);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `op` was called.
    pub fn count(&self, op: Op) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    /// Calls that change something on the platform.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c.op(),
                    Op::RoleCreate
                        | Op::RoleEdit
                        | Op::RoleDelete
                        | Op::MemberRoleAdd
                        | Op::MemberRoleRemove
                )
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// The platform's view of a guild's roles.
    pub fn roles(&self, guild_id: GuildId) -> Vec<Role> {
        self.guilds
            .lock()
            .unwrap()
            .get(&guild_id)
            .map(|g| g.roles.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The platform's view of a member's role names, sorted.
    pub fn member_role_names(&self, guild_id: GuildId, user_id: UserId) -> Vec<String> {
        let guilds = self.guilds.lock().unwrap();
        let Some(guild) = guilds.get(&guild_id) else {
            return Vec::new();
        };
        let Some(member) = guild.members.get(&user_id) else {
            return Vec::new();
        };
        let mut names: Vec<String> = member
            .role_ids
            .iter()
            .filter_map(|id| guild.roles.get(id))
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        names
    }

    /// The platform's view of a member's role ids.
    pub fn member_roles(&self, guild_id: GuildId, user_id: UserId) -> Vec<RoleId> {
        self.guilds
            .lock()
            .unwrap()
            .get(&guild_id)
            .and_then(|g| g.members.get(&user_id))
            .map(|m| m.role_ids.clone())
            .unwrap_or_default()
    }

    /// Add a member on the platform side only.
    #[allow(dead_code)]
    pub fn insert_member(&self, member: Member) {
        if let Some(guild) = self.guilds.lock().unwrap().get_mut(&member.guild_id) {
            guild.members.insert(member.user_id, member);
        }
    }

    async fn enter(&self, call: Call) -> PlatformResult<()> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);
        let latency = self.latency.lock().unwrap().get(&op).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        // Let concurrent callers interleave.
        tokio::task::yield_now().await;
        match self.failures.lock().unwrap().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn with_guild<T>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&mut Guild) -> PlatformResult<T>,
    ) -> PlatformResult<T> {
        let mut guilds = self.guilds.lock().unwrap();
        let guild = guilds
            .get_mut(&guild_id)
            .ok_or_else(|| PlatformError::rest(404, Some(10004), "Unknown Guild"))?;
        f(guild)
    }
}

fn unknown_member() -> PlatformError {
    PlatformError::rest(404, Some(10007), "Unknown Member")
}

fn unknown_role() -> PlatformError {
    PlatformError::rest(404, Some(10011), "Unknown Role")
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn guild(&self, guild_id: GuildId) -> PlatformResult<GuildInfo> {
        self.enter(Call::Guild(guild_id)).await?;
        self.with_guild(guild_id, |g| {
            Ok(GuildInfo {
                id: g.id,
                name: g.name.clone(),
                owner_id: g.owner_id,
                member_count: g.member_count,
            })
        })
    }

    async fn guild_roles(&self, guild_id: GuildId) -> PlatformResult<Vec<Role>> {
        self.enter(Call::GuildRoles(guild_id)).await?;
        self.with_guild(guild_id, |g| Ok(g.roles.values().cloned().collect()))
    }

    async fn guild_channels(&self, guild_id: GuildId) -> PlatformResult<Vec<Channel>> {
        self.enter(Call::GuildChannels(guild_id)).await?;
        self.with_guild(guild_id, |g| Ok(g.channels.values().cloned().collect()))
    }

    async fn guild_members(
        &self,
        guild_id: GuildId,
        after: Option<UserId>,
        limit: u16,
    ) -> PlatformResult<Vec<Member>> {
        self.enter(Call::GuildMembers { guild_id, after }).await?;
        self.with_guild(guild_id, |g| {
            let mut members: Vec<Member> = g
                .members
                .values()
                .filter(|m| after.is_none_or(|a| m.user_id > a))
                .cloned()
                .collect();
            members.sort_by_key(|m| m.user_id);
            members.truncate(usize::from(limit));
            Ok(members)
        })
    }

    async fn guild_role_create(&self, guild_id: GuildId) -> PlatformResult<Role> {
        self.enter(Call::RoleCreate(guild_id)).await?;
        let id = RoleId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.with_guild(guild_id, |g| {
            let role = Role {
                id,
                guild_id,
                name: "new role".to_string(),
                color: 0,
                hoist: false,
                mentionable: false,
                permissions: Permissions::VIEW_CHANNEL | Permissions::CONNECT,
                position: g.roles.len() as i64,
            };
            g.roles.insert(id, role.clone());
            Ok(role)
        })
    }

    async fn guild_role_edit(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        edit: &RoleEdit,
    ) -> PlatformResult<Role> {
        self.enter(Call::RoleEdit {
            role_id,
            edit: edit.clone(),
        })
        .await?;
        self.with_guild(guild_id, |g| {
            let role = g.roles.get_mut(&role_id).ok_or_else(unknown_role)?;
            role.name = edit.name.clone();
            role.color = edit.color;
            role.hoist = edit.hoist;
            role.mentionable = edit.mentionable;
            role.permissions = edit.permissions;
            Ok(role.clone())
        })
    }

    async fn guild_role_delete(&self, guild_id: GuildId, role_id: RoleId) -> PlatformResult<()> {
        self.enter(Call::RoleDelete(role_id)).await?;
        self.with_guild(guild_id, |g| {
            g.roles.remove(&role_id).ok_or_else(unknown_role)?;
            for member in g.members.values_mut() {
                member.revoke(role_id);
            }
            Ok(())
        })
    }

    async fn guild_member_role_add(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.enter(Call::MemberRoleAdd { user_id, role_id }).await?;
        self.with_guild(guild_id, |g| {
            if !g.roles.contains_key(&role_id) {
                return Err(unknown_role());
            }
            let member = g.members.get_mut(&user_id).ok_or_else(unknown_member)?;
            member.grant(role_id);
            Ok(())
        })
    }

    async fn guild_member_role_remove(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.enter(Call::MemberRoleRemove { user_id, role_id }).await?;
        self.with_guild(guild_id, |g| {
            let member = g.members.get_mut(&user_id).ok_or_else(unknown_member)?;
            member.revoke(role_id);
            Ok(())
        })
    }

    async fn channel_message_send(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> PlatformResult<()> {
        self.enter(Call::MessageSend {
            channel_id,
            message: message.clone(),
        })
        .await
    }
}

/// Records presence updates.
#[derive(Default)]
pub struct MockPresence {
    pub watching: Mutex<Vec<String>>,
    pub fail: bool,
}

impl PresenceUpdater for MockPresence {
    fn set_watching(&self, text: &str) -> PlatformResult<()> {
        if self.fail {
            return Err(PlatformError::rest(500, None, "gateway closed"));
        }
        self.watching.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Holds a log level in memory.
#[derive(Default)]
pub struct MockLogControl {
    pub level: Mutex<LogLevel>,
}

impl LogLevelControl for MockLogControl {
    fn current(&self) -> LogLevel {
        *self.level.lock().unwrap()
    }

    fn set_level(&self, level: LogLevel) -> Result<(), ConfigError> {
        *self.level.lock().unwrap() = level;
        Ok(())
    }
}
