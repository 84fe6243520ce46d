//! The operations gateway: the single front door for platform calls.

use crate::{KeyedSingleflight, ReconcileMetrics};
use ephemeral_core::{
    ChannelId, Guild, GuildId, GuildInfo, Member, Role, RoleId, RoleSettings, StateCache, UserId,
};
use ephemeral_error::{
    PlatformError, PlatformErrorKind, PlatformResult, ReconcileError, ReconcileResult,
};
use ephemeral_interface::{MEMBER_PAGE_LIMIT, OutgoingMessage, PlatformClient, RoleEdit};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Deadline applied to every platform call unless configured otherwise.
pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FlightKey {
    Guild(GuildId),
    Role(GuildId, String),
}

/// Every platform call the reconciler makes goes through here.
///
/// The gateway:
/// - wraps each call in the configured deadline, abandoning the request when it
///   elapses,
/// - classifies failures into [`ReconcileError`] variants,
/// - mirrors successful mutations into the [`StateCache`],
/// - lets at most one role creation per `(guild, name)` and one guild fetch per
///   guild be in flight; later callers wait and then read the result from the cache.
pub struct OperationsGateway<P: PlatformClient> {
    platform: Arc<P>,
    cache: Arc<StateCache>,
    roles: RoleSettings,
    deadline: Duration,
    flights: KeyedSingleflight<FlightKey>,
    metrics: ReconcileMetrics,
}

impl<P: PlatformClient> OperationsGateway<P> {
    /// Creates a gateway over a platform client and a state cache.
    pub fn new(
        platform: Arc<P>,
        cache: Arc<StateCache>,
        roles: RoleSettings,
        deadline: Duration,
        metrics: ReconcileMetrics,
    ) -> Self {
        Self {
            platform,
            cache,
            roles,
            deadline,
            flights: KeyedSingleflight::new(),
            metrics,
        }
    }

    /// The state cache this gateway keeps in step.
    pub fn cache(&self) -> &Arc<StateCache> {
        &self.cache
    }

    /// Ephemeral role naming and styling.
    pub fn role_settings(&self) -> &RoleSettings {
        &self.roles
    }

    /// The platform client.
    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }

    /// Metrics shared with the reconciler.
    pub fn metrics(&self) -> &ReconcileMetrics {
        &self.metrics
    }

    /// Per-call deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run one platform call under the deadline.
    async fn call<T>(&self, fut: impl Future<Output = PlatformResult<T>>) -> PlatformResult<T> {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(PlatformError::new(PlatformErrorKind::DeadlineExceeded(
                self.deadline.as_millis() as u64,
            ))),
        }
    }

    /// Resolve a guild, fetching and installing it if it is not cached.
    ///
    /// A fetch reads the guild, its roles, its channels, and every member page. The
    /// composed record is installed only if every read succeeded.
    #[instrument(skip(self), fields(guild_id = %guild_id))]
    pub async fn lookup_guild(&self, guild_id: GuildId) -> ReconcileResult<GuildInfo> {
        if let Some(info) = self.cache.guild_info(guild_id) {
            return Ok(info);
        }

        let _flight = self.flights.acquire(FlightKey::Guild(guild_id)).await;
        if let Some(info) = self.cache.guild_info(guild_id) {
            debug!("Guild installed by a concurrent lookup");
            return Ok(info);
        }

        let guild = self
            .fetch_guild(guild_id)
            .await
            .map_err(|e| ReconcileError::from_platform(e).with_guild(guild_id.get()))?;
        let info = GuildInfo {
            id: guild.id,
            name: guild.name.clone(),
            owner_id: guild.owner_id,
            member_count: guild.member_count,
        };
        info!(
            guild_name = %guild.name,
            roles = guild.roles.len(),
            channels = guild.channels.len(),
            members = guild.members.len(),
            "Fetched unknown guild"
        );
        self.cache.add_guild(guild);
        Ok(info)
    }

    async fn fetch_guild(&self, guild_id: GuildId) -> PlatformResult<Guild> {
        let info = self.call(self.platform.guild(guild_id)).await?;
        let roles = self.call(self.platform.guild_roles(guild_id)).await?;
        let channels = self.call(self.platform.guild_channels(guild_id)).await?;
        let members = self.fetch_members(guild_id).await?;
        Ok(Guild::compose(info, roles, channels, members))
    }

    /// Read every member page, each under its own deadline.
    async fn fetch_members(&self, guild_id: GuildId) -> PlatformResult<Vec<Member>> {
        let mut members = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = self
                .call(
                    self.platform
                        .guild_members(guild_id, after, MEMBER_PAGE_LIMIT),
                )
                .await?;
            let page_len = page.len();
            after = page.iter().map(|m| m.user_id).max();
            members.extend(page);
            debug!(page_len, total = members.len(), "Fetched member page");
            if page_len < usize::from(MEMBER_PAGE_LIMIT) {
                return Ok(members);
            }
        }
    }

    /// Create an ephemeral role named `name`, or return the one a concurrent caller
    /// just created.
    ///
    /// The platform call sequence is create-blank then edit-in-place. If the edit
    /// fails the blank role is left behind on the platform.
    #[instrument(skip(self), fields(guild_id = %guild_id, role_name = %name))]
    pub async fn create_role(&self, guild_id: GuildId, name: &str) -> ReconcileResult<Role> {
        let _flight = self
            .flights
            .acquire(FlightKey::Role(guild_id, name.to_string()))
            .await;
        if let Some(role) = self.cache.role_by_name(guild_id, name) {
            debug!(role_id = %role.id, "Role created by a concurrent caller");
            return Ok(role);
        }

        let result = self.create_role_uncached(guild_id, name).await;
        self.metrics.record_role_operation("create", result.is_ok());
        let role = result.map_err(|e| ReconcileError::from_platform(e).with_guild(guild_id.get()))?;

        if let Err(err) = self.cache.add_role(role.clone()) {
            warn!(error = %err, "Created role for a guild missing from the cache");
        }
        info!(role_id = %role.id, "Created ephemeral role");
        Ok(role)
    }

    async fn create_role_uncached(&self, guild_id: GuildId, name: &str) -> PlatformResult<Role> {
        let blank = self.call(self.platform.guild_role_create(guild_id)).await?;
        let edit = RoleEdit {
            name: name.to_string(),
            color: self.roles.color(),
            hoist: true,
            mentionable: true,
            permissions: blank.permissions,
        };
        self.call(self.platform.guild_role_edit(guild_id, blank.id, &edit))
            .await
    }

    /// Give a member a role and record it in the cache.
    #[instrument(skip(self), fields(guild_id = %guild_id, user_id = %user_id, role_id = %role_id))]
    pub async fn add_role_to_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> ReconcileResult<()> {
        let result = self
            .call(
                self.platform
                    .guild_member_role_add(guild_id, user_id, role_id),
            )
            .await;
        self.metrics.record_role_operation("add", result.is_ok());
        result.map_err(|e| {
            ReconcileError::from_platform(e)
                .with_guild(guild_id.get())
                .with_member(user_id.get())
        })?;

        if let Err(err) = self.cache.grant_member_role(guild_id, user_id, role_id) {
            debug!(error = %err, "Granted role to a member missing from the cache");
        }
        Ok(())
    }

    /// Take a role from a member and record it in the cache.
    #[instrument(skip(self), fields(guild_id = %guild_id, user_id = %user_id, role_id = %role_id))]
    pub async fn remove_role_from_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> ReconcileResult<()> {
        let result = self
            .call(
                self.platform
                    .guild_member_role_remove(guild_id, user_id, role_id),
            )
            .await;
        self.metrics.record_role_operation("remove", result.is_ok());
        result.map_err(|e| {
            ReconcileError::from_platform(e)
                .with_guild(guild_id.get())
                .with_member(user_id.get())
        })?;

        if let Err(err) = self.cache.revoke_member_role(guild_id, user_id, role_id) {
            debug!(error = %err, "Revoked role from a member missing from the cache");
        }
        Ok(())
    }

    /// Delete a role on the platform. The caller updates the cache.
    #[instrument(skip(self), fields(guild_id = %guild_id, role_id = %role_id))]
    pub async fn delete_role(&self, guild_id: GuildId, role_id: RoleId) -> ReconcileResult<()> {
        let result = self
            .call(self.platform.guild_role_delete(guild_id, role_id))
            .await;
        self.metrics.record_role_operation("delete", result.is_ok());
        result.map_err(|e| ReconcileError::from_platform(e).with_guild(guild_id.get()))
    }

    /// Post a message to a channel.
    #[instrument(skip(self, message), fields(channel_id = %channel_id))]
    pub async fn send_message(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> ReconcileResult<()> {
        self.call(self.platform.channel_message_send(channel_id, message))
            .await
            .map_err(|e| ReconcileError::from_platform(e).with_channel(channel_id.get()))
    }
}
