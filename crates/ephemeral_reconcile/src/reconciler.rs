//! Event handlers that keep ephemeral roles in step with voice channels.

use crate::{KeyedSingleflight, OperationsGateway};
use ephemeral_core::{
    Channel, GuildId, Member, Permissions, Role, RoleId, StateCache, UserId, VoiceState,
};
use ephemeral_error::{ReconcileError, ReconcileErrorKind, ReconcileResult};
use ephemeral_interface::{PlatformClient, PresenceUpdater, ReadyInfo};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What a voice-state reconciliation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// The member already held the right role.
    Unchanged,
    /// Roles were removed and/or added.
    Updated {
        /// Stale ephemeral roles taken from the member
        removed: Vec<RoleId>,
        /// The ephemeral role given to the member, if they are in a voice channel
        added: Option<RoleId>,
    },
}

/// Find a role by exact name.
///
/// Sorts the list by name and binary-searches it. A miss is reported as
/// [`ReconcileErrorKind::RoleNotFound`], which callers treat as "create it".
///
/// # Examples
///
/// ```
/// use ephemeral_core::{GuildId, Permissions, Role, RoleId};
/// use ephemeral_reconcile::lookup_role_by_name;
///
/// let role = |id, name: &str| Role {
///     id: RoleId::new(id),
///     guild_id: GuildId::new(1),
///     name: name.to_string(),
///     color: 0,
///     hoist: false,
///     mentionable: false,
///     permissions: Permissions::NONE,
///     position: 0,
/// };
/// let roles = vec![role(3, "{eph} gaming"), role(2, "{eph} general")];
///
/// assert_eq!(lookup_role_by_name(roles.clone(), "{eph} general").unwrap().id, RoleId::new(2));
/// assert!(lookup_role_by_name(roles, "{eph} music").is_err());
/// ```
pub fn lookup_role_by_name(mut roles: Vec<Role>, name: &str) -> ReconcileResult<Role> {
    roles.sort_by(|a, b| a.name.cmp(&b.name));
    match roles.binary_search_by(|role| role.name.as_str().cmp(name)) {
        Ok(index) => Ok(roles.swap_remove(index)),
        Err(_) => Err(ReconcileError::new(ReconcileErrorKind::RoleNotFound(
            name.to_string(),
        ))),
    }
}

/// Handles voice-state, channel-delete and ready events.
///
/// Handlers never fail outward: every error is classified, logged, counted, and
/// where safe followed by a best-effort cleanup of the member's ephemeral roles.
///
/// Voice-state handling for one member is serialized: the member's roles are read
/// and changed by one event at a time.
pub struct Reconciler<P: PlatformClient> {
    gateway: Arc<OperationsGateway<P>>,
    keyword: String,
    members: KeyedSingleflight<(GuildId, UserId)>,
}

impl<P: PlatformClient> Reconciler<P> {
    /// Creates a reconciler. `keyword` is shown as the bot's "watching" status.
    pub fn new(gateway: Arc<OperationsGateway<P>>, keyword: impl Into<String>) -> Self {
        Self {
            gateway,
            keyword: keyword.into(),
            members: KeyedSingleflight::new(),
        }
    }

    /// The gateway all mutations go through.
    pub fn gateway(&self) -> &Arc<OperationsGateway<P>> {
        &self.gateway
    }

    fn cache(&self) -> &StateCache {
        self.gateway.cache()
    }

    // ============================================================================
    // Voice state
    // ============================================================================

    /// Handle a voice-state event, logging instead of returning failures.
    #[instrument(
        skip(self, state),
        fields(
            guild_id = %state.guild_id,
            user_id = %state.user_id,
            channel_id = ?state.channel_id.map(|c| c.get())
        )
    )]
    pub async fn handle_voice_state(&self, state: &VoiceState) {
        // Held through cleanup so a newer event cannot interleave with it.
        let _member = self.members.acquire((state.guild_id, state.user_id)).await;
        let err = match self.reconcile_member(state).await {
            Ok(VoiceOutcome::Unchanged) => {
                debug!("Member already holds the right role");
                return;
            }
            Ok(VoiceOutcome::Updated { removed, added }) => {
                debug!(removed = removed.len(), added = ?added.map(|r| r.get()), "Reconciled voice state");
                return;
            }
            Err(err) => err,
        };

        self.gateway.metrics().record_error(err.kind().label());
        if err.is_classified() {
            debug!(error = %err, kind = err.kind().label(), "Voice state not reconciled");
        } else {
            error!(error = %err, kind = err.kind().label(), "Voice state reconciliation failed");
        }

        if !err.allows_cleanup() {
            return;
        }
        let Some(member) = self.cache().member(state.guild_id, state.user_id) else {
            return;
        };
        match self.remove_ephemeral_roles(&member).await {
            Ok(removed) if !removed.is_empty() => {
                debug!(removed = removed.len(), "Cleaned up ephemeral roles");
            }
            Ok(_) => {}
            Err(cleanup) => {
                self.gateway.metrics().record_error(cleanup.kind().label());
                warn!(error = %cleanup, "Ephemeral role cleanup failed");
            }
        }
    }

    /// Bring a member's ephemeral role in line with their voice state.
    ///
    /// Resolves the guild, member and channel, resolves or creates the desired role,
    /// short-circuits if it is already held, removes every other ephemeral role, then
    /// adds the desired one. Removal failures do not prevent the add; they are
    /// reported after it.
    ///
    /// # Errors
    ///
    /// - `MemberNotFound` / `ChannelNotFound` when the entity is not in the guild
    /// - `InsufficientPermissions` when the bot cannot see the channel or the platform
    ///   refuses a call
    /// - `MaxNumberOfRoles`, `DeadlineExceeded`, `Platform` from platform calls
    /// - `Aggregate` when several mutations failed
    pub async fn reconcile_voice_state(&self, state: &VoiceState) -> ReconcileResult<VoiceOutcome> {
        let _member = self.members.acquire((state.guild_id, state.user_id)).await;
        self.reconcile_member(state).await
    }

    /// Steps of [`Self::reconcile_voice_state`]; the caller holds the member's slot.
    async fn reconcile_member(&self, state: &VoiceState) -> ReconcileResult<VoiceOutcome> {
        let guild_id = state.guild_id;
        let context = |err: ReconcileError| {
            let err = err.with_guild(guild_id.get()).with_member(state.user_id.get());
            match state.channel_id {
                Some(channel_id) => err.with_channel(channel_id.get()),
                None => err,
            }
        };

        // Resolve context.
        self.gateway.lookup_guild(guild_id).await.map_err(context)?;
        let member = self
            .cache()
            .member(guild_id, state.user_id)
            .ok_or_else(|| context(ReconcileError::new(ReconcileErrorKind::MemberNotFound)))?;
        let channel = match state.channel_id {
            Some(channel_id) => {
                let channel = self
                    .cache()
                    .channel(guild_id, channel_id)
                    .filter(Channel::is_voice)
                    .ok_or_else(|| {
                        context(ReconcileError::new(ReconcileErrorKind::ChannelNotFound))
                    })?;
                self.check_view_channel(&channel).map_err(context)?;
                Some(channel)
            }
            None => None,
        };

        // Resolve the desired role.
        let desired = match &channel {
            Some(channel) => Some(self.resolve_role(guild_id, channel).await.map_err(context)?),
            None => None,
        };

        if let Some(role) = &desired
            && member.has_role(role.id)
        {
            return Ok(VoiceOutcome::Unchanged);
        }

        let (removed, mut failures) = self.remove_stale(&member).await;

        let mut added = None;
        if let Some(role) = desired {
            match self
                .gateway
                .add_role_to_member(guild_id, member.user_id, role.id)
                .await
            {
                Ok(()) => added = Some(role.id),
                Err(err) => failures.push(err),
            }
        }

        match fold_failures(failures) {
            Some(err) => Err(context(err)),
            None => Ok(VoiceOutcome::Updated { removed, added }),
        }
    }

    /// Fails with `InsufficientPermissions` if the bot cannot view the channel.
    ///
    /// Skipped when the bot's own member record is not cached yet; the platform then
    /// has the final word.
    fn check_view_channel(&self, channel: &Channel) -> ReconcileResult<()> {
        let Some(bot) = self.cache().current_user() else {
            return Ok(());
        };
        match self
            .cache()
            .user_channel_permissions(channel.guild_id, bot, channel.id)
        {
            Ok(perms) if perms.contains(Permissions::VIEW_CHANNEL) => Ok(()),
            Ok(_) => Err(ReconcileError::new(
                ReconcileErrorKind::InsufficientPermissions,
            )),
            Err(err) => {
                debug!(error = %err, "Permission pre-check skipped");
                Ok(())
            }
        }
    }

    async fn resolve_role(&self, guild_id: GuildId, channel: &Channel) -> ReconcileResult<Role> {
        let name = self.gateway.role_settings().role_name(&channel.name);
        let roles = self.cache().roles(guild_id).unwrap_or_default();
        match lookup_role_by_name(roles, &name) {
            Ok(role) => Ok(role),
            Err(err) if matches!(err.kind(), ReconcileErrorKind::RoleNotFound(_)) => {
                self.gateway.create_role(guild_id, &name).await
            }
            Err(err) => Err(err),
        }
    }

    /// Take every ephemeral role from a member.
    ///
    /// A forbidden removal counts as done. Returns the roles removed.
    ///
    /// # Errors
    ///
    /// The single failure, or `Aggregate` if several removals failed.
    pub async fn remove_ephemeral_roles(&self, member: &Member) -> ReconcileResult<Vec<RoleId>> {
        let (removed, failures) = self.remove_stale(member).await;
        match fold_failures(failures) {
            Some(err) => Err(err.with_guild(member.guild_id.get())),
            None => Ok(removed),
        }
    }

    async fn remove_stale(&self, member: &Member) -> (Vec<RoleId>, Vec<ReconcileError>) {
        let settings = self.gateway.role_settings();
        let stale: Vec<Role> = member
            .role_ids
            .iter()
            .filter_map(|role_id| self.cache().role(member.guild_id, *role_id))
            .filter(|role| settings.is_ephemeral(&role.name))
            .collect();

        let mut removed = Vec::with_capacity(stale.len());
        let mut failures = Vec::new();
        for role in stale {
            match self
                .gateway
                .remove_role_from_member(member.guild_id, member.user_id, role.id)
                .await
            {
                Ok(()) => removed.push(role.id),
                Err(err) if matches!(err.kind(), ReconcileErrorKind::InsufficientPermissions) => {
                    debug!(role_id = %role.id, "Removal forbidden, treating role as absent");
                    removed.push(role.id);
                }
                Err(err) => failures.push(err),
            }
        }
        (removed, failures)
    }

    // ============================================================================
    // Channel delete
    // ============================================================================

    /// Handle a channel deletion, logging instead of returning failures.
    #[instrument(skip(self, channel), fields(guild_id = %channel.guild_id, channel_id = %channel.id))]
    pub async fn handle_channel_delete(&self, channel: &Channel) {
        match self.on_channel_delete(channel).await {
            Ok(deleted) if !deleted.is_empty() => {
                info!(deleted = deleted.len(), channel_name = %channel.name, "Deleted ephemeral role");
            }
            Ok(_) => debug!("No ephemeral role for deleted channel"),
            Err(err) => {
                self.gateway.metrics().record_error(err.kind().label());
                error!(error = %err, "Ephemeral role cleanup after channel delete failed");
            }
        }
    }

    /// Delete the ephemeral role of a deleted voice channel.
    ///
    /// Every role carrying the channel's ephemeral name is deleted on the platform and
    /// dropped from the cache. A role the platform or the cache no longer knows counts
    /// as deleted. Non-voice channels are ignored.
    ///
    /// # Errors
    ///
    /// The single failure, or `Aggregate` if several deletions failed.
    pub async fn on_channel_delete(&self, channel: &Channel) -> ReconcileResult<Vec<RoleId>> {
        if !channel.is_voice() {
            return Ok(Vec::new());
        }
        let guild_id = channel.guild_id;
        self.gateway
            .lookup_guild(guild_id)
            .await
            .map_err(|e| e.with_channel(channel.id.get()))?;

        let name = self.gateway.role_settings().role_name(&channel.name);
        let targets: Vec<RoleId> = self
            .cache()
            .roles(guild_id)
            .unwrap_or_default()
            .into_iter()
            .filter(|role| role.name == name)
            .map(|role| role.id)
            .collect();

        let mut deleted = Vec::with_capacity(targets.len());
        let mut failures = Vec::new();
        for role_id in targets {
            match self.gateway.delete_role(guild_id, role_id).await {
                Ok(()) => {}
                Err(err) if err.platform_error().is_some_and(|p| p.is_not_found()) => {
                    debug!(role_id = %role_id, "Role already gone on the platform");
                }
                Err(err) => {
                    failures.push(err.with_channel(channel.id.get()));
                    continue;
                }
            }
            if let Err(err) = self.cache().remove_role(guild_id, role_id) {
                debug!(error = %err, "Deleted role was not cached");
            }
            deleted.push(role_id);
        }

        match fold_failures(failures) {
            Some(err) => Err(err),
            None => Ok(deleted),
        }
    }

    // ============================================================================
    // Ready
    // ============================================================================

    /// Handle a session becoming ready: remember who we are and show the keyword as
    /// the bot's status.
    #[instrument(skip(self, ready, presence), fields(user_id = %ready.user_id))]
    pub fn handle_ready(&self, ready: &ReadyInfo, presence: &dyn PresenceUpdater) {
        self.cache().set_current_user(ready.user_id);
        info!(
            username = %ready.username,
            guilds = ready.guild_count,
            shard = ?ready.shard,
            "Session ready"
        );
        if let Err(err) = presence.set_watching(&self.keyword) {
            error!(error = %err, "Failed to update status");
        }
    }
}

fn fold_failures(mut failures: Vec<ReconcileError>) -> Option<ReconcileError> {
    match failures.len() {
        0 => None,
        1 => failures.pop(),
        _ => Some(ReconcileError::new(ReconcileErrorKind::Aggregate(failures))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephemeral_core::{GuildId, Permissions};

    fn role(id: u64, name: &str) -> Role {
        Role {
            id: RoleId::new(id),
            guild_id: GuildId::new(1),
            name: name.to_string(),
            color: 0,
            hoist: false,
            mentionable: false,
            permissions: Permissions::NONE,
            position: 0,
        }
    }

    #[test]
    fn test_lookup_role_by_name_finds_exact_match() {
        let roles = vec![
            role(5, "{eph} zeta"),
            role(4, "@everyone"),
            role(3, "{eph} alpha"),
            role(2, "{eph} alpha 2"),
        ];
        let found = lookup_role_by_name(roles, "{eph} alpha").unwrap();
        assert_eq!(found.id, RoleId::new(3));
    }

    #[test]
    fn test_lookup_role_by_name_miss_is_role_not_found() {
        let err = lookup_role_by_name(vec![role(1, "{eph} a")], "{eph} b").unwrap_err();
        assert!(matches!(err.kind(), ReconcileErrorKind::RoleNotFound(name) if name == "{eph} b"));
        assert!(lookup_role_by_name(Vec::new(), "anything").is_err());
    }

    #[test]
    fn test_fold_failures() {
        assert!(fold_failures(Vec::new()).is_none());

        let single = fold_failures(vec![ReconcileError::new(ReconcileErrorKind::MemberNotFound)])
            .unwrap();
        assert!(matches!(single.kind(), ReconcileErrorKind::MemberNotFound));

        let many = fold_failures(vec![
            ReconcileError::new(ReconcileErrorKind::Platform),
            ReconcileError::new(ReconcileErrorKind::DeadlineExceeded),
        ])
        .unwrap();
        assert!(matches!(many.kind(), ReconcileErrorKind::Aggregate(errs) if errs.len() == 2));
        assert!(!many.is_classified());
    }
}
