//! Serenity event handler.

use super::SerenityPlatform;
use super::conversions;
use crate::StateMirror;
use async_trait::async_trait;
use ephemeral_core::{GuildId, RoleId, UserId};
use ephemeral_error::PlatformResult;
use ephemeral_interface::PresenceUpdater;
use ephemeral_reconcile::{CommandHandler, ReconcileMetrics, Reconciler};
use serenity::all::{
    Context, EventHandler, GatewayIntents, Guild, GuildChannel, GuildMemberUpdateEvent, Member,
    Message, PartialGuild, Ready, Role, UnavailableGuild, User, VoiceState,
};
use serenity::gateway::ActivityData;
use serenity::model::id as sid;
use std::sync::Arc;
use tracing::debug;

/// Shows the bot's status on the shard that delivered an event.
pub struct ContextPresence<'a>(pub &'a Context);

impl PresenceUpdater for ContextPresence<'_> {
    fn set_watching(&self, text: &str) -> PlatformResult<()> {
        self.0.set_activity(Some(ActivityData::watching(text)));
        Ok(())
    }
}

/// Routes Discord gateway events.
///
/// Guild, member, role and channel events go to the [`StateMirror`]; voice-state,
/// channel-delete and ready events to the [`Reconciler`]; messages to the
/// [`CommandHandler`]. Every event is counted.
pub struct EphemeralHandler {
    reconciler: Arc<Reconciler<SerenityPlatform>>,
    commands: Arc<CommandHandler<SerenityPlatform>>,
    mirror: StateMirror,
    metrics: ReconcileMetrics,
}

impl EphemeralHandler {
    /// Creates a handler.
    pub fn new(
        reconciler: Arc<Reconciler<SerenityPlatform>>,
        commands: Arc<CommandHandler<SerenityPlatform>>,
    ) -> Self {
        let gateway = reconciler.gateway();
        let mirror = StateMirror::new(Arc::clone(gateway.cache()));
        let metrics = gateway.metrics().clone();
        Self {
            reconciler,
            commands,
            mirror,
            metrics,
        }
    }

    /// Gateway intents the handler needs.
    ///
    /// Member and message-content intents are privileged and must be enabled for the
    /// application in the developer portal.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::MESSAGE_CONTENT
    }
}

fn guild_id(id: sid::GuildId) -> GuildId {
    GuildId::new(id.get())
}

#[async_trait]
impl EventHandler for EphemeralHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.metrics.record_event("ready");
        let info = conversions::ready_info(&ready);
        self.reconciler.handle_ready(&info, &ContextPresence(&ctx));
    }

    async fn voice_state_update(&self, _ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        self.metrics.record_event("voice_state_update");
        let Some(state) = conversions::voice_state(&new) else {
            debug!("Ignoring voice state outside a guild");
            return;
        };
        if let Some(member) = &new.member {
            self.mirror.member_updated(conversions::member(member));
        }
        self.reconciler.handle_voice_state(&state).await;
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        self.metrics.record_event("channel_delete");
        let channel = conversions::channel(&channel);
        self.reconciler.handle_channel_delete(&channel).await;
        self.mirror.channel_removed(channel.guild_id, channel.id);
    }

    async fn message(&self, _ctx: Context, message: Message) {
        self.metrics.record_event("message_create");
        let message = conversions::incoming_message(&message);
        self.commands.handle_message(&message).await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        self.metrics.record_event("guild_create");
        self.mirror.guild_available(conversions::guild(&guild));
    }

    async fn guild_update(&self, _ctx: Context, _old: Option<Guild>, new: PartialGuild) {
        self.metrics.record_event("guild_update");
        let mut info = conversions::guild_info(&new);
        // Partial updates carry no member count; keep the cached one.
        if let Some(cached) = self.mirror.cache().guild_info(info.id) {
            info.member_count = cached.member_count;
        }
        self.mirror.guild_updated(info);
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        self.metrics.record_event("guild_delete");
        self.mirror
            .guild_removed(guild_id(incomplete.id), incomplete.unavailable);
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        self.metrics.record_event("guild_member_add");
        self.mirror.member_added(conversions::member(&new_member));
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild: sid::GuildId,
        user: User,
        _member: Option<Member>,
    ) {
        self.metrics.record_event("guild_member_remove");
        self.mirror
            .member_removed(guild_id(guild), UserId::new(user.id.get()));
    }

    async fn guild_member_update(
        &self,
        _ctx: Context,
        _old: Option<Member>,
        new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        self.metrics.record_event("guild_member_update");
        match new {
            Some(member) => self.mirror.member_updated(conversions::member(&member)),
            None => {
                let guild = guild_id(event.guild_id);
                let user = UserId::new(event.user.id.get());
                if let Some(mut member) = self.mirror.cache().member(guild, user) {
                    member.username = event.user.name.clone();
                    member.role_ids = event.roles.iter().map(|r| RoleId::new(r.get())).collect();
                    self.mirror.member_updated(member);
                }
            }
        }
    }

    async fn guild_role_create(&self, _ctx: Context, new: Role) {
        self.metrics.record_event("guild_role_create");
        self.mirror
            .role_upserted(conversions::role(guild_id(new.guild_id), &new));
    }

    async fn guild_role_update(&self, _ctx: Context, _old: Option<Role>, new: Role) {
        self.metrics.record_event("guild_role_update");
        self.mirror
            .role_upserted(conversions::role(guild_id(new.guild_id), &new));
    }

    async fn guild_role_delete(
        &self,
        _ctx: Context,
        guild: sid::GuildId,
        removed: sid::RoleId,
        _role: Option<Role>,
    ) {
        self.metrics.record_event("guild_role_delete");
        self.mirror
            .role_removed(guild_id(guild), RoleId::new(removed.get()));
    }

    async fn channel_create(&self, _ctx: Context, channel: GuildChannel) {
        self.metrics.record_event("channel_create");
        self.mirror.channel_upserted(conversions::channel(&channel));
    }

    async fn channel_update(&self, _ctx: Context, _old: Option<GuildChannel>, new: GuildChannel) {
        self.metrics.record_event("channel_update");
        let channel = conversions::channel(&new);
        debug!(channel_id = %channel.id, channel_name = %channel.name, "Channel updated");
        self.mirror.channel_upserted(channel);
    }
}
