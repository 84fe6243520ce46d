//! Conversions from Serenity models to workspace types.

use ephemeral_core::{
    Channel, ChannelId, ChannelKind, Guild, GuildId, GuildInfo, Member, OverwriteTarget,
    PermissionOverwrite, Permissions, Role, RoleId, UserId, VoiceState,
};
use ephemeral_error::{PlatformError, PlatformErrorKind};
use ephemeral_interface::{IncomingMessage, ReadyInfo};
use serenity::http::HttpError;
use serenity::model::channel::{
    ChannelType, GuildChannel, Message, PermissionOverwrite as SerenityOverwrite,
    PermissionOverwriteType,
};
use serenity::model::gateway::Ready;
use serenity::model::guild::{
    Guild as SerenityGuild, Member as SerenityMember, PartialGuild, Role as SerenityRole,
};
use serenity::model::id as sid;
use serenity::model::voice::VoiceState as SerenityVoiceState;

/// Classify a Serenity failure.
///
/// REST failures keep their HTTP status and Discord JSON error code; everything
/// else is a transport or gateway failure.
pub fn platform_error(err: serenity::Error) -> PlatformError {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => PlatformError::rest(
            response.status_code.as_u16(),
            Some(response.error.code as i64),
            response.error.message,
        ),
        serenity::Error::Http(http) => match http.status_code() {
            Some(status) => PlatformError::rest(status.as_u16(), None, http.to_string()),
            None => PlatformError::new(PlatformErrorKind::Transport(http.to_string())),
        },
        serenity::Error::Gateway(gateway) => {
            PlatformError::new(PlatformErrorKind::Gateway(gateway.to_string()))
        }
        other => PlatformError::new(PlatformErrorKind::Transport(other.to_string())),
    }
}

pub(crate) fn guild_id(id: GuildId) -> sid::GuildId {
    sid::GuildId::new(id.get())
}

pub(crate) fn role_id(id: RoleId) -> sid::RoleId {
    sid::RoleId::new(id.get())
}

pub(crate) fn user_id(id: UserId) -> sid::UserId {
    sid::UserId::new(id.get())
}

pub(crate) fn channel_id(id: ChannelId) -> sid::ChannelId {
    sid::ChannelId::new(id.get())
}

pub(crate) fn guild_info(guild: &PartialGuild) -> GuildInfo {
    GuildInfo {
        id: GuildId::new(guild.id.get()),
        name: guild.name.clone(),
        owner_id: UserId::new(guild.owner_id.get()),
        member_count: guild.approximate_member_count.unwrap_or(0),
    }
}

pub(crate) fn role(guild: GuildId, role: &SerenityRole) -> Role {
    Role {
        id: RoleId::new(role.id.get()),
        guild_id: guild,
        name: role.name.clone(),
        color: role.colour.0,
        hoist: role.hoist,
        mentionable: role.mentionable,
        permissions: Permissions::from_bits(role.permissions.bits()),
        position: i64::from(role.position),
    }
}

pub(crate) fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Voice => ChannelKind::Voice,
        ChannelType::Stage => ChannelKind::Stage,
        ChannelType::Text | ChannelType::News => ChannelKind::Text,
        ChannelType::Category => ChannelKind::Category,
        ChannelType::Private => ChannelKind::Private,
        other => ChannelKind::Other(u8::from(other)),
    }
}

fn overwrite(overwrite: &SerenityOverwrite) -> Option<PermissionOverwrite> {
    let target = match overwrite.kind {
        PermissionOverwriteType::Role(id) => OverwriteTarget::Role(RoleId::new(id.get())),
        PermissionOverwriteType::Member(id) => OverwriteTarget::Member(UserId::new(id.get())),
        _ => return None,
    };
    Some(PermissionOverwrite {
        target,
        allow: Permissions::from_bits(overwrite.allow.bits()),
        deny: Permissions::from_bits(overwrite.deny.bits()),
    })
}

pub(crate) fn channel(channel: &GuildChannel) -> Channel {
    Channel {
        id: ChannelId::new(channel.id.get()),
        guild_id: GuildId::new(channel.guild_id.get()),
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
        permission_overwrites: channel
            .permission_overwrites
            .iter()
            .filter_map(overwrite)
            .collect(),
    }
}

pub(crate) fn member(member: &SerenityMember) -> Member {
    Member {
        user_id: UserId::new(member.user.id.get()),
        guild_id: GuildId::new(member.guild_id.get()),
        username: member.user.name.clone(),
        bot: member.user.bot,
        role_ids: member.roles.iter().map(|r| RoleId::new(r.get())).collect(),
    }
}

pub(crate) fn guild(guild: &SerenityGuild) -> Guild {
    let id = GuildId::new(guild.id.get());
    Guild::compose(
        GuildInfo {
            id,
            name: guild.name.clone(),
            owner_id: UserId::new(guild.owner_id.get()),
            member_count: guild.member_count,
        },
        guild.roles.values().map(|r| role(id, r)).collect(),
        guild.channels.values().map(channel).collect(),
        guild.members.values().map(member).collect(),
    )
}

/// A voice state, if it belongs to a guild.
pub(crate) fn voice_state(state: &SerenityVoiceState) -> Option<VoiceState> {
    Some(VoiceState {
        guild_id: GuildId::new(state.guild_id?.get()),
        user_id: UserId::new(state.user_id.get()),
        channel_id: state.channel_id.map(|c| ChannelId::new(c.get())),
    })
}

pub(crate) fn incoming_message(message: &Message) -> IncomingMessage {
    IncomingMessage {
        guild_id: message.guild_id.map(|g| GuildId::new(g.get())),
        channel_id: ChannelId::new(message.channel_id.get()),
        author_id: UserId::new(message.author.id.get()),
        author_bot: message.author.bot,
        content: message.content.clone(),
    }
}

pub(crate) fn ready_info(ready: &Ready) -> ReadyInfo {
    ReadyInfo {
        user_id: UserId::new(ready.user.id.get()),
        username: ready.user.name.clone(),
        guild_count: ready.guilds.len(),
        shard: ready.shard.as_ref().map(|s| (s.id.0, s.total)),
    }
}
