//! Tests for applying gateway events to the state cache.

use ephemeral_core::{
    Channel, ChannelId, ChannelKind, Guild, GuildId, GuildInfo, Member, Permissions, Role, RoleId,
    StateCache, UserId,
};
use ephemeral_social::StateMirror;
use std::sync::Arc;

const GUILD: GuildId = GuildId::new(100);
const OWNER: UserId = UserId::new(1);
const ALICE: UserId = UserId::new(2);
const BOB: UserId = UserId::new(3);

fn member(user_id: UserId, role_ids: Vec<RoleId>) -> Member {
    Member {
        user_id,
        guild_id: GUILD,
        username: format!("user-{user_id}"),
        bot: false,
        role_ids,
    }
}

fn role(id: u64, name: &str) -> Role {
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

fn voice(id: u64, name: &str) -> Channel {
    Channel {
        id: ChannelId::new(id),
        guild_id: GUILD,
        name: name.to_string(),
        kind: ChannelKind::Voice,
        permission_overwrites: vec![],
    }
}

fn guild() -> Guild {
    Guild::compose(
        GuildInfo {
            id: GUILD,
            name: "test guild".to_string(),
            owner_id: OWNER,
            member_count: 2,
        },
        vec![role(GUILD.get(), "@everyone"), role(10, "{eph} general")],
        vec![voice(20, "general")],
        vec![member(OWNER, vec![]), member(ALICE, vec![RoleId::new(10)])],
    )
}

fn mirror() -> StateMirror {
    let mirror = StateMirror::new(Arc::new(StateCache::new()));
    mirror.guild_available(guild());
    mirror
}

#[test]
fn test_guild_lifecycle() {
    let mirror = mirror();
    assert!(mirror.cache().contains_guild(GUILD));

    // An outage keeps the record.
    mirror.guild_removed(GUILD, true);
    assert!(mirror.cache().contains_guild(GUILD));

    mirror.guild_removed(GUILD, false);
    assert!(!mirror.cache().contains_guild(GUILD));
}

#[test]
fn test_guild_update_replaces_scalars() {
    let mirror = mirror();
    mirror.guild_updated(GuildInfo {
        id: GUILD,
        name: "renamed".to_string(),
        owner_id: ALICE,
        member_count: 2,
    });

    let info = mirror.cache().guild_info(GUILD).unwrap();
    assert_eq!(info.name, "renamed");
    assert_eq!(info.owner_id, ALICE);
    assert!(mirror.cache().member(GUILD, ALICE).is_some());
}

#[test]
fn test_member_join_and_leave_adjust_count() {
    let mirror = mirror();

    mirror.member_added(member(BOB, vec![]));
    assert_eq!(mirror.cache().guild_info(GUILD).unwrap().member_count, 3);

    // A repeated join does not count twice.
    mirror.member_added(member(BOB, vec![]));
    assert_eq!(mirror.cache().guild_info(GUILD).unwrap().member_count, 3);

    mirror.member_removed(GUILD, BOB);
    assert!(mirror.cache().member(GUILD, BOB).is_none());
    assert_eq!(mirror.cache().guild_info(GUILD).unwrap().member_count, 2);
}

#[test]
fn test_uncached_member_leave_still_counts() {
    let mirror = mirror();
    mirror.member_removed(GUILD, UserId::new(77));
    assert_eq!(mirror.cache().guild_info(GUILD).unwrap().member_count, 1);
}

#[test]
fn test_member_update_replaces_roles() {
    let mirror = mirror();
    mirror.member_updated(member(ALICE, vec![]));
    assert!(
        !mirror
            .cache()
            .member(GUILD, ALICE)
            .unwrap()
            .has_role(RoleId::new(10))
    );
}

#[test]
fn test_role_events() {
    let mirror = mirror();

    mirror.role_upserted(role(11, "{eph} gaming"));
    assert_eq!(
        mirror.cache().role_by_name(GUILD, "{eph} gaming").map(|r| r.id),
        Some(RoleId::new(11))
    );

    mirror.role_removed(GUILD, RoleId::new(10));
    assert!(mirror.cache().role(GUILD, RoleId::new(10)).is_none());
    assert!(
        !mirror
            .cache()
            .member(GUILD, ALICE)
            .unwrap()
            .has_role(RoleId::new(10))
    );

    // Already gone: ignored.
    mirror.role_removed(GUILD, RoleId::new(10));
}

#[test]
fn test_channel_events() {
    let mirror = mirror();

    mirror.channel_upserted(voice(21, "gaming"));
    assert!(mirror.cache().channel(GUILD, ChannelId::new(21)).is_some());

    mirror.channel_upserted(voice(21, "music"));
    assert_eq!(
        mirror.cache().channel(GUILD, ChannelId::new(21)).unwrap().name,
        "music"
    );

    mirror.channel_removed(GUILD, ChannelId::new(21));
    assert!(mirror.cache().channel(GUILD, ChannelId::new(21)).is_none());
}

#[test]
fn test_events_for_unknown_guild_are_dropped() {
    let mirror = StateMirror::new(Arc::new(StateCache::new()));

    mirror.member_added(member(BOB, vec![]));
    mirror.role_upserted(role(11, "{eph} gaming"));
    mirror.channel_upserted(voice(21, "gaming"));
    mirror.member_removed(GUILD, BOB);

    assert!(!mirror.cache().contains_guild(GUILD));
    assert_eq!(mirror.cache().guild_count(), 0);
}
