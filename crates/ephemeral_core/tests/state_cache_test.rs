//! Tests for the guild state cache.

use ephemeral_core::{
    Channel, ChannelId, ChannelKind, Guild, GuildId, GuildInfo, Member, OverwriteTarget,
    PermissionOverwrite, Permissions, Role, RoleId, StateCache, UserId,
};
use ephemeral_error::StateErrorKind;
use std::sync::Arc;

const GUILD: GuildId = GuildId::new(100);
const OWNER: UserId = UserId::new(1);
const ALICE: UserId = UserId::new(2);
const BOT: UserId = UserId::new(3);
const GENERAL: ChannelId = ChannelId::new(10);

fn role(id: u64, name: &str, permissions: Permissions) -> Role {
    Role {
        id: RoleId::new(id),
        guild_id: GUILD,
        name: name.to_string(),
        color: 0,
        hoist: false,
        mentionable: false,
        permissions,
        position: 0,
    }
}

fn member(user_id: UserId, role_ids: Vec<RoleId>) -> Member {
    Member {
        user_id,
        guild_id: GUILD,
        username: format!("user-{user_id}"),
        bot: user_id == BOT,
        role_ids,
    }
}

fn seeded_cache() -> StateCache {
    let info = GuildInfo {
        id: GUILD,
        name: "test guild".to_string(),
        owner_id: OWNER,
        member_count: 3,
    };
    let roles = vec![
        role(GUILD.get(), "@everyone", Permissions::VIEW_CHANNEL),
        role(200, "{eph} general", Permissions::NONE),
    ];
    let channels = vec![Channel {
        id: GENERAL,
        guild_id: GUILD,
        name: "general".to_string(),
        kind: ChannelKind::Voice,
        permission_overwrites: vec![],
    }];
    let members = vec![
        member(OWNER, vec![]),
        member(ALICE, vec![RoleId::new(200)]),
        member(BOT, vec![]),
    ];
    let cache = StateCache::new();
    cache.add_guild(Guild::compose(info, roles, channels, members));
    cache
}

#[test]
fn test_lookups_on_unknown_guild_are_none() {
    let cache = StateCache::new();
    assert!(cache.guild(GUILD).is_none());
    assert!(cache.member(GUILD, ALICE).is_none());
    assert!(cache.channel(GUILD, GENERAL).is_none());
    assert!(cache.roles(GUILD).is_none());
}

#[test]
fn test_nested_lookups() {
    let cache = seeded_cache();
    assert_eq!(cache.channel(GUILD, GENERAL).map(|c| c.name), Some("general".to_string()));
    assert!(cache.member(GUILD, ALICE).is_some());
    assert_eq!(
        cache.role_by_name(GUILD, "{eph} general").map(|r| r.id),
        Some(RoleId::new(200))
    );
    assert_eq!(cache.roles(GUILD).map(|r| r.len()), Some(2));
}

#[test]
fn test_remove_role_strips_members() {
    let cache = seeded_cache();
    let removed = cache.remove_role(GUILD, RoleId::new(200)).expect("role cached");
    assert_eq!(removed.name, "{eph} general");
    let alice = cache.member(GUILD, ALICE).expect("alice cached");
    assert!(alice.role_ids.is_empty());
}

#[test]
fn test_remove_missing_role_reports_not_found() {
    let cache = seeded_cache();
    let err = cache
        .remove_role(GUILD, RoleId::new(999))
        .expect_err("role is not cached");
    assert_eq!(
        err.kind(),
        &StateErrorKind::RoleNotFound {
            guild_id: GUILD.get(),
            role_id: 999
        }
    );
}

#[test]
fn test_add_role_requires_guild() {
    let cache = StateCache::new();
    let err = cache
        .add_role(role(5, "orphan", Permissions::NONE))
        .expect_err("guild is not cached");
    assert_eq!(err.kind(), &StateErrorKind::GuildNotFound(GUILD.get()));
}

#[test]
fn test_grant_and_revoke_member_role() {
    let cache = seeded_cache();
    assert!(cache.grant_member_role(GUILD, OWNER, RoleId::new(200)).expect("owner cached"));
    assert!(!cache.grant_member_role(GUILD, OWNER, RoleId::new(200)).expect("owner cached"));
    assert!(cache.revoke_member_role(GUILD, OWNER, RoleId::new(200)).expect("owner cached"));
    assert!(cache.revoke_member_role(GUILD, UserId::new(404), RoleId::new(200)).is_err());
}

#[test]
fn test_member_count_adjustments() {
    let cache = seeded_cache();
    cache.adjust_member_count(GUILD, 2).expect("guild cached");
    assert_eq!(cache.member_count_total(), 5);
    cache.adjust_member_count(GUILD, -10).expect("guild cached");
    assert_eq!(cache.member_count_total(), 0);
}

#[test]
fn test_user_channel_permissions() {
    let cache = seeded_cache();
    let perms = cache
        .user_channel_permissions(GUILD, BOT, GENERAL)
        .expect("everything cached");
    assert!(perms.contains(Permissions::VIEW_CHANNEL));

    let hidden = Channel {
        id: ChannelId::new(11),
        guild_id: GUILD,
        name: "secret".to_string(),
        kind: ChannelKind::Voice,
        permission_overwrites: vec![PermissionOverwrite {
            target: OverwriteTarget::Role(GUILD.everyone_role()),
            allow: Permissions::NONE,
            deny: Permissions::VIEW_CHANNEL,
        }],
    };
    cache.add_channel(hidden).expect("guild cached");
    let perms = cache
        .user_channel_permissions(GUILD, BOT, ChannelId::new(11))
        .expect("everything cached");
    assert!(!perms.contains(Permissions::VIEW_CHANNEL));
}

#[test]
fn test_concurrent_readers_and_writers() {
    let cache = Arc::new(seeded_cache());
    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for j in 0..100u64 {
                    let id = 1_000 + i * 100 + j;
                    cache
                        .add_role(role(id, &format!("r{id}"), Permissions::NONE))
                        .expect("guild cached");
                    assert!(cache.role(GUILD, RoleId::new(id)).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread finished");
    }
    assert_eq!(cache.roles(GUILD).map(|r| r.len()), Some(2 + 800));
}
