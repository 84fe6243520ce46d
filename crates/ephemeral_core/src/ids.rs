//! Snowflake identifiers.
//!
//! Each entity gets its own newtype so a role id can never be passed where a user id
//! is expected.

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            derive_more::Display,
            derive_more::From,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw snowflake.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// The raw snowflake.
            pub const fn get(self) -> u64 {
                self.0
            }
        }
    };
}

snowflake!(
    /// Guild (server) identifier.
    GuildId
);
snowflake!(
    /// Channel identifier.
    ChannelId
);
snowflake!(
    /// User identifier. Members are keyed by the user id within a guild.
    UserId
);
snowflake!(
    /// Role identifier. The `@everyone` role shares its id with the guild.
    RoleId
);

impl GuildId {
    /// The id of the guild's `@everyone` role.
    pub const fn everyone_role(self) -> RoleId {
        RoleId(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_number() {
        assert_eq!(GuildId::new(1234).to_string(), "1234");
    }

    #[test]
    fn test_everyone_role_matches_guild() {
        assert_eq!(GuildId::new(77).everyone_role(), RoleId::new(77));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&UserId::new(5)).expect("serialize");
        assert_eq!(json, "5");
    }
}
