//! State cache errors.

use derive_getters::Getters;

/// Conditions reported by state cache writes. Every write fails only because the
/// entity it targets is not cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StateErrorKind {
    /// The guild is not present in the cache.
    #[display("Guild not found: {_0}")]
    GuildNotFound(u64),

    /// The role is not present in the guild.
    #[display("Role not found: {role_id} in guild {guild_id}")]
    RoleNotFound {
        /// Guild that was searched
        guild_id: u64,
        /// Role that was missing
        role_id: u64,
    },

    /// The channel is not present in the guild.
    #[display("Channel not found: {channel_id} in guild {guild_id}")]
    ChannelNotFound {
        /// Guild that was searched
        guild_id: u64,
        /// Channel that was missing
        channel_id: u64,
    },

    /// The member is not present in the guild.
    #[display("Member not found: {user_id} in guild {guild_id}")]
    MemberNotFound {
        /// Guild that was searched
        guild_id: u64,
        /// Member that was missing
        user_id: u64,
    },
}

/// State cache error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("State Error: {} at line {} in {}", kind, line, file)]
pub struct StateError {
    kind: StateErrorKind,
    line: u32,
    file: &'static str,
}

impl StateError {
    /// Create a new StateError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StateErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

}

/// Result type for state cache operations.
pub type StateResult<T> = Result<T, StateError>;
