//! Ephemeral role naming.

use serde::{Deserialize, Serialize};

/// Default prefix prepended to synthesized role names.
pub const DEFAULT_ROLE_PREFIX: &str = "{eph}";

/// Default role color (orange, `0xFFA500`).
pub const DEFAULT_ROLE_COLOR: u32 = 16_753_920;

/// How ephemeral roles are named and styled.
///
/// A role is ephemeral when its name starts with the prefix followed by a single
/// space. Nothing else marks it; roles created by the bot carry no other tag.
///
/// # Examples
///
/// ```
/// use ephemeral_core::RoleSettings;
///
/// let settings = RoleSettings::default();
/// assert_eq!(settings.role_name("general"), "{eph} general");
/// assert!(settings.is_ephemeral("{eph} general"));
/// assert!(!settings.is_ephemeral("{eph}general"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSettings {
    prefix: String,
    color: u32,
}

impl RoleSettings {
    /// Create settings from a prefix and a decimal RGB color.
    pub fn new(prefix: impl Into<String>, color: u32) -> Self {
        Self {
            prefix: prefix.into(),
            color,
        }
    }

    /// The configured prefix, without the trailing space.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Color given to created roles.
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Name of the ephemeral role for a voice channel.
    pub fn role_name(&self, channel_name: &str) -> String {
        format!("{} {}", self.prefix, channel_name)
    }

    /// Whether a role name identifies an ephemeral role.
    pub fn is_ephemeral(&self, role_name: &str) -> bool {
        role_name
            .strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with(' '))
    }
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_PREFIX, DEFAULT_ROLE_COLOR)
    }
}
