//! The reconciliation failure taxonomy.
//!
//! Every failure the voice-state reconciler can observe is one of the variants of
//! [`ReconcileErrorKind`]. Handlers match on the kind; they never look inside the
//! wrapped [`PlatformError`] to decide what to do.

use crate::PlatformError;
use derive_getters::Getters;

/// Failure variants seen by the reconciler.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ReconcileErrorKind {
    /// No role with the given name exists in the guild. Internal control flow only.
    #[display("Role not found: {_0}")]
    RoleNotFound(String),

    /// The member vanished between the event and the lookup.
    #[display("Member not found")]
    MemberNotFound,

    /// The channel vanished between the event and the lookup, or is not a voice channel.
    #[display("Channel not found")]
    ChannelNotFound,

    /// The platform refused the call or a permission pre-check failed.
    #[display("Insufficient permissions")]
    InsufficientPermissions,

    /// The guild hit the platform cap on roles.
    #[display("Maximum number of roles reached")]
    MaxNumberOfRoles,

    /// A platform call outlived its deadline; the outcome is unknown.
    #[display("Deadline exceeded")]
    DeadlineExceeded,

    /// Any other platform failure.
    #[display("Platform failure")]
    Platform,

    /// Several independent operations failed.
    #[display("{} operations failed", _0.len())]
    Aggregate(Vec<ReconcileError>),
}

impl ReconcileErrorKind {
    /// Stable label used for metrics and structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RoleNotFound(_) => "role_not_found",
            Self::MemberNotFound => "member_not_found",
            Self::ChannelNotFound => "channel_not_found",
            Self::InsufficientPermissions => "insufficient_permissions",
            Self::MaxNumberOfRoles => "max_number_of_roles",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Platform => "platform",
            Self::Aggregate(_) => "aggregate",
        }
    }
}

/// Reconciliation error with optional entity context and source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display(
    "Reconcile Error: {}{} at line {} in {}",
    kind,
    render_context(guild, member, channel, source, kind),
    line,
    file
)]
pub struct ReconcileError {
    /// The failure variant
    kind: ReconcileErrorKind,
    /// Guild context, if known
    guild: Option<u64>,
    /// Member context, if known
    member: Option<u64>,
    /// Channel context, if known
    channel: Option<u64>,
    #[getter(skip)]
    source: Option<PlatformError>,
    /// Line where the error was raised
    line: u32,
    /// File where the error was raised
    file: &'static str,
}

fn render_context(
    guild: &Option<u64>,
    member: &Option<u64>,
    channel: &Option<u64>,
    source: &Option<PlatformError>,
    kind: &ReconcileErrorKind,
) -> String {
    let mut out = String::new();
    for (label, id) in [("guild", guild), ("member", member), ("channel", channel)] {
        if let Some(id) = id {
            out.push_str(&format!(" {label}={id}"));
        }
    }
    if let Some(source) = source {
        out.push_str(&format!(": {source}"));
    }
    if let ReconcileErrorKind::Aggregate(errors) = kind {
        for err in errors {
            out.push_str(&format!("; {err}"));
        }
    }
    out
}

impl ReconcileError {
    /// Create a new ReconcileError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use ephemeral_error::{ReconcileError, ReconcileErrorKind};
    ///
    /// let err = ReconcileError::new(ReconcileErrorKind::MemberNotFound).with_guild(42);
    /// assert_eq!(*err.guild(), Some(42));
    /// ```
    #[track_caller]
    pub fn new(kind: ReconcileErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            guild: None,
            member: None,
            channel: None,
            source: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Classify a platform failure.
    ///
    /// This is the only place where platform failures are mapped onto the taxonomy:
    /// an elapsed deadline is `DeadlineExceeded`, HTTP 403 is `InsufficientPermissions`,
    /// the guild/role cap codes are `MaxNumberOfRoles`, and everything else is `Platform`.
    #[track_caller]
    pub fn from_platform(err: PlatformError) -> Self {
        let kind = if err.is_deadline_exceeded() {
            ReconcileErrorKind::DeadlineExceeded
        } else if err.is_forbidden() {
            ReconcileErrorKind::InsufficientPermissions
        } else if err.is_max_roles() {
            ReconcileErrorKind::MaxNumberOfRoles
        } else {
            ReconcileErrorKind::Platform
        };
        let mut classified = Self::new(kind);
        classified.source = Some(err);
        classified
    }

    /// Attach the guild the failure concerns.
    pub fn with_guild(mut self, guild_id: u64) -> Self {
        self.guild = Some(guild_id);
        self
    }

    /// Attach the member the failure concerns.
    pub fn with_member(mut self, user_id: u64) -> Self {
        self.member = Some(user_id);
        self
    }

    /// Attach the channel the failure concerns.
    pub fn with_channel(mut self, channel_id: u64) -> Self {
        self.channel = Some(channel_id);
        self
    }

    /// The platform failure this error was classified from.
    pub fn platform_error(&self) -> Option<&PlatformError> {
        self.source.as_ref()
    }

    /// Expected drift or refusal, logged at debug rather than error.
    pub fn is_classified(&self) -> bool {
        !matches!(
            self.kind,
            ReconcileErrorKind::Platform | ReconcileErrorKind::Aggregate(_)
        )
    }

    /// Whether the member's ephemeral roles should be stripped after this failure.
    ///
    /// A deadline leaves the platform state unknown, so it never triggers cleanup.
    pub fn allows_cleanup(&self) -> bool {
        matches!(
            self.kind,
            ReconcileErrorKind::MemberNotFound
                | ReconcileErrorKind::ChannelNotFound
                | ReconcileErrorKind::InsufficientPermissions
                | ReconcileErrorKind::MaxNumberOfRoles
        )
    }
}

impl From<PlatformError> for ReconcileError {
    #[track_caller]
    fn from(err: PlatformError) -> Self {
        Self::from_platform(err)
    }
}

/// Result type for reconciliation steps.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
