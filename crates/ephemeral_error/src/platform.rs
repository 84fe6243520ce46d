//! Chat platform REST errors.
//!
//! A [`PlatformError`] is what the platform client returns for any failed call. It
//! keeps the two facts the rest of the bot needs to classify a failure: the HTTP status
//! and the platform's JSON error code.

use derive_getters::Getters;

/// Platform error code: maximum number of guilds reached.
pub const CODE_MAX_GUILDS: i64 = 30001;

/// Platform error code: maximum number of guild roles reached.
pub const CODE_MAX_ROLES: i64 = 30005;

/// Platform failure variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PlatformErrorKind {
    /// The platform answered with a non-success status.
    #[display("HTTP {status} (code {code:?}): {message}")]
    Rest {
        /// HTTP status code
        status: u16,
        /// Platform JSON error code, when the body carried one
        code: Option<i64>,
        /// Platform error message
        message: String,
    },

    /// The request never produced a response (connect, TLS, decode).
    #[display("Transport error: {_0}")]
    Transport(String),

    /// The caller's deadline elapsed before the call completed.
    #[display("Deadline exceeded after {_0} ms")]
    DeadlineExceeded(u64),

    /// The gateway connection failed or was closed.
    #[display("Gateway error: {_0}")]
    Gateway(String),
}

/// Platform error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Platform Error: {} at line {} in {}", kind, line, file)]
pub struct PlatformError {
    kind: PlatformErrorKind,
    line: u32,
    file: &'static str,
}

impl PlatformError {
    /// Create a new PlatformError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use ephemeral_error::{PlatformError, PlatformErrorKind};
    ///
    /// let err = PlatformError::new(PlatformErrorKind::Rest {
    ///     status: 403,
    ///     code: Some(50013),
    ///     message: "Missing Permissions".to_string(),
    /// });
    /// assert!(err.is_forbidden());
    /// ```
    #[track_caller]
    pub fn new(kind: PlatformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a REST failure.
    #[track_caller]
    pub fn rest(status: u16, code: Option<i64>, message: impl Into<String>) -> Self {
        Self::new(PlatformErrorKind::Rest {
            status,
            code,
            message: message.into(),
        })
    }

    /// HTTP status of the failed call, if the platform answered.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            PlatformErrorKind::Rest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Platform JSON error code, if the platform answered with one.
    pub fn code(&self) -> Option<i64> {
        match &self.kind {
            PlatformErrorKind::Rest { code, .. } => *code,
            _ => None,
        }
    }

    /// The platform refused the call (HTTP 403).
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// The platform refused the call because a guild or role cap was reached.
    pub fn is_max_roles(&self) -> bool {
        matches!(self.code(), Some(CODE_MAX_GUILDS) | Some(CODE_MAX_ROLES))
    }

    /// The entity addressed by the call does not exist (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The call was abandoned because its deadline elapsed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self.kind, PlatformErrorKind::DeadlineExceeded(_))
    }
}

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;
