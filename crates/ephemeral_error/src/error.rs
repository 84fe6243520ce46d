//! Top-level error wrapper types.

use crate::{ConfigError, HttpError, MetricsError, PlatformError, ReconcileError, StateError};

/// Every error the bot can surface to its entry point.
///
/// # Examples
///
/// ```
/// use ephemeral_error::{EphemeralError, HttpError};
///
/// let err: EphemeralError = HttpError::new("connection refused").into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum EphemeralErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// HTTP error outside the platform API
    #[from(HttpError)]
    Http(HttpError),
    /// Metrics registration error
    #[from(MetricsError)]
    Metrics(MetricsError),
    /// Chat platform error
    #[from(PlatformError)]
    Platform(PlatformError),
    /// Reconciliation error
    #[from(ReconcileError)]
    Reconcile(ReconcileError),
    /// State cache error
    #[from(StateError)]
    State(StateError),
}

/// Ephemeral Roles error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Ephemeral Roles Error: {}", _0)]
pub struct EphemeralError(Box<EphemeralErrorKind>);

impl EphemeralError {
    /// Create a new error from a kind.
    pub fn new(kind: EphemeralErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &EphemeralErrorKind {
        &self.0
    }
}

impl<T> From<T> for EphemeralError
where
    T: Into<EphemeralErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Ephemeral Roles operations.
pub type EphemeralResult<T> = std::result::Result<T, EphemeralError>;
