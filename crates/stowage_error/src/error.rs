//! Top-level error wrapper types.

use crate::{ConfigError, HttpError, StorageError};

/// Every failure a storage operation can surface.
///
/// # Examples
///
/// ```
/// use stowage_error::{StowageError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: StowageError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StowageErrorKind {
    /// Transport or signature failure talking to a remote store
    #[from(HttpError)]
    Http(HttpError),
    /// Missing or invalid backend configuration
    #[from(ConfigError)]
    Config(ConfigError),
    /// Local storage or content conversion failure
    #[from(StorageError)]
    Storage(StorageError),
}

/// Stowage error with kind discrimination.
///
/// # Examples
///
/// ```
/// use stowage_error::{StowageErrorKind, StowageResult, ConfigError};
///
/// fn might_fail() -> StowageResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), StowageErrorKind::Config(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Stowage Error: {}", _0)]
pub struct StowageError(Box<StowageErrorKind>);

impl StowageError {
    /// Create a new error from a kind.
    pub fn new(kind: StowageErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StowageErrorKind {
        &self.0
    }

    /// True when the failure came from configuration rather than I/O.
    pub fn is_config(&self) -> bool {
        matches!(self.kind(), StowageErrorKind::Config(_))
    }
}

// Generic From implementation for any type that converts to StowageErrorKind
impl<T> From<T> for StowageError
where
    T: Into<StowageErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Stowage operations.
pub type StowageResult<T> = std::result::Result<T, StowageError>;
