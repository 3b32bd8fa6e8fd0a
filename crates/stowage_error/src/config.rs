//! Configuration error types.

/// Configuration error with source location.
///
/// Raised while a backend is being configured; a backend that failed to
/// configure must never be used.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use stowage_error::ConfigError;
    ///
    /// let err = ConfigError::new("Missing required option: storage.s3.bucket");
    /// assert!(err.message.contains("storage.s3.bucket"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Error for a required option that is absent from the option map.
    #[track_caller]
    pub fn missing_option(name: &str) -> Self {
        Self::new(format!("Missing required option: {}", name))
    }
}
