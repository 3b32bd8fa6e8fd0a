//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// A key segment exists on disk but is not a directory
    #[display("Not a directory: {}", _0)]
    NotADirectory(String),
    /// Failed to write file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Failed to delete file
    #[display("Failed to delete file: {}", _0)]
    FileDelete(String),
    /// Key is empty or cannot be mapped onto the backend
    #[display("Invalid storage key: {}", _0)]
    InvalidKey(String),
    /// Nothing is stored under a key the caller required
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Content could not be decoded as UTF-8
    #[display("Invalid encoding: {}", _0)]
    Encoding(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use stowage_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotADirectory("2024/03".to_string()));
/// assert!(format!("{}", err).contains("Not a directory"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
