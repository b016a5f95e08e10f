//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Key, index entry or record does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Key that cannot name a stored object
    #[display("Invalid key: {}", _0)]
    InvalidKey(String),
    /// Stored bytes no longer hash to the recorded digest
    #[display("Hash mismatch: expected {}, got {}", expected, actual)]
    HashMismatch {
        /// Digest recorded in the index
        expected: String,
        /// Digest of the bytes on disk
        actual: String,
    },
    /// Index or record could not be encoded or decoded
    #[display("Serialization failed: {}", _0)]
    Serialization(String),
    /// Disk operation exceeded its deadline
    #[display("Timed out after {}ms: {}", millis, operation)]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Deadline that elapsed
        millis: u64,
    },
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use memoria_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("abc_dog.jpg".to_string()));
/// assert!(format!("{}", err).contains("Not found"));
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
