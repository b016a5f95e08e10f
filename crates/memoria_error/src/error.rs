//! Top-level error wrapper types.

use crate::{
    ConfigError, RemoteError, RestyleError, ServerError, StorageError, ValidationError,
};

/// Every error a Memoria operation can surface.
///
/// # Examples
///
/// ```
/// use memoria_error::{MemoriaError, ValidationError};
///
/// let err: MemoriaError = ValidationError::new("messageBody is empty").into();
/// assert!(format!("{}", err).contains("Validation Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MemoriaErrorKind {
    /// Disk or index failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Rejected input
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Remote restyling service failure
    #[from(RemoteError)]
    Remote(RemoteError),
    /// Restyling pipeline failure
    #[from(RestyleError)]
    Restyle(RestyleError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// HTTP front end error
    #[from(ServerError)]
    Server(ServerError),
}

/// Memoria error with kind discrimination.
///
/// # Examples
///
/// ```
/// use memoria_error::{ConfigError, MemoriaResult};
///
/// fn might_fail() -> MemoriaResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Memoria Error: {}", _0)]
pub struct MemoriaError(Box<MemoriaErrorKind>);

impl MemoriaError {
    /// Create a new error from a kind.
    pub fn new(kind: MemoriaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MemoriaErrorKind {
        &self.0
    }

    /// True when the error reports a missing key, index or record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            MemoriaErrorKind::Storage(StorageError {
                kind: crate::StorageErrorKind::NotFound(_),
                ..
            })
        )
    }
}

impl<T> From<T> for MemoriaError
where
    T: Into<MemoriaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Memoria operations.
pub type MemoriaResult<T> = std::result::Result<T, MemoriaError>;
