//! Remote restyling service errors and retry classification.

/// Remote restyling service failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RemoteErrorKind {
    /// API key environment variable not set
    #[display("{} environment variable not set", _0)]
    MissingApiKey(String),
    /// Request could not be sent or the connection dropped
    #[display("Request failed: {}", _0)]
    Request(String),
    /// A single attempt exceeded its deadline
    #[display("Attempt timed out after {}ms", _0)]
    Timeout(u64),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    HttpError {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Service refused the content (verification, safety or permission policy)
    #[display("Refused by service policy: {}", _0)]
    Policy(String),
    /// Response body was not a usable image
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
}

impl RemoteErrorKind {
    /// Check if this error type should be retried.
    ///
    /// Only transient network conditions qualify. Permission and policy failures
    /// never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteErrorKind::HttpError { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            RemoteErrorKind::Request(_) => true,
            RemoteErrorKind::Timeout(_) => true,
            _ => false,
        }
    }

    /// True for permission, verification and content-policy refusals.
    pub fn is_policy(&self) -> bool {
        match self {
            RemoteErrorKind::HttpError { status_code, .. } => {
                matches!(*status_code, 400 | 401 | 403 | 422)
            }
            RemoteErrorKind::Policy(_) | RemoteErrorKind::MissingApiKey(_) => true,
            _ => false,
        }
    }
}

/// Remote error with source location tracking.
///
/// # Examples
///
/// ```
/// use memoria_error::{RemoteError, RemoteErrorKind, RetryableError};
///
/// let err = RemoteError::new(RemoteErrorKind::HttpError {
///     status_code: 403,
///     message: "verification required".to_string(),
/// });
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Remote Error: {} at line {} in {}", kind, line, file)]
pub struct RemoteError {
    /// The kind of error that occurred
    pub kind: RemoteErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RemoteError {
    /// Create a new RemoteError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RemoteErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use memoria_error::{RemoteError, RemoteErrorKind, RetryableError};
///
/// let err = RemoteError::new(RemoteErrorKind::HttpError {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
///
/// assert!(err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for RemoteError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
