//! Restyling pipeline errors.

/// Restyling failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RestyleErrorKind {
    /// The local filter chain rejected the input
    #[display("Local filter failed: {}", _0)]
    LocalFilter(String),
    /// A restyled image could not be encoded
    #[display("Failed to encode restyled image: {}", _0)]
    Encode(String),
    /// No strategy is configured
    #[display("Restyling pipeline has no strategies")]
    EmptyChain,
}

/// Restyle error with location tracking.
///
/// # Examples
///
/// ```
/// use memoria_error::{RestyleError, RestyleErrorKind};
///
/// let err = RestyleError::new(RestyleErrorKind::LocalFilter("not an image".to_string()));
/// assert!(format!("{}", err).contains("not an image"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Restyle Error: {} at line {} in {}", kind, line, file)]
pub struct RestyleError {
    /// The kind of error that occurred
    pub kind: RestyleErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RestyleError {
    /// Create a new restyle error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RestyleErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
