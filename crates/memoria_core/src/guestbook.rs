//! Guestbook entry type.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single signed message in the guestbook.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDateTime;
/// use memoria_core::GuestbookEntry;
///
/// let at = NaiveDateTime::parse_from_str("2024-01-01T10:00", "%Y-%m-%dT%H:%M").unwrap();
/// let entry = GuestbookEntry::new(at, "Alice", "Miss you");
/// assert_eq!(entry.author_name(), "Alice");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
#[serde(rename_all = "camelCase")]
pub struct GuestbookEntry {
    /// Local time the message was signed
    timestamp: NaiveDateTime,
    /// Who signed
    author_name: String,
    /// Free text, may contain any character
    message_body: String,
}

impl GuestbookEntry {
    /// Creates an entry from its parts.
    pub fn new(
        timestamp: NaiveDateTime,
        author_name: impl Into<String>,
        message_body: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            author_name: author_name.into(),
            message_body: message_body.into(),
        }
    }
}
