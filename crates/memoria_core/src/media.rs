//! Media item types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an item is an upload or derived from one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaVariant {
    /// Bytes as uploaded
    #[display("original")]
    Original,
    /// Output of the restyling pipeline
    #[display("restyled")]
    Restyled,
}

/// An ordered view over the store that a carousel can bind to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MediaView {
    /// Originals followed by restyled derivatives
    #[display("all")]
    All,
    /// Uploaded media only
    #[default]
    #[display("originals")]
    Originals,
    /// Restyled derivatives only
    #[display("restyled")]
    Restyled,
}

/// A persisted media object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// SHA-256 of the stored bytes, lowercase hex
    pub content_hash: String,
    /// Sanitized name given at upload
    pub display_name: String,
    /// Opaque key the item is stored and addressed under
    pub storage_key: String,
    /// Original upload or restyled derivative
    pub variant: MediaVariant,
    /// Hash of the Original a derivative was produced from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    /// Size of the stored bytes
    pub size_bytes: u64,
    /// When the item was first stored
    pub created_at: DateTime<Utc>,
}

impl MediaItem {
    /// True for uploaded media.
    pub fn is_original(&self) -> bool {
        self.variant == MediaVariant::Original
    }
}

/// Result of uploading bytes to the store.
///
/// `duplicate` is a signal rather than an error: the bytes were already stored and
/// `key` names the existing copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutOutcome {
    /// Key the content is stored under
    pub key: String,
    /// True when the content hash was already present
    pub duplicate: bool,
}
