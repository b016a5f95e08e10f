//! Storage trait definition.

use memoria_core::{MediaItem, MediaView, PutOutcome};
use memoria_error::MemoriaResult;

/// Trait for pluggable content-addressable media backends.
///
/// Implementations deduplicate by content hash, keep an explicit hash → key
/// index, and serialize their mutations internally.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store an upload.
    ///
    /// Returns the existing key with `duplicate = true` when the same bytes are
    /// already stored.
    async fn put(&self, data: &[u8], display_name: &str) -> MemoriaResult<PutOutcome>;

    /// Read the bytes stored under `key`.
    async fn get(&self, key: &str) -> MemoriaResult<Vec<u8>>;

    /// Keys of a view, in insertion order.
    fn list_view(&self, view: MediaView) -> Vec<String>;

    /// Keys of all Originals, in insertion order.
    fn list(&self) -> Vec<String> {
        self.list_view(MediaView::Originals)
    }

    /// Index entry for `key`.
    fn item(&self, key: &str) -> Option<MediaItem>;

    /// Whether an Original with this content hash is stored.
    fn exists(&self, content_hash: &str) -> bool;

    /// Whether anything is stored under `key`.
    fn contains_key(&self, key: &str) -> bool {
        self.item(key).is_some()
    }

    /// Store a Restyled derivative of the Original with `source_hash`.
    ///
    /// Replaces any previous derivative of the same source.
    async fn put_derivative(&self, source_hash: &str, data: &[u8]) -> MemoriaResult<MediaItem>;

    /// Delete `key`, and its derivative when `key` is an Original.
    ///
    /// Deleting a missing key succeeds and returns nothing.
    async fn delete(&self, key: &str) -> MemoriaResult<Vec<MediaItem>>;
}
