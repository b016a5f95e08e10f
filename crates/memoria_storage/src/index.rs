//! In-memory hash → key index, persisted as `index.json`.

use memoria_core::{MediaItem, MediaVariant, MediaView};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const INDEX_VERSION: u32 = 1;

/// On-disk shape of the index. `items` is in insertion order.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    items: Vec<MediaItem>,
}

/// Lookup tables for everything in the media directory.
///
/// Cloned, modified and swapped in whole on every committed write, so readers
/// always see a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub(crate) struct MediaIndex {
    items: HashMap<String, MediaItem>,
    order: Vec<String>,
    originals_by_hash: HashMap<String, String>,
    derivatives_by_source: HashMap<String, String>,
}

impl MediaIndex {
    pub(crate) fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let file: IndexFile = serde_json::from_slice(bytes)?;
        let mut index = Self::default();
        for item in file.items {
            index.insert(item);
        }
        Ok(index)
    }

    pub(crate) fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let file = IndexFile {
            version: INDEX_VERSION,
            items: self
                .order
                .iter()
                .filter_map(|key| self.items.get(key).cloned())
                .collect(),
        };
        serde_json::to_vec_pretty(&file)
    }

    /// Add or replace an item, keeping the position of a replaced key.
    pub(crate) fn insert(&mut self, item: MediaItem) {
        let key = item.storage_key.clone();
        match item.variant {
            MediaVariant::Original => {
                self.originals_by_hash
                    .insert(item.content_hash.clone(), key.clone());
            }
            MediaVariant::Restyled => {
                if let Some(source) = &item.source_hash {
                    self.derivatives_by_source
                        .insert(source.clone(), key.clone());
                }
            }
        }
        if self.items.insert(key.clone(), item).is_none() {
            self.order.push(key);
        }
    }

    /// Remove `key`; removing an Original also removes its derivative.
    ///
    /// Returns everything removed, Original first.
    pub(crate) fn remove_cascade(&mut self, key: &str) -> Vec<MediaItem> {
        let Some(item) = self.remove_one(key) else {
            return Vec::new();
        };

        let mut removed = Vec::with_capacity(2);
        let derivative = item
            .is_original()
            .then(|| self.derivative_key(&item.content_hash).map(str::to_string))
            .flatten();
        removed.push(item);
        if let Some(derivative_key) = derivative
            && let Some(derived) = self.remove_one(&derivative_key)
        {
            removed.push(derived);
        }
        removed
    }

    fn remove_one(&mut self, key: &str) -> Option<MediaItem> {
        let item = self.items.remove(key)?;
        self.order.retain(|k| k != key);
        match item.variant {
            MediaVariant::Original => {
                if self.originals_by_hash.get(&item.content_hash).map(String::as_str) == Some(key)
                {
                    self.originals_by_hash.remove(&item.content_hash);
                }
            }
            MediaVariant::Restyled => {
                if let Some(source) = &item.source_hash
                    && self.derivatives_by_source.get(source).map(String::as_str) == Some(key)
                {
                    self.derivatives_by_source.remove(source);
                }
            }
        }
        Some(item)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&MediaItem> {
        self.items.get(key)
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub(crate) fn original_key(&self, content_hash: &str) -> Option<&str> {
        self.originals_by_hash.get(content_hash).map(String::as_str)
    }

    pub(crate) fn derivative_key(&self, source_hash: &str) -> Option<&str> {
        self.derivatives_by_source
            .get(source_hash)
            .map(String::as_str)
    }

    /// Keys of a view in insertion order.
    pub(crate) fn keys(&self, view: MediaView) -> Vec<String> {
        let of = |variant: MediaVariant| {
            self.order
                .iter()
                .filter(move |key| {
                    self.items
                        .get(key.as_str())
                        .is_some_and(|item| item.variant == variant)
                })
                .cloned()
        };
        match view {
            MediaView::Originals => of(MediaVariant::Original).collect(),
            MediaView::Restyled => of(MediaVariant::Restyled).collect(),
            MediaView::All => of(MediaVariant::Original)
                .chain(of(MediaVariant::Restyled))
                .collect(),
        }
    }

    pub(crate) fn items(&self) -> impl Iterator<Item = &MediaItem> {
        self.order.iter().filter_map(|key| self.items.get(key))
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
