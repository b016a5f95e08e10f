//! Filesystem-based media storage implementation.

use crate::atomic::{self, timed};
use crate::index::MediaIndex;
use crate::keys::{
    compute_hash, derivative_key, original_key, sanitize_display_name,
    source_hash_of_derivative, validate_key,
};
use crate::MediaStorage;
use chrono::{DateTime, Utc};
use memoria_config::StorageConfig;
use memoria_core::{MediaItem, MediaVariant, MediaView, PutOutcome};
use memoria_error::{MemoriaResult, StorageError, StorageErrorKind, ValidationError};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const MEDIA_DIR: &str = "media";
const INDEX_FILE: &str = "index.json";

/// Filesystem storage backend.
///
/// Layout under `base_path`:
///
/// ```text
/// memoria-data/
/// ├── index.json                       hash → key index, insertion ordered
/// └── media/
///     ├── 3f2a9c0d1e7b4a61_dog.jpg     Original
///     └── 3f2a9c0d…e41c.restyled.png   Restyled derivative of the above
/// ```
///
/// # Features
///
/// - **Content-addressable**: Originals are deduplicated by SHA-256
/// - **Explicit index**: `exists` and `list` never scan the directory
/// - **Atomic writes**: Every file and the index are written temp + rename
/// - **Serialized mutation**: One async write lock per store; readers use the
///   last committed index snapshot
pub struct FileSystemStorage {
    base_path: PathBuf,
    media_dir: PathBuf,
    io_timeout: Duration,
    write_lock: Mutex<()>,
    index: RwLock<Arc<MediaIndex>>,
}

impl FileSystemStorage {
    /// Open (or create) a store rooted at `base_path`.
    ///
    /// Loads `index.json` and reconciles it with the media directory: entries
    /// whose files vanished are dropped, unindexed media is hashed and adopted
    /// in modification order, and interrupted temp files are removed.
    ///
    /// # Errors
    ///
    /// Returns error if the directories cannot be created or read.
    #[tracing::instrument(skip(base_path), fields(path))]
    pub async fn open(base_path: impl Into<PathBuf>, io_timeout: Duration) -> MemoriaResult<Self> {
        let base_path = base_path.into();
        tracing::Span::current().record("path", tracing::field::display(base_path.display()));
        let media_dir = base_path.join(MEDIA_DIR);

        tokio::fs::create_dir_all(&media_dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                media_dir.display(),
                e
            )))
        })?;

        let storage = Self {
            base_path,
            media_dir,
            io_timeout,
            write_lock: Mutex::new(()),
            index: RwLock::new(Arc::new(MediaIndex::default())),
        };

        let index = timed(io_timeout, "reconcile index", storage.reconcile()).await?;
        tracing::info!(
            path = %storage.base_path.display(),
            items = index.len(),
            "Opened filesystem storage"
        );
        *storage.index.write() = Arc::new(index);
        Ok(storage)
    }

    /// Open the store described by `config`.
    ///
    /// # Errors
    ///
    /// See [`FileSystemStorage::open`].
    pub async fn from_config(config: &StorageConfig) -> MemoriaResult<Self> {
        Self::open(config.data_dir().clone(), config.io_timeout()).await
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Deadline applied to each disk operation.
    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.media_dir.join(key)
    }

    fn index_path(&self) -> PathBuf {
        self.base_path.join(INDEX_FILE)
    }

    fn snapshot(&self) -> Arc<MediaIndex> {
        self.index.read().clone()
    }

    /// Persist `next` and make it the visible index. Caller holds the write lock.
    async fn commit_index(&self, next: MediaIndex) -> Result<(), StorageError> {
        let json = next
            .to_json()
            .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;
        timed(
            self.io_timeout,
            "write index",
            atomic::write_atomic(&self.index_path(), &json),
        )
        .await?;
        *self.index.write() = Arc::new(next);
        Ok(())
    }

    async fn load_index_file(&self) -> Result<Option<MediaIndex>, StorageError> {
        let path = self.index_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                ))));
            }
        };
        match MediaIndex::from_json(&bytes) {
            Ok(index) => Ok(Some(index)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Index unreadable, rebuilding from media directory"
                );
                Ok(None)
            }
        }
    }

    async fn reconcile(&self) -> Result<MediaIndex, StorageError> {
        let loaded = self.load_index_file().await?;
        let had_index = loaded.is_some();
        let mut index = loaded.unwrap_or_default();
        let mut changed = !had_index;

        // Files present on disk, temp leftovers removed.
        let mut on_disk = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.media_dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.media_dir.display(),
                e
            )))
        })?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(e.to_string()))
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if atomic::is_temp_file(&name) {
                tracing::debug!(file = %name, "Removing interrupted write");
                atomic::remove_if_present(&entry.path()).await?;
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            on_disk.push((name, modified));
        }

        // Drop index entries whose files are gone.
        let missing: Vec<String> = index
            .items()
            .filter(|item| !on_disk.iter().any(|(name, _)| name == &item.storage_key))
            .map(|item| item.storage_key.clone())
            .collect();
        for key in missing {
            tracing::warn!(key = %key, "Indexed media missing on disk, dropping");
            for removed in index.remove_cascade(&key) {
                atomic::remove_if_present(&self.path_of(&removed.storage_key)).await?;
            }
            changed = true;
        }

        // Adopt unindexed files, Originals before derivatives, oldest first.
        let mut unindexed: Vec<_> = on_disk
            .into_iter()
            .filter(|(name, _)| !index.contains_key(name))
            .collect();
        unindexed.sort_by(|a, b| {
            let derived = |n: &str| source_hash_of_derivative(n).is_some();
            derived(&a.0).cmp(&derived(&b.0)).then(a.1.cmp(&b.1))
        });

        for (name, modified) in unindexed {
            let path = self.path_of(&name);
            let data = tokio::fs::read(&path).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?;
            let hash = compute_hash(&data);

            let item = if let Some(source) = source_hash_of_derivative(&name) {
                let Some(original) = index.original_key(source).map(str::to_string) else {
                    tracing::warn!(file = %name, "Derivative without Original, removing");
                    atomic::remove_if_present(&path).await?;
                    continue;
                };
                let display_name = index
                    .get(&original)
                    .map(|o| o.display_name.clone())
                    .unwrap_or_default();
                MediaItem {
                    content_hash: hash,
                    display_name,
                    storage_key: name.clone(),
                    variant: MediaVariant::Restyled,
                    source_hash: Some(source.to_string()),
                    size_bytes: data.len() as u64,
                    created_at: modified,
                }
            } else {
                if index.original_key(&hash).is_some() {
                    tracing::warn!(file = %name, "Duplicate content on disk, removing");
                    atomic::remove_if_present(&path).await?;
                    continue;
                }
                let display_name = name
                    .split_once('_')
                    .map(|(_, rest)| rest.to_string())
                    .unwrap_or_else(|| name.clone());
                MediaItem {
                    content_hash: hash,
                    display_name,
                    storage_key: name.clone(),
                    variant: MediaVariant::Original,
                    source_hash: None,
                    size_bytes: data.len() as u64,
                    created_at: modified,
                }
            };

            tracing::info!(file = %name, variant = %item.variant, "Adopted unindexed media");
            index.insert(item);
            changed = true;
        }

        if changed {
            let json = index
                .to_json()
                .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;
            atomic::write_atomic(&self.index_path(), &json).await?;
        }
        Ok(index)
    }
}

#[async_trait::async_trait]
impl MediaStorage for FileSystemStorage {
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, data: &[u8], display_name: &str) -> MemoriaResult<PutOutcome> {
        if data.is_empty() {
            return Err(ValidationError::new("upload is empty").into());
        }

        let hash = compute_hash(data);

        // Dedup without the lock first; the check is repeated under it.
        if let Some(key) = self.snapshot().original_key(&hash) {
            tracing::debug!(hash = %hash, key = %key, "Media already exists, returning existing key");
            return Ok(PutOutcome {
                key: key.to_string(),
                duplicate: true,
            });
        }

        let _guard = self.write_lock.lock().await;
        let current = self.snapshot();
        if let Some(key) = current.original_key(&hash) {
            return Ok(PutOutcome {
                key: key.to_string(),
                duplicate: true,
            });
        }

        let sanitized = sanitize_display_name(display_name);
        let mut key = original_key(&hash, &sanitized);
        if current.contains_key(&key) {
            // Same prefix and name, different content: fall back to the full hash.
            key = format!("{}_{}", hash, sanitized);
        }
        let path = self.path_of(&key);

        timed(self.io_timeout, "write media", atomic::write_atomic(&path, data)).await?;

        let mut next = (*current).clone();
        next.insert(MediaItem {
            content_hash: hash.clone(),
            display_name: sanitized,
            storage_key: key.clone(),
            variant: MediaVariant::Original,
            source_hash: None,
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        });

        if let Err(e) = self.commit_index(next).await {
            let _ = atomic::remove_if_present(&path).await;
            return Err(e.into());
        }

        tracing::info!(hash = %hash, key = %key, size = data.len(), "Stored media file");
        Ok(PutOutcome {
            key,
            duplicate: false,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> MemoriaResult<Vec<u8>> {
        validate_key(key)?;
        let item = self
            .item(key)
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(key.to_string())))?;
        let path = self.path_of(key);

        let data = timed(self.io_timeout, "read media", async {
            tokio::fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StorageError::new(StorageErrorKind::NotFound(key.to_string()))
                } else {
                    StorageError::new(StorageErrorKind::FileRead(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )))
                }
            })
        })
        .await?;

        let actual = compute_hash(&data);
        if actual != item.content_hash {
            return Err(StorageError::new(StorageErrorKind::HashMismatch {
                expected: item.content_hash,
                actual,
            })
            .into());
        }

        tracing::debug!(key = %key, size = data.len(), "Retrieved media file");
        Ok(data)
    }

    fn list_view(&self, view: MediaView) -> Vec<String> {
        self.snapshot().keys(view)
    }

    fn item(&self, key: &str) -> Option<MediaItem> {
        self.snapshot().get(key).cloned()
    }

    fn exists(&self, content_hash: &str) -> bool {
        self.snapshot().original_key(content_hash).is_some()
    }

    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn put_derivative(&self, source_hash: &str, data: &[u8]) -> MemoriaResult<MediaItem> {
        let key = derivative_key(source_hash);
        validate_key(&key)?;
        let path = self.path_of(&key);

        // The slow part happens before the lock; only the rename is serialized.
        let temp_path = timed(self.io_timeout, "write derivative", atomic::write_temp(&path, data))
            .await?;

        let _guard = self.write_lock.lock().await;
        let current = self.snapshot();
        let Some(original) = current
            .original_key(source_hash)
            .and_then(|k| current.get(k))
            .cloned()
        else {
            let _ = atomic::remove_if_present(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                "original for {}",
                source_hash
            )))
            .into());
        };

        if let Err(e) = timed(self.io_timeout, "commit derivative", atomic::commit(&temp_path, &path)).await {
            let _ = atomic::remove_if_present(&temp_path).await;
            return Err(e.into());
        }

        let item = MediaItem {
            content_hash: compute_hash(data),
            display_name: original.display_name.clone(),
            storage_key: key.clone(),
            variant: MediaVariant::Restyled,
            source_hash: Some(source_hash.to_string()),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        };
        let mut next = (*current).clone();
        next.insert(item.clone());
        self.commit_index(next).await?;

        tracing::info!(source = %source_hash, key = %key, "Stored restyled derivative");
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> MemoriaResult<Vec<MediaItem>> {
        validate_key(key)?;

        let _guard = self.write_lock.lock().await;
        let current = self.snapshot();
        if !current.contains_key(key) {
            tracing::debug!(key = %key, "Delete of missing key, nothing to do");
            return Ok(Vec::new());
        }

        // Index first: a failed commit leaves both the index and the files intact.
        let mut next = (*current).clone();
        let removed = next.remove_cascade(key);
        self.commit_index(next).await?;
        for item in &removed {
            if let Err(e) = timed(
                self.io_timeout,
                "delete media",
                atomic::remove_if_present(&self.path_of(&item.storage_key)),
            )
            .await
            {
                // Unindexed leftovers are re-adopted or dropped on the next open.
                tracing::warn!(key = %item.storage_key, error = %e, "Media file not removed");
            }
        }

        tracing::info!(
            key = %key,
            removed = removed.len(),
            "Deleted media file"
        );
        Ok(removed)
    }
}
