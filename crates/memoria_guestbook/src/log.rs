//! JSON-lines guestbook log.

use chrono::{Local, NaiveDateTime, SubsecRound};
use memoria_config::MemoriaConfig;
use memoria_core::GuestbookEntry;
use memoria_error::{MemoriaResult, StorageError, StorageErrorKind, ValidationError};
use memoria_storage::{timed, write_atomic};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// One line of the backing file with its parsed entry, if it parsed.
struct Record {
    raw: String,
    entry: Option<GuestbookEntry>,
}

/// Guestbook persisted as JSON lines.
///
/// Appends and deletes hold the write side of a per-log lock; listing holds the
/// read side, so a reader never observes a half-written rewrite.
///
/// # Example
///
/// ```rust
/// use memoria_guestbook::GuestbookLog;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let log = GuestbookLog::open("/tmp/memoria/guestbook.jsonl", Duration::from_secs(5)).await?;
/// log.submit("Alice", "Miss you").await?;
/// log.submit("Bob", "Goodbye friend").await?;
///
/// let shown = log.list_display_order().await?;
/// assert_eq!(shown[0].author_name(), "Bob");
///
/// // Remove what the visitor saw second (Alice's message)
/// log.delete_by_display_index(1).await?;
/// # Ok(())
/// # }
/// ```
pub struct GuestbookLog {
    path: PathBuf,
    io_timeout: Duration,
    lock: RwLock<()>,
}

impl GuestbookLog {
    /// Open the log at `path`, creating its directory if needed.
    ///
    /// The file itself is created by the first append.
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, io_timeout: Duration) -> MemoriaResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        debug!("Opened guestbook log");
        Ok(Self {
            path,
            io_timeout,
            lock: RwLock::new(()),
        })
    }

    /// Open the log configured in `config`.
    ///
    /// # Errors
    ///
    /// See [`GuestbookLog::open`].
    pub async fn from_config(config: &MemoriaConfig) -> MemoriaResult<Self> {
        Self::open(config.guestbook_path(), config.storage().io_timeout()).await
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sign the guestbook now.
    ///
    /// Both fields are trimmed; either being empty is a validation error.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields, or a storage error if the
    /// append fails.
    pub async fn submit(
        &self,
        author_name: &str,
        message_body: &str,
    ) -> MemoriaResult<GuestbookEntry> {
        let entry = GuestbookEntry::new(
            now(),
            author_name.trim(),
            message_body.trim(),
        );
        self.append(&entry).await?;
        Ok(entry)
    }

    /// Append one entry to the end of the log.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields, or a storage error if the
    /// append fails.
    #[instrument(skip(self, entry), fields(author = %entry.author_name()))]
    pub async fn append(&self, entry: &GuestbookEntry) -> MemoriaResult<()> {
        validate(entry)?;
        let mut line = serde_json::to_string(entry)
            .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;
        line.push('\n');

        let _guard = self.lock.write().await;
        timed(self.io_timeout, "append guestbook", self.append_line(&line)).await?;
        info!("Appended guestbook entry");
        Ok(())
    }

    async fn append_line(&self, line: &str) -> Result<(), StorageError> {
        let write_err = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;

        // A crash mid-append can leave a final line without its newline; start a
        // fresh line so the new record is not glued onto it.
        let len = file.metadata().await.map_err(write_err)?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1)).await.map_err(write_err)?;
            file.read_exact(&mut last).await.map_err(write_err)?;
            if last[0] != b'\n' {
                warn!("Guestbook ends without newline, terminating partial record");
                file.write_all(b"\n").await.map_err(write_err)?;
            }
        }

        file.write_all(line.as_bytes()).await.map_err(write_err)?;
        file.sync_data().await.map_err(write_err)
    }

    async fn read_records(&self) -> Result<Vec<Record>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                ))));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                let entry = match serde_json::from_str::<GuestbookEntry>(line) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(line = n + 1, error = %e, "Skipping malformed guestbook record");
                        None
                    }
                };
                Record {
                    raw: line.to_string(),
                    entry,
                }
            })
            .collect())
    }

    /// Entries in the order they were signed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read.
    pub async fn entries(&self) -> MemoriaResult<Vec<GuestbookEntry>> {
        let _guard = self.lock.read().await;
        let records = timed(self.io_timeout, "read guestbook", self.read_records()).await?;
        Ok(records.into_iter().filter_map(|r| r.entry).collect())
    }

    /// Entries newest first. Storage order is untouched.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read.
    #[instrument(skip(self))]
    pub async fn list_display_order(&self) -> MemoriaResult<Vec<GuestbookEntry>> {
        let mut entries = self.entries().await?;
        entries.reverse();
        Ok(entries)
    }

    /// Number of readable entries.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read.
    pub async fn len(&self) -> MemoriaResult<usize> {
        Ok(self.entries().await?.len())
    }

    /// True when nobody has signed yet.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read.
    pub async fn is_empty(&self) -> MemoriaResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Delete the entry shown at `display_index` (0 = newest).
    ///
    /// Translates to `storage_index = len - 1 - display_index`, then rewrites the
    /// file through a temp file and rename. Malformed records are carried over
    /// unchanged. An index past the end is a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read or rewritten; the
    /// previous file is then left intact.
    #[instrument(skip(self))]
    pub async fn delete_by_display_index(
        &self,
        display_index: usize,
    ) -> MemoriaResult<Option<GuestbookEntry>> {
        let _guard = self.lock.write().await;
        let mut records = timed(self.io_timeout, "read guestbook", self.read_records()).await?;

        let positions: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.entry.is_some())
            .map(|(i, _)| i)
            .collect();
        let count = positions.len();
        if display_index >= count {
            debug!(display_index, count, "Delete past end of guestbook, nothing to do");
            return Ok(None);
        }

        let storage_index = count - 1 - display_index;
        let removed = records.remove(positions[storage_index]);

        let mut content = String::with_capacity(records.iter().map(|r| r.raw.len() + 1).sum());
        for record in &records {
            content.push_str(&record.raw);
            content.push('\n');
        }
        timed(
            self.io_timeout,
            "rewrite guestbook",
            write_atomic(&self.path, content.as_bytes()),
        )
        .await?;

        info!(display_index, storage_index, remaining = count - 1, "Deleted guestbook entry");
        Ok(removed.entry)
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

fn validate(entry: &GuestbookEntry) -> Result<(), ValidationError> {
    if entry.author_name().trim().is_empty() {
        return Err(ValidationError::new("authorName must not be empty"));
    }
    if entry.message_body().trim().is_empty() {
        return Err(ValidationError::new("messageBody must not be empty"));
    }
    Ok(())
}
