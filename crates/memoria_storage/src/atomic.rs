//! Write-temp-then-rename helpers with deadlines.
//!
//! A reader of any final path sees either the previous complete content or the new
//! complete content, never a prefix.

use memoria_error::{StorageError, StorageErrorKind};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Run a disk operation under a deadline.
pub async fn timed<T, F>(
    deadline: Duration,
    operation: &str,
    fut: F,
) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::new(StorageErrorKind::Timeout {
            operation: operation.to_string(),
            millis: deadline.as_millis() as u64,
        })),
    }
}

/// Temp path next to `path`, unique per call.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

/// True for files left behind by an interrupted write.
pub(crate) fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".tmp")
}

/// Write `data` to a fresh temp file beside `path` and flush it to disk.
///
/// Returns the temp path; the caller renames it into place with [`commit`].
pub(crate) async fn write_temp(path: &Path, data: &[u8]) -> Result<PathBuf, StorageError> {
    let temp_path = temp_path_for(path);
    let write = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await
    };

    if let Err(e) = write.await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        ))));
    }
    Ok(temp_path)
}

/// Rename a temp file over its final path.
pub(crate) async fn commit(temp_path: &Path, path: &Path) -> Result<(), StorageError> {
    tokio::fs::rename(temp_path, path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
    })
}

/// Replace `path` with `data` atomically.
pub async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let temp_path = write_temp(path, data).await?;
    if let Err(e) = commit(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub(crate) async fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "delete {}: {}",
            path.display(),
            e
        )))),
    }
}
