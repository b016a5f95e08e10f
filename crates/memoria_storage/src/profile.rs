//! Memorial profile record (`memorial.json`).

use crate::atomic::{self, timed};
use memoria_core::MemorialProfile;
use memoria_error::{MemoriaResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

const PROFILE_FILE: &str = "memorial.json";

/// Single-record store for the memorial profile. Saving replaces the record.
pub struct ProfileStore {
    path: PathBuf,
    io_timeout: Duration,
    write_lock: Mutex<()>,
}

impl ProfileStore {
    /// Profile store inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>, io_timeout: Duration) -> Self {
        Self {
            path: data_dir.as_ref().join(PROFILE_FILE),
            io_timeout,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the current profile, if one was ever saved.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> MemoriaResult<Option<MemorialProfile>> {
        let bytes = timed(self.io_timeout, "read profile", async {
            match tokio::fs::read(&self.path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))),
            }
        })
        .await?;

        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let profile = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;
        Ok(Some(profile))
    }

    /// Validate and save `profile`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid profile, or a storage error if
    /// the write fails (the previous record stays intact).
    #[tracing::instrument(skip(self, profile), fields(path = %self.path.display()))]
    pub async fn save(&self, profile: &MemorialProfile) -> MemoriaResult<()> {
        profile.validate()?;
        let json = serde_json::to_vec_pretty(profile)
            .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;

        let _guard = self.write_lock.lock().await;
        timed(
            self.io_timeout,
            "write profile",
            atomic::write_atomic(&self.path, &json),
        )
        .await?;
        tracing::info!(name = %profile.name(), "Saved memorial profile");
        Ok(())
    }
}
