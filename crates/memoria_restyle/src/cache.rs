//! Persisted restyle results keyed by source content hash.

use memoria_core::PipelineResult;
use memoria_error::{MemoriaResult, StorageError, StorageErrorKind};
use memoria_storage::{timed, write_atomic};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const CACHE_FILE: &str = "restyle_cache.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    results: Vec<PipelineResult>,
}

/// Restyle results, one per source hash, mirrored to `restyle_cache.json`.
///
/// Every change rewrites the file through a temp file and rename while holding
/// the cache lock, so the file always matches some committed in-memory state.
pub struct RestyleCache {
    path: PathBuf,
    io_timeout: Duration,
    results: Mutex<HashMap<String, PipelineResult>>,
}

impl RestyleCache {
    /// Load the cache kept in `data_dir`, starting empty if there is none.
    ///
    /// An unreadable cache file is logged and discarded; results are
    /// recomputed on demand.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read.
    #[instrument(skip(data_dir), fields(data_dir = %data_dir.as_ref().display()))]
    pub async fn load(data_dir: impl AsRef<Path>, io_timeout: Duration) -> MemoriaResult<Self> {
        let path = data_dir.as_ref().join(CACHE_FILE);
        let bytes = timed(io_timeout, "read restyle cache", async {
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))),
            }
        })
        .await?;

        let results = match bytes.map(|b| serde_json::from_slice::<CacheFile>(&b)) {
            None => HashMap::new(),
            Some(Ok(file)) => file
                .results
                .into_iter()
                .map(|r| (r.source_hash.clone(), r))
                .collect(),
            Some(Err(e)) => {
                warn!(error = %e, "Discarding unreadable restyle cache");
                HashMap::new()
            }
        };

        info!(count = results.len(), "Loaded restyle cache");
        Ok(Self {
            path,
            io_timeout,
            results: Mutex::new(results),
        })
    }

    /// Cached result for `source_hash`.
    pub async fn get(&self, source_hash: &str) -> Option<PipelineResult> {
        self.results.lock().await.get(source_hash).cloned()
    }

    /// Record `result`, replacing any earlier result for the same source.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cache file cannot be rewritten; the
    /// in-memory cache is left unchanged in that case.
    pub async fn insert(&self, result: PipelineResult) -> MemoriaResult<()> {
        let mut results = self.results.lock().await;
        let previous = results.insert(result.source_hash.clone(), result.clone());
        if let Err(e) = self.persist(&results).await {
            match previous {
                Some(previous) => results.insert(result.source_hash, previous),
                None => results.remove(&result.source_hash),
            };
            return Err(e);
        }
        debug!(source_hash = %result.source_hash, outcome = %result.outcome, "Cached restyle result");
        Ok(())
    }

    /// Drop the result for `source_hash`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cache file cannot be rewritten.
    pub async fn remove(&self, source_hash: &str) -> MemoriaResult<bool> {
        let mut results = self.results.lock().await;
        let Some(previous) = results.remove(source_hash) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&results).await {
            results.insert(source_hash.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Number of cached results.
    pub async fn len(&self) -> usize {
        self.results.lock().await.len()
    }

    /// True when nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn persist(&self, results: &HashMap<String, PipelineResult>) -> MemoriaResult<()> {
        let mut sorted: Vec<PipelineResult> = results.values().cloned().collect();
        sorted.sort_by(|a, b| a.source_hash.cmp(&b.source_hash));
        let file = CacheFile {
            version: CACHE_VERSION,
            results: sorted,
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;
        timed(
            self.io_timeout,
            "write restyle cache",
            write_atomic(&self.path, &json),
        )
        .await?;
        Ok(())
    }
}
