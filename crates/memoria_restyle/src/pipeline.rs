//! Strategy chain with a per-source result cache.

use memoria_config::MemoriaConfig;
use memoria_core::{BulkFailure, BulkReport, Outcome, PipelineResult, StrategyKind};
use memoria_error::{
    MemoriaError, MemoriaResult, RestyleError, RestyleErrorKind, StorageError, StorageErrorKind,
    ValidationError,
};
use memoria_storage::MediaStorage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{LocalFilter, RemoteStrategy, RestyleCache, RestyleStrategy};

/// Restyles Originals into derivatives, trying each strategy in order.
///
/// A non-final strategy failing for any reason falls through to the next; the
/// final strategy failing is recorded as a [`Outcome::Failure`] result. Results
/// are cached per source content hash, so a second request for the same photo
/// is answered from the cache.
pub struct RestylePipeline {
    storage: Arc<dyn MediaStorage>,
    strategies: Vec<Arc<dyn RestyleStrategy>>,
    cache: RestyleCache,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RestylePipeline {
    /// Creates a pipeline over `storage` with an explicit strategy chain.
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        strategies: Vec<Arc<dyn RestyleStrategy>>,
        cache: RestyleCache,
    ) -> Self {
        Self {
            storage,
            strategies,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Builds the configured chain: remote first when `[restyle.remote]` is
    /// present and its API key is set, then the local filter.
    ///
    /// # Errors
    ///
    /// Returns error if the result cache cannot be read.
    #[instrument(skip_all)]
    pub async fn from_config(
        storage: Arc<dyn MediaStorage>,
        config: &MemoriaConfig,
    ) -> MemoriaResult<Self> {
        let mut strategies: Vec<Arc<dyn RestyleStrategy>> = Vec::new();
        if let Some(remote) = config.restyle().remote() {
            match RemoteStrategy::from_config(remote) {
                Ok(strategy) => {
                    info!(endpoint = %strategy.endpoint(), "Remote restyling enabled");
                    strategies.push(Arc::new(strategy));
                }
                Err(e) => warn!(error = %e, "Remote restyling disabled"),
            }
        }
        strategies.push(Arc::new(LocalFilter::new(config.restyle().local().clone())));

        let cache = RestyleCache::load(
            config.storage().data_dir(),
            config.storage().io_timeout(),
        )
        .await?;
        Ok(Self::new(storage, strategies, cache))
    }

    /// Kinds of the configured strategies, in the order they are tried.
    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Storage the pipeline reads from and writes to.
    pub fn storage(&self) -> &Arc<dyn MediaStorage> {
        &self.storage
    }

    /// Forget the cached result for `source_hash`.
    ///
    /// Waits for an in-flight restyle of the same source, so its result cannot
    /// land in the cache afterwards.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cache file cannot be rewritten.
    pub async fn forget(&self, source_hash: &str) -> MemoriaResult<bool> {
        let lock = self.source_lock(source_hash);
        let removed = {
            let _guard = lock.lock().await;
            self.cache.remove(source_hash).await
        };
        self.release_source_lock(source_hash, lock);
        removed
    }

    fn source_lock(&self, source_hash: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.in_flight
            .lock()
            .entry(source_hash.to_string())
            .or_default()
            .clone()
    }

    /// Drop the map entry for `source_hash` once nobody else holds or awaits it.
    fn release_source_lock(&self, source_hash: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock();
        // One reference in the map, one in `lock`.
        if Arc::strong_count(&lock) <= 2 {
            in_flight.remove(source_hash);
        }
    }

    /// A cached result that still describes reality.
    ///
    /// A success whose derivative has since been deleted is treated as absent.
    async fn usable_cached(&self, source_hash: &str) -> Option<PipelineResult> {
        let cached = self.cache.get(source_hash).await?;
        match (&cached.outcome, &cached.output_key) {
            (Outcome::Success, Some(key)) if !self.storage.contains_key(key) => {
                debug!(source_hash, output_key = %key, "Cached output vanished, restyling again");
                None
            }
            _ => Some(cached),
        }
    }

    /// Restyle the Original stored under `source_key`.
    ///
    /// Returns the cached result unless `force_refresh` is set.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown key
    /// - a validation error when `source_key` is itself a derivative
    /// - a restyle error when no strategy is configured
    /// - a storage error when reading the source or writing the output fails
    #[instrument(skip(self))]
    pub async fn restyle(
        &self,
        source_key: &str,
        force_refresh: bool,
    ) -> MemoriaResult<PipelineResult> {
        let item = self.storage.item(source_key).ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound(source_key.to_string()))
        })?;
        if !item.is_original() {
            return Err(ValidationError::new(format!(
                "{} is already a restyled derivative",
                source_key
            ))
            .into());
        }
        if self.strategies.is_empty() {
            return Err(RestyleError::new(RestyleErrorKind::EmptyChain).into());
        }

        let source_hash = item.content_hash;
        let lock = self.source_lock(&source_hash);
        let result = {
            let _guard = lock.lock().await;
            self.restyle_locked(source_key, &source_hash, force_refresh)
                .await
        };
        self.release_source_lock(&source_hash, lock);
        result
    }

    /// Body of [`RestylePipeline::restyle`]; the caller holds the source lock.
    async fn restyle_locked(
        &self,
        source_key: &str,
        source_hash: &str,
        force_refresh: bool,
    ) -> MemoriaResult<PipelineResult> {
        if !force_refresh && let Some(cached) = self.usable_cached(source_hash).await {
            debug!(outcome = %cached.outcome, "Returning cached restyle result");
            return Ok(cached);
        }

        let source = self.storage.get(source_key).await?;
        let result = self.run_chain(source_hash, &source).await?;

        if self.storage.item(source_key).is_some() {
            self.cache.insert(result.clone()).await?;
        } else {
            debug!(source_key, "Original removed during restyle, result not cached");
        }

        info!(
            source_hash = %source_hash,
            strategy = %result.strategy_used,
            outcome = %result.outcome,
            "Restyle finished"
        );
        Ok(result)
    }

    async fn run_chain(&self, source_hash: &str, source: &[u8]) -> MemoriaResult<PipelineResult> {
        let mut last_failure: Option<(StrategyKind, MemoriaError)> = None;

        for strategy in &self.strategies {
            let kind = strategy.kind();
            match strategy.apply(source).await {
                Ok(output) => {
                    let stored = self.storage.put_derivative(source_hash, &output).await?;
                    return Ok(PipelineResult {
                        source_hash: source_hash.to_string(),
                        strategy_used: kind,
                        output_key: Some(stored.storage_key),
                        outcome: Outcome::Success,
                        error_detail: None,
                    });
                }
                Err(e) => {
                    warn!(strategy = %kind, error = %e, "Restyle strategy failed");
                    last_failure = Some((kind, e));
                }
            }
        }

        let (kind, error) = last_failure.ok_or_else(|| {
            MemoriaError::from(RestyleError::new(RestyleErrorKind::EmptyChain))
        })?;
        Ok(PipelineResult {
            source_hash: source_hash.to_string(),
            strategy_used: kind,
            output_key: None,
            outcome: Outcome::Failure,
            error_detail: Some(error.to_string()),
        })
    }

    /// Restyle each key in turn, collecting per-item results.
    ///
    /// Keys with a cached result are reported from the cache. One item failing
    /// never stops the batch. `cancel` is checked between items; a cancelled
    /// run returns what it finished so far with `cancelled = true`.
    #[instrument(skip(self, source_keys, cancel), fields(count = source_keys.len()))]
    pub async fn bulk_restyle(
        &self,
        source_keys: &[String],
        cancel: &CancellationToken,
    ) -> BulkReport {
        let mut report = BulkReport::default();

        for key in source_keys {
            if cancel.is_cancelled() {
                info!(processed = report.processed(), "Bulk restyle cancelled");
                report.cancelled = true;
                break;
            }

            match self.restyle(key, false).await {
                Ok(result) if result.is_success() => report.succeeded.push(key.clone()),
                Ok(result) => report.failed.push(BulkFailure {
                    key: key.clone(),
                    error_detail: result.error_detail.unwrap_or_default(),
                }),
                Err(e) => {
                    warn!(key = %key, error = %e, "Bulk restyle item failed");
                    report.failed.push(BulkFailure {
                        key: key.clone(),
                        error_detail: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled,
            "Bulk restyle finished"
        );
        report
    }

    /// Restyle every Original currently stored, in insertion order.
    pub async fn restyle_all(&self, cancel: &CancellationToken) -> BulkReport {
        let keys = self.storage.list();
        self.bulk_restyle(&keys, cancel).await
    }
}
