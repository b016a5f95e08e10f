//! Tests for the restyling pipeline with mock and local strategies.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use memoria_core::{Outcome, StrategyKind};
use memoria_error::{
    MemoriaErrorKind, MemoriaResult, RemoteError, RemoteErrorKind, RestyleError, RestyleErrorKind,
};
use memoria_restyle::{LocalFilter, RestyleCache, RestylePipeline, RestyleStrategy};
use memoria_storage::{FileSystemStorage, MediaStorage, keys};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// How a mock strategy responds.
#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Forbidden,
    Broken,
}

struct CountingStrategy {
    kind: StrategyKind,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl CountingStrategy {
    fn new(kind: StrategyKind, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestyleStrategy for CountingStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn apply(&self, source: &[u8]) -> MemoriaResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => {
                let mut out = b"styled:".to_vec();
                out.extend_from_slice(source);
                Ok(out)
            }
            Behavior::Forbidden => Err(RemoteError::new(RemoteErrorKind::HttpError {
                status_code: 403,
                message: "organization must be verified".to_string(),
            })
            .into()),
            Behavior::Broken => Err(RestyleError::new(RestyleErrorKind::LocalFilter(
                "cannot decode source image".to_string(),
            ))
            .into()),
        }
    }
}

fn png(seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(24, 24, |x, y| {
        if (x / 6 + y / 6) % 2 == 0 {
            Rgb([seed, 180, 90])
        } else {
            Rgb([30, 40, seed])
        }
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

async fn setup(
    dir: &TempDir,
    strategies: Vec<Arc<dyn RestyleStrategy>>,
) -> (Arc<dyn MediaStorage>, RestylePipeline) {
    let storage: Arc<dyn MediaStorage> =
        Arc::new(FileSystemStorage::open(dir.path(), IO_TIMEOUT).await.unwrap());
    let cache = RestyleCache::load(dir.path(), IO_TIMEOUT).await.unwrap();
    let pipeline = RestylePipeline::new(storage.clone(), strategies, cache);
    (storage, pipeline)
}

#[tokio::test]
async fn test_restyle_twice_invokes_strategies_once() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let local = CountingStrategy::new(StrategyKind::Local, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone(), local.clone()]).await;

    let key = storage.put(b"dog photo", "dog.jpg").await.unwrap().key;
    let first = pipeline.restyle(&key, false).await.unwrap();
    let second = pipeline.restyle(&key, false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.strategy_used, StrategyKind::Remote);
    assert_eq!(remote.calls(), 1);
    assert_eq!(local.calls(), 0);

    let output_key = first.output_key.unwrap();
    assert_eq!(output_key, keys::derivative_key(&first.source_hash));
    assert_eq!(storage.get(&output_key).await.unwrap(), b"styled:dog photo");
}

#[tokio::test]
async fn test_force_refresh_reruns_chain() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone()]).await;

    let key = storage.put(b"cat photo", "cat.jpg").await.unwrap().key;
    pipeline.restyle(&key, false).await.unwrap();
    pipeline.restyle(&key, true).await.unwrap();

    assert_eq!(remote.calls(), 2);
}

#[tokio::test]
async fn test_permission_failure_falls_back_to_local() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Forbidden);
    let local: Arc<dyn RestyleStrategy> = Arc::new(LocalFilter::default());
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone(), local]).await;

    let key = storage.put(&png(200), "dog.png").await.unwrap().key;
    let result = pipeline.restyle(&key, false).await.unwrap();

    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.strategy_used, StrategyKind::Local);
    assert_eq!(remote.calls(), 1);

    let output = storage.get(result.output_key.as_ref().unwrap()).await.unwrap();
    assert!(image::load_from_memory_with_format(&output, ImageFormat::Png).is_ok());
}

#[tokio::test]
async fn test_bulk_counts_local_fallback_as_success() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Forbidden);
    let local: Arc<dyn RestyleStrategy> = Arc::new(LocalFilter::default());
    let (storage, pipeline) = setup(&temp_dir, vec![remote, local]).await;

    let a = storage.put(&png(10), "a.png").await.unwrap().key;
    let b = storage.put(&png(90), "b.png").await.unwrap().key;

    let report = pipeline.restyle_all(&CancellationToken::new()).await;
    assert_eq!(report.succeeded, vec![a, b]);
    assert!(report.failed.is_empty());
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_final_strategy_failure_is_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Forbidden);
    let local: Arc<dyn RestyleStrategy> = Arc::new(LocalFilter::default());
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone(), local]).await;

    let key = storage.put(b"definitely not an image", "notes.jpg").await.unwrap().key;
    let result = pipeline.restyle(&key, false).await.unwrap();

    assert_eq!(result.outcome, Outcome::Failure);
    assert_eq!(result.strategy_used, StrategyKind::Local);
    assert!(result.output_key.is_none());
    assert!(result.error_detail.unwrap().contains("decode"));

    // The failure is cached too
    pipeline.restyle(&key, false).await.unwrap();
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn test_bulk_collects_failures_without_aborting() {
    let temp_dir = TempDir::new().unwrap();
    let local: Arc<dyn RestyleStrategy> = Arc::new(LocalFilter::default());
    let (storage, pipeline) = setup(&temp_dir, vec![local]).await;

    let good = storage.put(&png(50), "good.png").await.unwrap().key;
    let bad = storage.put(b"garbage", "bad.jpg").await.unwrap().key;
    let missing = "0123456789abcdef_gone.jpg".to_string();

    let report = pipeline
        .bulk_restyle(&[bad.clone(), missing.clone(), good.clone()], &CancellationToken::new())
        .await;

    assert_eq!(report.succeeded, vec![good]);
    let failed: Vec<_> = report.failed.iter().map(|f| f.key.clone()).collect();
    assert_eq!(failed, vec![bad, missing]);
}

#[tokio::test]
async fn test_bulk_reports_cached_results_without_invoking() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone()]).await;

    let key = storage.put(b"bird photo", "bird.jpg").await.unwrap().key;
    pipeline.restyle(&key, false).await.unwrap();

    let report = pipeline.restyle_all(&CancellationToken::new()).await;
    assert_eq!(report.succeeded, vec![key]);
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn test_cancelled_bulk_returns_partial_report() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone()]).await;

    let key = storage.put(b"one", "one.jpg").await.unwrap().key;
    storage.put(b"two", "two.jpg").await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = pipeline.restyle_all(&cancel).await;
    assert!(report.cancelled);
    assert_eq!(report.processed(), 0);
    assert_eq!(remote.calls(), 0);

    // Nothing half-written appears in the store
    assert_eq!(storage.list_view(memoria_core::MediaView::Restyled).len(), 0);
    assert!(storage.contains_key(&key));
}

#[tokio::test]
async fn test_unknown_key_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let local: Arc<dyn RestyleStrategy> = Arc::new(LocalFilter::default());
    let (_storage, pipeline) = setup(&temp_dir, vec![local]).await;

    let err = pipeline.restyle("0123456789abcdef_nope.jpg", false).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_restyling_a_derivative_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote]).await;

    let key = storage.put(b"fish photo", "fish.jpg").await.unwrap().key;
    let output = pipeline.restyle(&key, false).await.unwrap().output_key.unwrap();

    let err = pipeline.restyle(&output, false).await.unwrap_err();
    assert!(matches!(err.kind(), MemoriaErrorKind::Validation(_)));
}

#[tokio::test]
async fn test_empty_chain_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, pipeline) = setup(&temp_dir, Vec::new()).await;

    let key = storage.put(b"hamster", "hamster.jpg").await.unwrap().key;
    let err = pipeline.restyle(&key, false).await.unwrap_err();
    assert!(matches!(err.kind(), MemoriaErrorKind::Restyle(_)));
}

#[tokio::test]
async fn test_vanished_output_is_restyled_again() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone()]).await;

    let key = storage.put(b"rabbit", "rabbit.jpg").await.unwrap().key;
    let output = pipeline.restyle(&key, false).await.unwrap().output_key.unwrap();
    storage.delete(&output).await.unwrap();

    let again = pipeline.restyle(&key, false).await.unwrap();
    assert!(again.is_success());
    assert_eq!(remote.calls(), 2);
    assert!(storage.contains_key(&output));
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let key = {
        let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
        let (storage, pipeline) = setup(&temp_dir, vec![remote]).await;
        let key = storage.put(b"turtle", "turtle.jpg").await.unwrap().key;
        pipeline.restyle(&key, false).await.unwrap();
        key
    };

    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (_storage, pipeline) = setup(&temp_dir, vec![remote.clone()]).await;
    let result = pipeline.restyle(&key, false).await.unwrap();

    assert!(result.is_success());
    assert_eq!(remote.calls(), 0);
    assert!(temp_dir.path().join("restyle_cache.json").exists());
}

#[tokio::test]
async fn test_forget_drops_cached_result() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone()]).await;

    let key = storage.put(b"pony", "pony.jpg").await.unwrap().key;
    let hash = pipeline.restyle(&key, false).await.unwrap().source_hash;

    assert!(pipeline.forget(&hash).await.unwrap());
    assert!(!pipeline.forget(&hash).await.unwrap());

    pipeline.restyle(&key, false).await.unwrap();
    assert_eq!(remote.calls(), 2);
}

/// Fails once released, after announcing that it started.
struct GatedFailure {
    started: Arc<Notify>,
    release: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl RestyleStrategy for GatedFailure {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Local
    }

    async fn apply(&self, _source: &[u8]) -> MemoriaResult<Vec<u8>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
        }
        Err(RestyleError::new(RestyleErrorKind::LocalFilter("not an image".to_string())).into())
    }
}

#[tokio::test]
async fn test_failure_for_deleted_original_is_not_cached() {
    let temp_dir = TempDir::new().unwrap();
    let gated = Arc::new(GatedFailure {
        started: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
        calls: AtomicUsize::new(0),
    });
    let (storage, pipeline) = setup(&temp_dir, vec![gated.clone()]).await;
    let pipeline = Arc::new(pipeline);

    let key = storage.put(b"kitten", "kitten.jpg").await.unwrap().key;
    let running = {
        let pipeline = pipeline.clone();
        let key = key.clone();
        tokio::spawn(async move { pipeline.restyle(&key, false).await.unwrap() })
    };

    gated.started.notified().await;
    storage.delete(&key).await.unwrap();
    gated.release.notify_one();
    assert_eq!(running.await.unwrap().outcome, Outcome::Failure);

    // Same bytes uploaded again get a fresh attempt
    let key = storage.put(b"kitten", "kitten.jpg").await.unwrap().key;
    pipeline.restyle(&key, false).await.unwrap();
    assert_eq!(gated.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_restyles_of_one_source_run_once() {
    let temp_dir = TempDir::new().unwrap();
    let remote = CountingStrategy::new(StrategyKind::Remote, Behavior::Succeed);
    let (storage, pipeline) = setup(&temp_dir, vec![remote.clone()]).await;
    let pipeline = Arc::new(pipeline);

    let key = storage.put(b"parrot", "parrot.jpg").await.unwrap().key;
    let mut handles = Vec::new();
    for _ in 0..4 {
        let pipeline = pipeline.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            pipeline.restyle(&key, false).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }

    assert_eq!(remote.calls(), 1);
}
