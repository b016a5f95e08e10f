//! Shared handler state.

use memoria_config::MemoriaConfig;
use memoria_error::MemoriaResult;
use memoria_guestbook::GuestbookLog;
use memoria_restyle::RestylePipeline;
use memoria_storage::{FileSystemStorage, MediaStorage, ProfileStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::CarouselSessions;

/// Everything a request handler can reach.
///
/// Cheap to clone; every component is shared behind an [`Arc`].
#[derive(Clone)]
pub struct AppState {
    /// Media store
    pub storage: Arc<dyn MediaStorage>,
    /// Guestbook log
    pub guestbook: Arc<GuestbookLog>,
    /// Restyling pipeline over `storage`
    pub pipeline: Arc<RestylePipeline>,
    /// Memorial record
    pub profile: Arc<ProfileStore>,
    /// Carousel cursor per session id
    pub sessions: CarouselSessions,
    /// Cancelled on shutdown; bulk runs stop between items
    pub shutdown: CancellationToken,
    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Assembles state from already-opened components.
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        guestbook: Arc<GuestbookLog>,
        pipeline: Arc<RestylePipeline>,
        profile: Arc<ProfileStore>,
    ) -> Self {
        Self {
            storage,
            guestbook,
            pipeline,
            profile,
            sessions: CarouselSessions::default(),
            shutdown: CancellationToken::new(),
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }

    /// Opens every component configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the data directory, index, restyle cache or guestbook
    /// cannot be opened.
    #[instrument(skip_all, fields(data_dir = %config.storage().data_dir().display()))]
    pub async fn from_config(config: &MemoriaConfig) -> MemoriaResult<Self> {
        let storage: Arc<dyn MediaStorage> =
            Arc::new(FileSystemStorage::from_config(config.storage()).await?);
        let guestbook = Arc::new(GuestbookLog::from_config(config).await?);
        let pipeline = Arc::new(RestylePipeline::from_config(storage.clone(), config).await?);
        let profile = Arc::new(ProfileStore::new(
            config.storage().data_dir(),
            config.storage().io_timeout(),
        ));

        info!(
            originals = storage.list().len(),
            strategies = ?pipeline.strategy_kinds(),
            "Application state ready"
        );
        let mut state = Self::new(storage, guestbook, pipeline, profile);
        state.max_upload_bytes = *config.server().max_upload_bytes();
        state.sessions = CarouselSessions::new(
            *config.server().max_carousel_sessions(),
            config.server().carousel_idle(),
        );
        Ok(state)
    }
}
