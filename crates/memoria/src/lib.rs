//! Memoria - a memorial backend for a lost pet or person.
//!
//! Visitors upload photos, which are stored once no matter how often they are
//! uploaded; photos can be restyled into illustrated versions by a generative
//! service with a deterministic local fallback; and a guestbook collects
//! messages shown newest first.
//!
//! # Crates
//!
//! | Crate | Provides |
//! |-------|----------|
//! | `memoria_error` | Error taxonomy |
//! | `memoria_core` | Shared data types |
//! | `memoria_config` | Layered configuration |
//! | `memoria_storage` | Content-addressable media store, memorial record |
//! | `memoria_guestbook` | Append-only guestbook log |
//! | `memoria_restyle` | Remote-then-local restyling pipeline |
//! | `memoria_carousel` | Gallery cursor |
//! | `memoria_server` | HTTP API |
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use memoria::{FileSystemStorage, GuestbookLog, MediaStorage, MemoriaConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MemoriaConfig::load(None)?;
//! let storage = FileSystemStorage::from_config(config.storage()).await?;
//! storage.put(&std::fs::read("dog.jpg")?, "dog.jpg").await?;
//!
//! let guestbook = GuestbookLog::from_config(&config).await?;
//! guestbook.submit("Alice", "Miss you").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;

pub use memoria_carousel::{CarouselCursor, CursorState};
pub use memoria_config::{
    GuestbookConfig, LocalFilterConfig, MemoriaConfig, RemoteConfig, RestyleConfig, ServerConfig,
    StorageConfig,
};
pub use memoria_core::{
    BulkFailure, BulkReport, GuestbookEntry, MediaItem, MediaVariant, MediaView, MemorialProfile,
    Outcome, PipelineResult, PutOutcome, StrategyKind,
};
pub use memoria_error::{MemoriaError, MemoriaErrorKind, MemoriaResult};
pub use memoria_guestbook::GuestbookLog;
pub use memoria_restyle::{
    LocalFilter, RemoteStrategy, RestyleCache, RestylePipeline, RestyleStrategy,
};
pub use memoria_server::{AppState, router, serve};
pub use memoria_storage::{FileSystemStorage, MediaStorage, ProfileStore};
