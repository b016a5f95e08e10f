//! Restyling pipeline for Memoria.
//!
//! A restyle turns an Original photo into a stylized derivative. Strategies are
//! tried in order: the generative [`RemoteStrategy`] when one is configured, then
//! the deterministic [`LocalFilter`]. Every outcome, success or failure, is cached
//! per source content hash and persisted, so asking twice never calls a service
//! twice.
//!
//! # Example
//!
//! ```rust,no_run
//! use memoria_config::MemoriaConfig;
//! use memoria_restyle::RestylePipeline;
//! use memoria_storage::{FileSystemStorage, MediaStorage};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MemoriaConfig::load(None)?;
//! let storage: Arc<dyn MediaStorage> =
//!     Arc::new(FileSystemStorage::from_config(config.storage()).await?);
//! let pipeline = RestylePipeline::from_config(storage.clone(), &config).await?;
//!
//! let report = pipeline.restyle_all(&CancellationToken::new()).await;
//! println!("{} restyled, {} failed", report.succeeded.len(), report.failed.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod local;
mod pipeline;
mod remote;
mod strategy;

pub use cache::RestyleCache;
pub use local::LocalFilter;
pub use pipeline::RestylePipeline;
pub use remote::RemoteStrategy;
pub use strategy::RestyleStrategy;
