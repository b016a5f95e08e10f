//! Content-addressable media storage for Memoria.
//!
//! Uploads are keyed by the SHA-256 of their bytes, so uploading the same photo
//! twice stores it once. Restyled derivatives live in the same namespace under a
//! key derived from their source's hash, which makes "does this photo have a
//! restyled version" an index lookup.
//!
//! # Example
//!
//! ```rust
//! use memoria_storage::{FileSystemStorage, MediaStorage};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::open("/tmp/memoria", Duration::from_secs(5)).await?;
//!
//! let first = storage.put(b"jpeg bytes", "dog.jpg").await?;
//! let second = storage.put(b"jpeg bytes", "dog.jpg").await?;
//! assert!(!first.duplicate);
//! assert!(second.duplicate);
//! assert_eq!(first.key, second.key);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod atomic;
mod filesystem;
mod index;
pub mod keys;
mod profile;
mod storage;

pub use atomic::{timed, write_atomic};
pub use filesystem::FileSystemStorage;
pub use memoria_error::{StorageError, StorageErrorKind};
pub use profile::ProfileStore;
pub use storage::MediaStorage;
