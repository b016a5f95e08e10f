//! Error types for the Memoria memorial backend.
//!
//! Every crate in the workspace reports failures through the types defined here.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! The taxonomy maps onto the behaviour callers observe:
//!
//! | Condition            | Type                                   |
//! |----------------------|----------------------------------------|
//! | Missing key or index | [`StorageErrorKind::NotFound`]         |
//! | Empty required field | [`ValidationError`]                    |
//! | Remote restyle fails | [`RemoteError`] (recovered locally)    |
//! | Local filter fails   | [`RestyleErrorKind::LocalFilter`]      |
//! | Disk write or rename | [`StorageError`] (fatal)               |
//!
//! # Examples
//!
//! ```
//! use memoria_error::{MemoriaResult, ValidationError};
//!
//! fn sign(author: &str) -> MemoriaResult<()> {
//!     if author.trim().is_empty() {
//!         Err(ValidationError::new("authorName must not be empty"))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(sign("").is_err());
//! assert!(sign("Alice").is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod remote;
mod restyle;
mod server;
mod storage;
mod validation;

pub use config::ConfigError;
pub use error::{MemoriaError, MemoriaErrorKind, MemoriaResult};
pub use remote::{RemoteError, RemoteErrorKind, RetryableError};
pub use restyle::{RestyleError, RestyleErrorKind};
pub use server::{ServerError, ServerErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use validation::ValidationError;
