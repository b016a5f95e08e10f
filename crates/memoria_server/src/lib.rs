//! HTTP API for Memoria.
//!
//! Exposes the media store, restyling pipeline, guestbook, memorial record and
//! per-session carousel cursors over JSON. Build an [`AppState`] once, then
//! either mount [`router`] into a larger application or call [`serve`].
//!
//! # Example
//!
//! ```rust,no_run
//! use memoria_config::MemoriaConfig;
//! use memoria_server::{AppState, serve};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MemoriaConfig::load(None)?;
//! let state = AppState::from_config(&config).await?;
//! serve(state, config.server().bind()).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod handlers;
mod routes;
mod server;
mod sessions;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use server::serve;
pub use sessions::CarouselSessions;
pub use state::AppState;
