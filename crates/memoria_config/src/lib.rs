//! Configuration for the Memoria memorial backend.
//!
//! Sources, lowest precedence first:
//! 1. Bundled defaults (`memoria.toml` shipped with the crate)
//! 2. `~/.config/memoria/memoria.toml`
//! 3. `./memoria.toml`
//! 4. An explicit file (e.g. the CLI's `--config`)
//! 5. `MEMORIA__<SECTION>__<KEY>` environment variables

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod settings;

pub use settings::{
    GuestbookConfig, LocalFilterConfig, MemoriaConfig, RemoteConfig, RestyleConfig,
    ServerConfig, StorageConfig,
};
