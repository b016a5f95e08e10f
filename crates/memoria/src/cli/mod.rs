//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the memoria binary.

mod commands;
mod guestbook;
mod media;
mod memorial;
mod restyle;
mod serve;

pub use commands::{Cli, Commands};
pub use guestbook::handle_guestbook_command;
pub use media::handle_media_command;
pub use memorial::handle_memorial_command;
pub use restyle::{restyle_all, restyle_one};
pub use serve::run_server;
