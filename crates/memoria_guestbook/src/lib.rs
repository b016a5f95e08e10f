//! Append-only guestbook log for Memoria.
//!
//! Entries are stored one JSON object per line in the order they were signed.
//! Visitors see them newest first; deleting is addressed by that display
//! position and rewrites the whole file atomically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod log;

pub use log::GuestbookLog;
