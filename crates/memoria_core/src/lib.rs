//! Core data types for the Memoria memorial backend.
//!
//! These types cross crate boundaries: the store hands out [`MediaItem`]s, the
//! guestbook persists [`GuestbookEntry`]s, and the restyling pipeline reports
//! [`PipelineResult`]s. All of them serialize with camelCase field names, which
//! is the shape the HTTP front end returns.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod guestbook;
mod media;
mod pipeline;
mod profile;

pub use guestbook::GuestbookEntry;
pub use media::{MediaItem, MediaVariant, MediaView, PutOutcome};
pub use pipeline::{
    BulkFailure, BulkReport, Outcome, PipelineResult, PipelineResultBuilder, StrategyKind,
};
pub use profile::MemorialProfile;
