//! Gallery cursor for Memoria.
//!
//! The cursor is a plain value owned by whoever displays the gallery. It never
//! holds the items themselves, only the length of the list it is bound to, so
//! the caller re-syncs it whenever the underlying view changes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cursor;

pub use cursor::{CarouselCursor, CursorState};
