//! Cursor state machine.

use memoria_core::MediaView;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Where the cursor is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(tag = "state", content = "index", rename_all = "lowercase")]
pub enum CursorState {
    /// Bound list is empty
    #[display("empty")]
    Empty,
    /// Showing the item at this index
    #[display("viewing({})", _0)]
    Viewing(usize),
}

/// Wraparound position over an ordered media view.
///
/// # Examples
///
/// ```
/// use memoria_carousel::{CarouselCursor, CursorState};
/// use memoria_core::MediaView;
///
/// let mut cursor = CarouselCursor::bind(MediaView::Originals, 3);
/// assert_eq!(cursor.state(), CursorState::Viewing(0));
///
/// cursor.prev();
/// assert_eq!(cursor.current_index(), Some(2));
///
/// cursor.sync_len(0);
/// assert_eq!(cursor.state(), CursorState::Empty);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselCursor {
    view: MediaView,
    len: usize,
    state: CursorState,
}

impl Default for CarouselCursor {
    fn default() -> Self {
        Self::new(MediaView::default())
    }
}

impl CarouselCursor {
    /// Unbound cursor over `view`, starting empty.
    pub fn new(view: MediaView) -> Self {
        Self::bind(view, 0)
    }

    /// Cursor over a list of `len` items of `view`, at the first item.
    pub fn bind(view: MediaView, len: usize) -> Self {
        Self {
            view,
            len,
            state: if len == 0 {
                CursorState::Empty
            } else {
                CursorState::Viewing(0)
            },
        }
    }

    /// Follow the caller to `view` with `len` items.
    ///
    /// Switching to a different view starts over at the first item; staying on
    /// the same view only re-syncs the length.
    pub fn rebind(&mut self, view: MediaView, len: usize) {
        if view != self.view {
            trace!(from = %self.view, to = %view, len, "Carousel view changed");
            *self = Self::bind(view, len);
        } else {
            self.sync_len(len);
        }
    }

    /// Adopt a new length for the bound list.
    ///
    /// The index is clamped into the new bounds, so deleting the item being
    /// viewed leaves the cursor on a neighbour.
    pub fn sync_len(&mut self, len: usize) {
        self.len = len;
        self.state = match (self.state, len) {
            (_, 0) => CursorState::Empty,
            (CursorState::Empty, _) => CursorState::Viewing(0),
            (CursorState::Viewing(index), len) => CursorState::Viewing(index.min(len - 1)),
        };
    }

    /// Advance one item, wrapping from the last to the first.
    pub fn next(&mut self) -> Option<usize> {
        if let CursorState::Viewing(index) = self.state {
            self.state = CursorState::Viewing((index + 1) % self.len);
        }
        self.current_index()
    }

    /// Step back one item, wrapping from the first to the last.
    pub fn prev(&mut self) -> Option<usize> {
        if let CursorState::Viewing(index) = self.state {
            self.state = CursorState::Viewing((index + self.len - 1) % self.len);
        }
        self.current_index()
    }

    /// Index under the cursor.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            CursorState::Empty => None,
            CursorState::Viewing(index) => Some(index),
        }
    }

    /// The item under the cursor in a caller-held list.
    pub fn current<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.current_index().and_then(|index| items.get(index))
    }

    /// Current state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// View the cursor is bound to.
    pub fn view(&self) -> MediaView {
        self.view
    }

    /// Length of the bound list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the bound list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cursor_does_not_move() {
        let mut cursor = CarouselCursor::new(MediaView::Originals);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.prev(), None);
        assert_eq!(cursor.state(), CursorState::Empty);
    }

    #[test]
    fn test_single_item_wraps_to_itself() {
        let mut cursor = CarouselCursor::bind(MediaView::All, 1);
        assert_eq!(cursor.next(), Some(0));
        assert_eq!(cursor.prev(), Some(0));
    }

    #[test]
    fn test_growing_from_empty_starts_at_first() {
        let mut cursor = CarouselCursor::new(MediaView::Originals);
        cursor.sync_len(4);
        assert_eq!(cursor.state(), CursorState::Viewing(0));
    }

    #[test]
    fn test_growing_keeps_position() {
        let mut cursor = CarouselCursor::bind(MediaView::Originals, 3);
        cursor.next();
        cursor.sync_len(10);
        assert_eq!(cursor.current_index(), Some(1));
    }
}
