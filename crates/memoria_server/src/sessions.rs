//! Bounded table of per-session carousel cursors.

use memoria_carousel::CarouselCursor;
use memoria_core::MediaView;
use moka::sync::Cache;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Carousel cursors keyed by session id.
///
/// Capacity is bounded and idle sessions expire, so clients inventing session
/// ids cannot grow the table without limit. An evicted session simply starts
/// over at the first item.
#[derive(Clone)]
pub struct CarouselSessions {
    cursors: Cache<String, Arc<Mutex<CarouselCursor>>>,
}

impl CarouselSessions {
    /// Keep at most `max_sessions`, dropping any untouched for `idle`.
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        let cursors = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .build();
        Self { cursors }
    }

    /// Cursor for `session`, bound to `view` when the session is new.
    pub fn cursor(&self, session: &str, view: MediaView, len: usize) -> Arc<Mutex<CarouselCursor>> {
        self.cursors.get_with(session.to_string(), || {
            Arc::new(Mutex::new(CarouselCursor::bind(view, len)))
        })
    }

    /// Sessions currently held, after pending evictions are applied.
    pub fn len(&self) -> u64 {
        self.cursors.run_pending_tasks();
        self.cursors.entry_count()
    }

    /// True when no session is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CarouselSessions {
    fn default() -> Self {
        Self::new(1024, Duration::from_secs(3600))
    }
}
