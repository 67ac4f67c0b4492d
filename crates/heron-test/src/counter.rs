//! Invocation counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts invocations across clones.
///
/// Clones share the same count, so a counter can be moved into a callable
/// body while the test keeps a handle to read it.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    hits: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one invocation and returns the new count, starting at 1.
    pub fn hit(&self) -> usize {
        self.hits.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the number of recorded invocations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Resets the count to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::SeqCst);
    }
}
