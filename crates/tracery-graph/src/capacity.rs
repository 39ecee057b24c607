//! Runtime-adjustable live-vertex capacity.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared handle to the maximum live-vertex count.
///
/// Clones share the same underlying value, so an external control (a UI
/// slider, a server message) can adjust the bound while the maintainer
/// runs. The controller loads it fresh on every rebalance rather than
/// caching it, which is what makes runtime adjustment take effect on the
/// very next ingest.
#[derive(Debug, Clone)]
pub struct Capacity(Arc<AtomicUsize>);

impl Capacity {
    /// Creates a handle with an initial limit.
    pub fn new(limit: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(limit)))
    }

    /// Reads the current limit.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Replaces the limit. Takes effect on the next rebalance.
    pub fn set(&self, limit: usize) {
        self.0.store(limit, Ordering::Relaxed)
    }
}
