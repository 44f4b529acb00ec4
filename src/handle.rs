//! Shared, swappable index snapshots.
//!
//! Queries run against an immutable [`Index`]; rebuilding replaces the
//! whole snapshot instead of mutating in place. `IndexHandle` is the
//! publication point: readers take an `Arc` snapshot and keep it for the
//! duration of a query, writers swap in a fully built replacement.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::index::Index;

pub struct IndexHandle {
    current: RwLock<Arc<Index>>,
}

impl IndexHandle {
    pub fn new(index: Index) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// The current snapshot. In-flight queries holding an older snapshot
    /// are unaffected by later swaps.
    pub fn snapshot(&self) -> Arc<Index> {
        Arc::clone(&self.current.read())
    }

    /// Atomically publish a rebuilt index.
    pub fn replace(&self, index: Index) {
        *self.current.write() = Arc::new(index);
    }
}
