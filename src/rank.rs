//! Bounded top-K ranking with deterministic tie-breaking.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::index::DocId;

/// A scored candidate. Ordering is "better than": higher score first, then
/// tighter window (a document without a window has no window advantage and
/// orders below any bounded window at equal score), then smaller doc id so
/// full ties resolve deterministically.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDoc {
    pub doc_id: DocId,
    pub score: f64,
    pub window: Option<u32>,
}

// Scores come out of the scorers finite (degenerate statistics are mapped
// to zero), so the total order below never sees NaN.
impl Eq for RankedDoc {}

impl Ord for RankedDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| match (self.window, other.window) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for RankedDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the best `limit` documents seen so far. A min-heap on the ranking
/// key evicts the current worst once the bound is exceeded, so pushing is
/// O(log limit) regardless of candidate count.
pub struct TopK {
    heap: BinaryHeap<Reverse<RankedDoc>>,
    limit: usize,
}

impl TopK {
    pub fn new(limit: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(limit.saturating_add(1)),
            limit,
        }
    }

    pub fn push(&mut self, doc: RankedDoc) {
        if self.limit == 0 {
            return;
        }
        self.heap.push(Reverse(doc));
        if self.heap.len() > self.limit {
            self.heap.pop();
        }
    }

    /// Best first.
    pub fn into_sorted(self) -> Vec<RankedDoc> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(doc)| doc)
            .collect()
    }
}
