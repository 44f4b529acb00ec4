//! Query execution: select candidates, score them, rank the best.

use anyhow::{bail, Result};

use crate::index::{DocId, Index};
use crate::matcher::{self, PhraseMatch, PhraseQuery};
use crate::rank::{RankedDoc, TopK};
use crate::score::{ScoringModel, TermStats};
use crate::tokenizer::TextOptions;

/// How candidate documents are selected before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// All query terms present in query order, at any distance. No window
    /// is reported.
    Exact,
    /// Any query term present.
    Best,
    /// All query terms in order, with the minimal span bounded by the given
    /// width. The span is reported with each result.
    Windowed(u32),
}

/// One ranked hit. `window` is set only for [`MatchMode::Windowed`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f64,
    pub window: Option<u32>,
}

/// Read-only query executor over an immutable index snapshot. Concurrent
/// searches may share one snapshot freely; rebuilds publish a new snapshot
/// instead of mutating this one (see [`crate::handle::IndexHandle`]).
#[derive(Debug)]
pub struct Searcher<'a> {
    index: &'a Index,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// Rejects a query-time analyzer configuration that disagrees with the
    /// options the index was built with; mismatched processing silently
    /// corrupts term matching, so it is surfaced here instead.
    pub fn with_options(index: &'a Index, options: TextOptions) -> Result<Self> {
        if index.stats.options != options {
            bail!(
                "query text options {:?} do not match index options {:?}",
                options,
                index.stats.options
            );
        }
        Ok(Self { index })
    }

    /// Rank up to `limit` documents for the query terms under the given
    /// matching mode and scoring model. Terms absent from the index
    /// contribute zero score; under the ordered modes they empty the
    /// candidate set instead.
    pub fn search(
        &self,
        terms: &[String],
        mode: MatchMode,
        model: ScoringModel,
        limit: usize,
    ) -> Vec<SearchResult> {
        let query = PhraseQuery::new(terms.iter().cloned());
        if query.is_empty() {
            return Vec::new();
        }

        let matches: Vec<PhraseMatch> = match mode {
            MatchMode::Best => matcher::best_match(&self.index.store, &query),
            MatchMode::Exact => matcher::ordered_best_match(&self.index.store, &query, None),
            MatchMode::Windowed(bound) => {
                matcher::ordered_best_match(&self.index.store, &query, Some(bound))
            }
        };

        // Per-term statistics once per query, not per candidate document.
        let term_stats: Vec<(&str, TermStats)> = terms
            .iter()
            .map(|term| {
                (
                    term.as_str(),
                    TermStats {
                        df: self.index.store.doc_freq(term),
                        cf: self.index.store.collection_freq(term),
                    },
                )
            })
            .collect();

        let mut topk = TopK::new(limit);
        for matched in matches {
            let dl = self.index.stats.doc_len(&matched.doc_id);
            let mut score = 0.0;
            for (term, stats) in &term_stats {
                if stats.df == 0 {
                    continue;
                }
                let f = self
                    .index
                    .store
                    .postings(term)
                    .and_then(|docs| docs.get(&matched.doc_id))
                    .map_or(0, |posting| posting.frequency);
                score += model.score(&self.index.stats, *stats, f, dl, 1);
            }
            topk.push(RankedDoc {
                doc_id: matched.doc_id,
                score,
                window: matched.window,
            });
        }

        topk.into_sorted()
            .into_iter()
            .map(|doc| SearchResult {
                doc_id: doc.doc_id,
                score: doc.score,
                window: doc.window,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexBuilder;

    fn index() -> Index {
        let mut builder = IndexBuilder::new(TextOptions::default());
        builder.add_document("apollo", ["moon", "landing", "module", "moon"]);
        builder.add_document("luna", ["moon", "probe"]);
        builder.add_document("mars", ["rover", "landing"]);
        builder.finish()
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn best_mode_scores_any_matching_document() {
        let index = index();
        let searcher = Searcher::new(&index);
        let results = searcher.search(&terms(&["moon"]), MatchMode::Best, ScoringModel::TfIdf, 10);
        let ids: Vec<&str> = results.iter().map(|r| r.doc_id.as_str()).collect();
        // "moon" appears twice in apollo, once in luna; tf breaks the tie.
        assert_eq!(ids, vec!["apollo", "luna"]);
        assert!(results.iter().all(|r| r.window.is_none()));
    }

    #[test]
    fn exact_mode_requires_order() {
        let index = index();
        let searcher = Searcher::new(&index);
        let hits = searcher.search(
            &terms(&["moon", "landing"]),
            MatchMode::Exact,
            ScoringModel::TfIdf,
            10,
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "apollo");

        let reversed = searcher.search(
            &terms(&["landing", "moon"]),
            MatchMode::Exact,
            ScoringModel::TfIdf,
            10,
        );
        // "landing" precedes the final "moon" in apollo.
        assert_eq!(reversed.len(), 1);
    }

    #[test]
    fn windowed_mode_reports_the_span() {
        let index = index();
        let searcher = Searcher::new(&index);
        let hits = searcher.search(
            &terms(&["moon", "landing"]),
            MatchMode::Windowed(5),
            ScoringModel::TfIdf,
            10,
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].window, Some(1));
    }

    #[test]
    fn limit_caps_the_result_count() {
        let index = index();
        let searcher = Searcher::new(&index);
        let hits = searcher.search(
            &terms(&["moon", "landing", "rover", "probe"]),
            MatchMode::Best,
            ScoringModel::Bm25,
            2,
        );
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn unknown_terms_contribute_nothing() {
        let index = index();
        let searcher = Searcher::new(&index);
        let with_unknown = searcher.search(
            &terms(&["moon", "xyzzy"]),
            MatchMode::Best,
            ScoringModel::TfIdf,
            10,
        );
        let without = searcher.search(&terms(&["moon"]), MatchMode::Best, ScoringModel::TfIdf, 10);
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index = index();
        let searcher = Searcher::new(&index);
        assert!(searcher
            .search(&[], MatchMode::Best, ScoringModel::TfIdf, 10)
            .is_empty());
    }

    #[test]
    fn mismatched_options_are_rejected() {
        let index = index();
        let other = TextOptions {
            stopped: true,
            ..TextOptions::default()
        };
        assert!(Searcher::with_options(&index, other).is_err());
        assert!(Searcher::with_options(&index, TextOptions::default()).is_ok());
    }

    #[test]
    fn jelinek_mercer_handles_zero_length_documents() {
        let mut builder = IndexBuilder::new(TextOptions::default());
        builder.add_document("full", ["moon"]);
        builder.add_document("empty", Vec::<String>::new());
        let index = builder.finish();
        let searcher = Searcher::new(&index);
        let hits = searcher.search(
            &terms(&["moon"]),
            MatchMode::Best,
            ScoringModel::JelinekMercer,
            10,
        );
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score.is_finite());
    }
}
