//! spansearch: a positional inverted index with ranked retrieval.
//!
//! Documents are folded into a [`PostingStore`] (term -> document ->
//! frequency + positions) together with the corpus statistics the relevance
//! models need. The store serializes to a delta-compressed text format and
//! can be reloaded either fully or only for a query's term set. Queries run
//! against an immutable [`Index`] snapshot: a matcher selects candidate
//! documents (any-term, ordered phrase, or ordered-within-a-window), a
//! scoring model (TF-IDF, BM25, Jelinek-Mercer) weighs them, and a bounded
//! ranker emits the top results deterministically.

pub mod handle;
pub mod index;
pub mod matcher;
pub mod persist;
pub mod rank;
pub mod score;
pub mod search;
pub mod tokenizer;

pub use handle::IndexHandle;
pub use index::{CorpusStats, DocId, Index, IndexBuilder, Posting, PostingStore};
pub use matcher::{PhraseMatch, PhraseQuery};
pub use score::ScoringModel;
pub use search::{MatchMode, SearchResult, Searcher};
pub use tokenizer::{Analyzer, TextOptions};
