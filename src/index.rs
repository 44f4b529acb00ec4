use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tokenizer::TextOptions;

/// Opaque document identifier, shared between the builder and the scorers.
pub type DocId = String;

/// Per-(term, document) record: occurrence count plus the 0-based token
/// offsets at which the term occurs, in strictly increasing order.
/// Invariant: `positions.len() == frequency as usize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub frequency: u32,
    pub positions: Vec<u32>,
}

/// Term -> (document -> posting). BTreeMaps keep iteration, and therefore
/// the serialized index, deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingStore {
    pub terms: BTreeMap<String, BTreeMap<DocId, Posting>>,
}

impl PostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn postings(&self, term: &str) -> Option<&BTreeMap<DocId, Posting>> {
        self.terms.get(term)
    }

    /// Document frequency: number of documents containing `term`.
    pub fn doc_freq(&self, term: &str) -> u32 {
        self.terms.get(term).map_or(0, |docs| docs.len() as u32)
    }

    /// Collection frequency: total occurrences of `term` across the corpus.
    pub fn collection_freq(&self, term: &str) -> u64 {
        self.terms.get(term).map_or(0, |docs| {
            docs.values().map(|p| p.frequency as u64).sum()
        })
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

/// Corpus-wide statistics recorded at build time, persisted alongside the
/// postings so query-time processing can mirror the index configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub num_docs: u32,
    pub avdl: f64,
    pub corpus_len: u64,
    pub doc_lengths: BTreeMap<DocId, u32>,
    #[serde(flatten)]
    pub options: TextOptions,
}

impl CorpusStats {
    /// Length of a document in tokens; 0 for unknown documents.
    pub fn doc_len(&self, doc_id: &str) -> u32 {
        self.doc_lengths.get(doc_id).copied().unwrap_or(0)
    }
}

/// An immutable snapshot of the posting store plus its statistics. Built
/// once per corpus; queries read it without mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub store: PostingStore,
    pub stats: CorpusStats,
}

/// Accumulates postings and statistics one document at a time. Tokens must
/// arrive already analyzed (case-folded, filtered, trailing numbers
/// stripped); the builder assigns offsets in arrival order and performs no
/// filtering of its own.
pub struct IndexBuilder {
    store: PostingStore,
    doc_lengths: BTreeMap<DocId, u32>,
    corpus_len: u64,
    num_docs: u32,
    options: TextOptions,
}

impl IndexBuilder {
    pub fn new(options: TextOptions) -> Self {
        Self {
            store: PostingStore::new(),
            doc_lengths: BTreeMap::new(),
            corpus_len: 0,
            num_docs: 0,
            options,
        }
    }

    /// Fold one document's token stream into the store. A document with no
    /// tokens still counts toward `num_docs` with length 0.
    pub fn add_document<I, S>(&mut self, doc_id: &str, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut count: u32 = 0;
        for (pos, token) in tokens.into_iter().enumerate() {
            let posting = self
                .store
                .terms
                .entry(token.as_ref().to_string())
                .or_default()
                .entry(doc_id.to_string())
                .or_default();
            posting.frequency += 1;
            posting.positions.push(pos as u32);
            count += 1;
        }
        self.num_docs += 1;
        self.corpus_len += count as u64;
        self.doc_lengths.insert(doc_id.to_string(), count);
    }

    /// Union a partial builder into this one. Each document must have been
    /// folded by exactly one builder, so per-term document maps never
    /// collide and position lists stay sorted.
    pub fn merge(&mut self, other: IndexBuilder) {
        for (term, docs) in other.store.terms {
            self.store.terms.entry(term).or_default().extend(docs);
        }
        self.doc_lengths.extend(other.doc_lengths);
        self.corpus_len += other.corpus_len;
        self.num_docs += other.num_docs;
    }

    /// Finalize into an immutable index. `avdl` is 0 for an empty corpus;
    /// every scorer guards that case.
    pub fn finish(self) -> Index {
        let avdl = if self.num_docs > 0 {
            self.corpus_len as f64 / self.num_docs as f64
        } else {
            0.0
        };
        tracing::info!(
            num_docs = self.num_docs,
            num_terms = self.store.term_count(),
            corpus_len = self.corpus_len,
            "index build complete"
        );
        Index {
            store: self.store,
            stats: CorpusStats {
                num_docs: self.num_docs,
                avdl,
                corpus_len: self.corpus_len,
                doc_lengths: self.doc_lengths,
                options: self.options,
            },
        }
    }
}
