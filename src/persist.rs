use crate::{CorpusStats, DocId, Index, Posting, PostingStore};
use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::search::SearchResult;

pub const FORMAT_VERSION: u32 = 1;

lazy_static! {
    // One posting record, anchored: `[doc;freq;(d0,d1,...)]`.
    static ref POSTING_RE: Regex =
        Regex::new(r"^\[([\w.-]+);(\d+);\(([\d,]*)\)\]").expect("valid regex");
}

/// Locations of the files making up one serialized index.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    fn index(&self) -> PathBuf {
        self.root.join("index.txt")
    }
    fn stats(&self) -> PathBuf {
        self.root.join("stats.json")
    }
}

/// On-disk statistics record: the corpus statistics (including the text
/// processing flags query time must mirror) plus provenance fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsFile {
    #[serde(flatten)]
    pub stats: CorpusStats,
    pub created_at: String,
    pub version: u32,
}

/// `[3,3,7,20] -> [3,0,4,13]`: the first delta is the first position, each
/// later one the gap to its predecessor.
pub fn delta_encode(positions: &[u32]) -> Vec<u32> {
    let mut prev = 0;
    positions
        .iter()
        .map(|&pos| {
            let delta = pos - prev;
            prev = pos;
            delta
        })
        .collect()
}

/// Prefix-sum back to absolute positions.
pub fn delta_decode(deltas: &[u32]) -> Vec<u32> {
    let mut acc = 0;
    deltas
        .iter()
        .map(|&delta| {
            acc += delta;
            acc
        })
        .collect()
}

/// Serialize the store, one term per line:
/// `term=>doc_count;{[doc;freq;(deltas)]...}`. Map iteration is ordered, so
/// the output is deterministic for a given store.
pub fn encode_store(store: &PostingStore) -> String {
    let mut out = String::new();
    for (term, docs) in &store.terms {
        out.push_str(&format!("{}=>{};{{", term, docs.len()));
        for (doc_id, posting) in docs {
            let deltas: Vec<String> = delta_encode(&posting.positions)
                .iter()
                .map(u32::to_string)
                .collect();
            out.push_str(&format!(
                "[{};{};({})]",
                doc_id,
                posting.frequency,
                deltas.join(",")
            ));
        }
        out.push_str("}\n");
    }
    out
}

/// Exact inverse of [`encode_store`]. Any line that does not follow the
/// grammar is a hard error; no partial store is returned.
pub fn decode_store(text: &str) -> Result<PostingStore> {
    let mut store = PostingStore::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (term, _, docs) = parse_line(line, idx + 1)?;
        store.terms.insert(term, docs);
    }
    Ok(store)
}

fn parse_line(line: &str, line_no: usize) -> Result<(String, u32, BTreeMap<DocId, Posting>)> {
    let (term, rest) = line
        .split_once("=>")
        .with_context(|| format!("index line {line_no}: missing `=>`"))?;
    let (count, body) = rest
        .split_once(';')
        .with_context(|| format!("index line {line_no}: missing document count"))?;
    let doc_count: u32 = count
        .parse()
        .with_context(|| format!("index line {line_no}: bad document count `{count}`"))?;
    let body = body
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .with_context(|| format!("index line {line_no}: postings not brace-delimited"))?;

    let mut docs = BTreeMap::new();
    let mut rest = body;
    while !rest.is_empty() {
        let caps = POSTING_RE.captures(rest).with_context(|| {
            format!("index line {line_no}: malformed posting record at `{rest}`")
        })?;
        let doc_id = caps[1].to_string();
        let frequency: u32 = caps[2]
            .parse()
            .with_context(|| format!("index line {line_no}: bad frequency for `{doc_id}`"))?;
        let delta_text = &caps[3];
        let deltas: Vec<u32> = if delta_text.is_empty() {
            Vec::new()
        } else {
            delta_text
                .split(',')
                .map(str::parse)
                .collect::<Result<_, _>>()
                .with_context(|| {
                    format!("index line {line_no}: bad position delta for `{doc_id}`")
                })?
        };
        let positions = delta_decode(&deltas);
        if positions.len() != frequency as usize {
            bail!(
                "index line {line_no}: frequency {frequency} does not match {} positions for `{doc_id}`",
                positions.len()
            );
        }
        let end = caps.get(0).map_or(rest.len(), |m| m.end());
        rest = &rest[end..];
        docs.insert(doc_id, Posting { frequency, positions });
    }
    if docs.len() as u32 != doc_count {
        bail!(
            "index line {line_no}: document count {doc_count} does not match {} posting records",
            docs.len()
        );
    }
    Ok((term.to_string(), doc_count, docs))
}

/// Persist the index under `paths.root`. Files are written to a temporary
/// sibling and renamed into place, so a rebuild never leaves a partially
/// overwritten index behind.
pub fn save_index(paths: &IndexPaths, index: &Index) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    write_atomic(&paths.index(), encode_store(&index.store).as_bytes())?;
    let stats = StatsFile {
        stats: index.stats.clone(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    write_atomic(
        &paths.stats(),
        serde_json::to_string_pretty(&stats)?.as_bytes(),
    )?;
    tracing::info!(
        root = %paths.root.display(),
        num_terms = index.store.term_count(),
        num_docs = index.stats.num_docs,
        "index saved"
    );
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)
        .with_context(|| format!("creating {}", tmp.display()))?;
    file.write_all(bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_stats(paths: &IndexPaths) -> Result<CorpusStats> {
    let text = fs::read_to_string(paths.stats())
        .with_context(|| format!("reading {}", paths.stats().display()))?;
    let file: StatsFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", paths.stats().display()))?;
    Ok(file.stats)
}

/// Load the full index from disk.
pub fn load_index(paths: &IndexPaths) -> Result<Index> {
    let stats = load_stats(paths)?;
    let file = File::open(paths.index())
        .with_context(|| format!("opening {}", paths.index().display()))?;
    let mut store = PostingStore::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (term, _, docs) = parse_line(&line, idx + 1)?;
        store.terms.insert(term, docs);
    }
    tracing::info!(
        num_terms = store.term_count(),
        num_docs = stats.num_docs,
        "index loaded"
    );
    Ok(Index { store, stats })
}

/// Load postings only for `terms`, stopping the scan as soon as every
/// requested term has been found. Every scanned line is still validated
/// against the grammar; a malformed index is never served, even partially.
pub fn load_postings_for_terms(
    paths: &IndexPaths,
    terms: &HashSet<String>,
) -> Result<PostingStore> {
    let file = File::open(paths.index())
        .with_context(|| format!("opening {}", paths.index().display()))?;
    let mut store = PostingStore::new();
    let mut remaining = terms.len();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        if remaining == 0 {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (term, _, docs) = parse_line(&line, idx + 1)?;
        if terms.contains(&term) {
            store.terms.insert(term, docs);
            remaining -= 1;
        }
    }
    tracing::debug!(
        requested = terms.len(),
        found = store.term_count(),
        "partial postings load"
    );
    Ok(store)
}

/// Truncate (or create) a result store file.
pub fn new_result_store<P: AsRef<Path>>(path: P) -> Result<()> {
    File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    Ok(())
}

/// Append one query's ranked results as `Q<queryId> <rank> <docId> <score>`
/// lines, rank starting at 1.
pub fn append_results<P: AsRef<Path>>(
    path: P,
    query_id: &str,
    results: &[SearchResult],
) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    for (rank, result) in results.iter().enumerate() {
        writeln!(file, "Q{} {} {} {}", query_id, rank + 1, result.doc_id, result.score)?;
    }
    Ok(())
}
