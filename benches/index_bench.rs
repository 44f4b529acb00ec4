use criterion::{criterion_group, criterion_main, Criterion};
use spansearch::{IndexBuilder, MatchMode, ScoringModel, Searcher, TextOptions};
use std::hint::black_box;

const VOCAB: &[&str] = &[
    "memory", "pages", "scheduler", "network", "sorting", "index", "query",
    "system", "allocation", "free", "list", "task", "input", "sequence",
];

fn synthetic_tokens(doc: usize) -> Vec<&'static str> {
    (0..200).map(|i| VOCAB[(doc * 7 + i * 3) % VOCAB.len()]).collect()
}

fn build_index() -> spansearch::Index {
    let mut builder = IndexBuilder::new(TextOptions::default());
    for doc in 0..100 {
        builder.add_document(&format!("doc-{doc}"), synthetic_tokens(doc));
    }
    builder.finish()
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_100_docs", |b| b.iter(|| black_box(build_index())));
}

fn bench_search(c: &mut Criterion) {
    let index = build_index();
    let searcher = Searcher::new(&index);
    let terms: Vec<String> = ["memory", "pages", "scheduler"]
        .iter()
        .map(|t| t.to_string())
        .collect();

    c.bench_function("windowed_search", |b| {
        b.iter(|| {
            black_box(searcher.search(
                &terms,
                MatchMode::Windowed(20),
                ScoringModel::Bm25,
                10,
            ))
        })
    });
    c.bench_function("best_match_search", |b| {
        b.iter(|| {
            black_box(searcher.search(&terms, MatchMode::Best, ScoringModel::TfIdf, 10))
        })
    });
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
