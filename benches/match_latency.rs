//! Matcher latency over a realistically-sized corpus.
//!
//! The corpus is re-fetched and re-scanned per message in production, so the
//! full-scan cost at a few hundred entries is the number that matters.

use criterion::{criterion_group, criterion_main, Criterion};
use sage::faq::{FaqEntry, FaqMatcher};
use std::hint::black_box;

fn corpus(size: usize) -> Vec<FaqEntry> {
    (0..size)
        .map(|i| FaqEntry {
            id: format!("faq-{i}"),
            question: format!("What is the CS{} homework policy for week {}?", 100 + i, i % 14),
            answer: "See the syllabus.".into(),
            category: format!("Course/{}", 100 + i),
            link: None,
        })
        .collect()
}

fn bench_matcher(c: &mut Criterion) {
    let matcher = FaqMatcher::new();
    let corpus = corpus(200);

    c.bench_function("exact_match_200", |b| {
        b.iter(|| {
            black_box(matcher.match_best(
                black_box("what is the cs150 homework policy for week 8"),
                &corpus,
            ))
        })
    });

    c.bench_function("scored_scan_200", |b| {
        b.iter(|| {
            black_box(matcher.match_best(
                black_box("homework policy cs150 please"),
                &corpus,
            ))
        })
    });

    c.bench_function("top_k_scan_200", |b| {
        b.iter(|| black_box(matcher.match_top_k(black_box("deadline for the project"), &corpus, 3)))
    });
}

criterion_group!(benches, bench_matcher);
criterion_main!(benches);
