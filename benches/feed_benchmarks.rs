#![allow(clippy::all)]

//! Feed Client Benchmarks
//!
//! Benchmarks for request building, transport selection, compression and
//! statistics merging.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use docfeed::prelude::*;
use docfeed::{GzipCompressor, Poolable, TransportRequest, TransportResponse, TransportSelector};
use std::hint::black_box;
use std::time::Duration;

struct NullTransport;

impl Transport for NullTransport {
    fn execute(&self, _request: &TransportRequest<'_>, _timeout: Duration) -> Result<TransportResponse> {
        Err(FeedError::Transport("not connected".into()))
    }
}

// =============================================================================
// Request Building Benchmarks
// =============================================================================

fn bench_method_and_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("method_and_url");

    let options = ClientOptions::builder()
        .base_url("https://feed.example.com:8080")
        .timeout(Duration::from_secs(10))
        .route("default")
        .build();
    let plain = Document::put(DocumentId::new("music", "album", "bad"), "{}");
    let escaped = Document::update(
        DocumentId::new("music", "album", "a/b c?d").with_group("x/y"),
        "{}",
    )
    .with_condition("album.year > 1980")
    .with_create(true);

    group.bench_function("plain", |b| {
        b.iter(|| docfeed::method_and_url(black_box(&options), black_box(&plain)))
    });
    group.bench_function("escaped", |b| {
        b.iter(|| docfeed::method_and_url(black_box(&options), black_box(&escaped)))
    });

    group.finish();
}

// =============================================================================
// Transport Selection Benchmarks
// =============================================================================

fn bench_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector");

    for n in [1, 4, 16, 64] {
        let transports = (0..n)
            .map(|_| Box::new(NullTransport) as Box<dyn Transport>)
            .collect();
        let selector = TransportSelector::new(transports).expect("selector");

        group.bench_with_input(BenchmarkId::new("acquire_release", n), &selector, |b, s| {
            b.iter(|| black_box(s.acquire().index()))
        });
    }

    group.finish();
}

// =============================================================================
// Compression Benchmarks
// =============================================================================

fn bench_gzip(c: &mut Criterion) {
    let mut group = c.benchmark_group("gzip");

    for size in [600, 4096, 65536] {
        let body: Vec<u8> = format!(r#"{{"fields":{{"text":"{}"}}}}"#, "lorem ipsum ".repeat(size / 12))
            .into_bytes();
        let mut compressor = GzipCompressor::create();
        let mut out = Vec::with_capacity(size);

        group.bench_with_input(BenchmarkId::new("reused_compressor", size), &body, |b, body| {
            b.iter(|| {
                compressor.reset();
                out.clear();
                compressor.compress_into(body, &mut out).expect("gzip");
                black_box(out.len())
            })
        });
    }

    group.finish();
}

// =============================================================================
// Stats Benchmarks
// =============================================================================

fn bench_stats_merge(c: &mut Criterion) {
    let mut one = Stats {
        requests: 1,
        responses: 1,
        total_latency: Duration::from_millis(3),
        min_latency: Duration::from_millis(3),
        max_latency: Duration::from_millis(3),
        bytes_sent: 100,
        bytes_recv: 40,
        ..Stats::default()
    };
    one.responses_by_code.insert(200, 1);

    c.bench_function("stats_merge", |b| {
        let mut total = Stats::default();
        b.iter(|| total.add(black_box(&one)))
    });
}

criterion_group!(
    benches,
    bench_method_and_url,
    bench_selector,
    bench_gzip,
    bench_stats_merge
);
criterion_main!(benches);
