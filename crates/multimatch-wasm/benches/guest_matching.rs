//! Criterion benchmarks for the guest backend.
//!
//! Run with: cargo bench --package multimatch-wasm

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use multimatch_core::{Matcher, PatternSet};
use multimatch_wasm::{GuestConfig, GuestRuntime};
use std::hint::black_box;

const LITERAL_MATCHER: &str = include_str!("../tests/guests/literal_matcher.wat");

fn keywords() -> PatternSet {
    PatternSet::new(["error", "warning", "critical", "timeout", "refused"])
        .expect("non-empty pattern set")
}

/// Guest instantiation plus the compile handshake, with a warm module cache.
fn bench_matcher_construction(c: &mut Criterion) {
    let wasm = wat::parse_str(LITERAL_MATCHER).expect("Failed to parse WAT");
    let runtime = GuestRuntime::new(GuestConfig::default()).expect("Failed to create runtime");
    let patterns = keywords();
    runtime.load_module(&wasm).expect("Failed to compile module");

    c.bench_function("guest_matcher_construction", |b| {
        b.iter(|| {
            let matcher = runtime
                .compile_matcher(black_box(&wasm), &patterns)
                .expect("Failed to compile patterns");
            black_box(matcher)
        });
    });
}

/// Cold module compilation, bypassing the cache.
fn bench_module_compilation(c: &mut Criterion) {
    let wasm = wat::parse_str(LITERAL_MATCHER).expect("Failed to parse WAT");

    c.bench_function("guest_module_compilation", |b| {
        b.iter(|| {
            let runtime =
                GuestRuntime::new(GuestConfig::default()).expect("Failed to create runtime");
            black_box(runtime.load_module(black_box(&wasm)).expect("Failed to compile module"))
        });
    });
}

/// Per-input matching cost, including the buffer round trip.
fn bench_match_first(c: &mut Criterion) {
    let wasm = wat::parse_str(LITERAL_MATCHER).expect("Failed to parse WAT");
    let runtime = GuestRuntime::new(GuestConfig::default()).expect("Failed to create runtime");
    let matcher = runtime
        .compile_matcher(&wasm, &keywords())
        .expect("Failed to compile patterns");

    let mut group = c.benchmark_group("guest_match_first");
    for size in [64_usize, 1024, 16 * 1024] {
        let input = "x".repeat(size - 7) + "refused";
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(matcher.match_first(black_box(input))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_matcher_construction,
    bench_module_compilation,
    bench_match_first
);
criterion_main!(benches);
