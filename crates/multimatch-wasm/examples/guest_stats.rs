//! Compiles the reference guest, runs a few inputs and prints bridge
//! statistics.
//!
//! Run with: `cargo run --example guest_stats`

use multimatch_core::stats::StatsProvider;
use multimatch_core::{Matcher, PatternSet};
use multimatch_wasm::{GuestConfig, GuestRuntime};

const LITERAL_MATCHER: &str = include_str!("../tests/guests/literal_matcher.wat");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== multimatch guest statistics ===\n");

    let runtime = GuestRuntime::new(GuestConfig::default())?;
    let wasm = wat::parse_str(LITERAL_MATCHER)?;

    let report = runtime.inspect(&wasm)?;
    println!("Guest module: {} bytes, conforms: {}", report.size_bytes, report.conforms);

    let patterns = PatternSet::new(["error", "warning", "critical"])?;
    let matcher = runtime.compile_matcher(&wasm, &patterns)?;

    for input in [
        "System error occurred",
        "warning: disk almost full",
        "all systems nominal",
        "critical failure",
    ] {
        match matcher.try_match_first(input)? {
            Some(index) => println!("  {input:?} -> pattern {index} ({:?})", patterns.get(index)),
            None => println!("  {input:?} -> no match"),
        }
    }
    println!();

    let snapshot = matcher.capture_stats();
    println!("Snapshot at {}:", snapshot.snapshot_time());
    if let Some(bridge) = snapshot.bridge() {
        println!("  Guest calls: {}", bridge.guest_calls);
        println!("  Allocations: {}", bridge.allocations);
        println!("  Outstanding buffers: {}", bridge.outstanding_buffers());
        println!("  Bytes written: {}", bridge.bytes_written);
        if let Some(rate) = bridge.hit_rate() {
            println!("  Hit rate: {:.1}%", rate * 100.0);
        }
    }
    println!("  Module cache entries: {}", runtime.module_cache().len());

    matcher.close();
    Ok(())
}
