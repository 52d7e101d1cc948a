// Prints the in-memory size of the public types
use multimatch_core::stats::{BridgeStats, MatcherSnapshot};
use multimatch_core::{Backend, Error, MatcherConfig, MatcherState, MemoryLimit, PatternSet, Result};
use std::mem::size_of;

fn main() {
    println!("=== Errors ===");
    println!("Error: {} bytes", size_of::<Error>());
    println!("Result<()>: {} bytes", size_of::<Result<()>>());
    println!("Result<Option<usize>>: {} bytes", size_of::<Result<Option<usize>>>());

    println!("\n=== Domain Types ===");
    println!("PatternSet: {} bytes", size_of::<PatternSet>());
    println!("Backend: {} bytes", size_of::<Backend>());
    println!("MatcherState: {} bytes", size_of::<MatcherState>());
    println!("MemoryLimit: {} bytes", size_of::<MemoryLimit>());

    println!("\n=== Config and Stats ===");
    println!("MatcherConfig: {} bytes", size_of::<MatcherConfig>());
    println!("BridgeStats: {} bytes", size_of::<BridgeStats>());
    println!("MatcherSnapshot: {} bytes", size_of::<MatcherSnapshot>());
}
