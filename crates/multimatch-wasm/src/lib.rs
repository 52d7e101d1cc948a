//! WASM guest backend for multimatch.
//!
//! Pattern compilation and matching run inside a sandboxed WebAssembly
//! module that implements the matcher ABI described in [`abi`]. The host
//! side is split into layers:
//!
//! - [`GuestRuntime`]: engine, import linker and compiled module cache
//! - [`GuestBridge`]: typed calls and buffer marshalling over one guest
//!   instance's linear memory
//! - [`WasmMatcher`]: the compile handshake, the match protocol and the
//!   lifecycle behind [`multimatch_core::Matcher`]
//!
//! # Examples
//!
//! ```no_run
//! use multimatch_core::{Matcher, PatternSet};
//! use multimatch_wasm::{GuestConfig, GuestRuntime};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = GuestRuntime::new(GuestConfig::default())?;
//! let guest = std::fs::read("matcher.wasm")?;
//! let matcher = runtime.compile_matcher(&guest, &PatternSet::new(["needle"])?)?;
//! assert_eq!(matcher.try_match_first("haystack with a needle")?, Some(0));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod abi;
pub mod bridge;
pub mod cache;
mod config;
mod handshake;
pub mod inspect;
mod matcher;
pub mod monitor;
mod protocol;
mod runtime;
pub mod sandbox;

pub use bridge::{GuestBridge, GuestBuffer};
pub use cache::{CacheKey, ModuleCache};
pub use config::{GuestConfig, GuestConfigBuilder};
pub use inspect::ModuleReport;
pub use matcher::WasmMatcher;
pub use monitor::BridgeMonitor;
pub use runtime::GuestRuntime;
