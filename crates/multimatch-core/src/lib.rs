//! Core types, the matcher contract, and errors for multimatch.
//!
//! This crate is shared by every backend crate and by the CLI.
//!
//! # Architecture
//!
//! The core consists of:
//! - Strong domain types (`PatternSet`, `Backend`, `MatcherState`, `MemoryLimit`)
//! - One error enum covering compilation, the guest bridge and lifecycle misuse
//! - The [`Matcher`] trait with strict and lenient matching operations
//! - Configuration and statistics snapshot types
//!
//! # Examples
//!
//! ```
//! use multimatch_core::{Backend, MatcherConfig, PatternSet};
//!
//! let patterns = PatternSet::new(["error", "fail", "panic"]).unwrap();
//! let config = MatcherConfig::default();
//!
//! assert_eq!(patterns.len(), 3);
//! assert!(!config.case_insensitive);
//! assert_eq!(Backend::ALL.len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod matcher;
mod types;

pub mod cli;
pub mod stats;

pub use config::{MatcherConfig, MatcherConfigBuilder};
pub use error::{Error, Result};
pub use matcher::Matcher;
pub use types::{Backend, MatcherState, MemoryLimit, PatternSet};
