//! Native multi-pattern matchers.
//!
//! Two in-process backends implementing [`multimatch_core::Matcher`]:
//!
//! - [`SequentialMatcher`]: one regex per pattern, tested in index order
//! - [`AutomatonMatcher`]: every pattern compiled into one automaton and
//!   evaluated in a single pass
//!
//! Both report the smallest matching index and support match-all.
//!
//! # Examples
//!
//! ```
//! use multimatch_core::{Matcher, MatcherConfig, PatternSet};
//! use multimatch_native::{AutomatonMatcher, SequentialMatcher};
//!
//! let patterns = PatternSet::new(["error", "fail"]).unwrap();
//! let config = MatcherConfig::default();
//!
//! let sequential = SequentialMatcher::compile(&patterns, &config).unwrap();
//! let automaton = AutomatonMatcher::compile(&patterns, &config).unwrap();
//!
//! let input = "fail fast";
//! assert_eq!(sequential.match_first(input), automaton.match_first(input));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod automaton;
mod sequential;

pub use automaton::{AutomatonInfo, AutomatonMatcher, Scan};
pub use sequential::SequentialMatcher;
