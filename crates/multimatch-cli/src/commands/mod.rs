//! Command implementations for the multimatch CLI.
//!
//! Each command module loads its inputs, runs the operation and formats a
//! serializable report according to the requested output format.

pub mod backends;
pub mod common;
pub mod compare;
pub mod completions;
pub mod inspect;
pub mod matching;
