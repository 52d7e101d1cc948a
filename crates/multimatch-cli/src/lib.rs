//! multimatch CLI library.
//!
//! Exposes the argument definitions, commands, settings and formatters
//! behind the `multimatch` binary so they can be tested directly.

pub mod cli;
pub mod commands;
pub mod formatters;
pub mod runner;
pub mod settings;

pub use cli::{Cli, Commands, GuestArgs, PatternArgs};
pub use settings::Settings;
