//! CLI argument definitions and parsing.
//!
//! Defines the command-line interface structure using clap:
//! - `Cli` - Main CLI entry point
//! - `Commands` - Available subcommands
//! - `PatternArgs` / `GuestArgs` - argument groups shared by subcommands

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use multimatch_core::Backend;
use multimatch_core::cli::OutputFormat;
use std::path::PathBuf;

/// multimatch - compile a pattern set once, match many inputs.
///
/// Runs the same pattern set through a sequential regex matcher, a
/// combined automaton, or a sandboxed WebAssembly guest, and compares them.
#[derive(Parser, Debug)]
#[command(name = "multimatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long = "format", global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// TOML file with `[matcher]` and `[guest]` tables
    #[arg(long, global = true, env = "MULTIMATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile patterns with one backend and match a single input.
    ///
    /// Exits with 0 when the input matches and 1 when it does not.
    ///
    /// # Examples
    ///
    /// ```bash
    /// multimatch match -p error -p warning "disk warning"
    /// multimatch match --backend automaton -f patterns.txt --all "input"
    /// multimatch match --backend guest --guest matcher.wasm -p needle "haystack"
    /// ```
    Match {
        /// Input text to match
        input: String,

        /// Backend to compile the patterns with
        #[arg(short, long, value_enum, default_value_t = Backend::Sequential)]
        backend: Backend,

        /// Report every matching pattern instead of the first
        #[arg(short, long)]
        all: bool,

        #[command(flatten)]
        patterns: PatternArgs,

        #[command(flatten)]
        guest: GuestArgs,
    },

    /// Run several backends over an input file and compare them.
    ///
    /// Reports compile time, hits and throughput per backend and lists the
    /// lines on which backends disagree. Exits with 2 when any two
    /// backends disagree.
    ///
    /// # Examples
    ///
    /// ```bash
    /// multimatch compare -f patterns.txt access.log
    /// multimatch compare -f patterns.txt --guest matcher.wasm access.log
    /// ```
    Compare {
        /// File with one input per line
        inputs: PathBuf,

        /// Backends to run (default: sequential, automaton, and guest when
        /// --guest is given)
        #[arg(short, long = "backend", value_enum)]
        backends: Vec<Backend>,

        /// Maximum number of disagreeing lines to list
        #[arg(long, default_value_t = 10)]
        max_disagreements: usize,

        #[command(flatten)]
        patterns: PatternArgs,

        #[command(flatten)]
        guest: GuestArgs,
    },

    /// Describe a guest module's imports, exports and ABI conformance.
    ///
    /// Exits with 4 when a required export is missing or mistyped.
    Inspect {
        /// Guest module (.wasm or .wat)
        module: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell for completion generation
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Where patterns come from and how native backends compile them.
#[derive(Args, Debug, Clone, Default)]
pub struct PatternArgs {
    /// Pattern (repeatable; commas separate several patterns)
    #[arg(short = 'p', long = "pattern", value_delimiter = ',')]
    pub patterns: Vec<String>,

    /// File with one pattern per line (blank lines and # comments skipped)
    #[arg(short = 'f', long = "patterns-file")]
    pub patterns_file: Option<PathBuf>,

    /// Case-insensitive matching (native backends)
    #[arg(short = 'i', long)]
    pub case_insensitive: bool,

    /// Compiled program size limit in bytes (native backends)
    #[arg(long)]
    pub size_limit: Option<usize>,
}

/// Guest module selection and limits.
#[derive(Args, Debug, Clone, Default)]
pub struct GuestArgs {
    /// Guest module implementing the matcher ABI (.wasm or .wat)
    #[arg(long = "guest")]
    pub module: Option<PathBuf>,

    /// Guest linear memory limit in megabytes
    #[arg(long)]
    pub memory_limit_mb: Option<usize>,

    /// Continue when the guest reports an unsupported platform
    #[arg(long)]
    pub allow_unsupported_platform: bool,

    /// Do not provide WASI to the guest
    #[arg(long)]
    pub no_wasi: bool,
}
