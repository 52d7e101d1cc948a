//! multimatch command-line interface.
//!
//! Compiles a pattern set with one of several matching backends and
//! matches inputs against it.
//!
//! # Architecture
//!
//! The CLI is organized around subcommands:
//! - `match` - Match a single input with one backend
//! - `compare` - Run several backends over an input file and compare them
//! - `inspect` - Check a guest module against the matcher ABI
//! - `completions` - Generate shell completions
//!
//! # Examples
//!
//! ```bash
//! multimatch match -p error -p warning "disk warning"
//! multimatch compare -f patterns.txt --guest matcher.wasm access.log
//! multimatch --format json inspect matcher.wasm
//! ```

use clap::Parser;
use multimatch_cli::Cli;
use multimatch_cli::runner::{execute_command, exit_code_for, init_logging};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    let exit_code = match execute_command(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    };

    std::process::exit(exit_code.as_i32());
}
