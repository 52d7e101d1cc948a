//! Command execution and runtime logic.
//!
//! Contains command dispatch, logging initialization and the mapping from
//! errors to process exit codes.

use anyhow::Result;
use multimatch_core::cli::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::commands;
use crate::settings::Settings;

/// Initializes logging infrastructure.
///
/// Logs go to stderr so that command output on stdout stays parseable.
/// `--verbose` forces debug level; otherwise `RUST_LOG` applies, with
/// `info` as the default.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Executes the parsed command line.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the command
/// fails.
pub fn execute_command(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?;
    let format = cli.format;

    match cli.command {
        Commands::Match {
            input,
            backend,
            all,
            patterns,
            guest,
        } => commands::matching::run(&input, backend, all, &patterns, &guest, settings, format),
        Commands::Compare {
            inputs,
            backends,
            max_disagreements,
            patterns,
            guest,
        } => commands::compare::run(
            &inputs,
            &backends,
            max_disagreements,
            &patterns,
            &guest,
            settings,
            format,
        ),
        Commands::Inspect { module } => commands::inspect::run(&module, &settings, format),
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd)
        }
    }
}

/// Picks the exit code for a failed command.
///
/// Library errors anywhere in the chain map through
/// [`ExitCode::from_error`]; anything else is a generic error.
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<multimatch_core::Error>())
        .map_or(ExitCode::ERROR, ExitCode::from_error)
}
