//! `inspect` command: static report on a guest module.

use crate::commands::common::read_guest_module;
use crate::formatters::format_output;
use crate::settings::Settings;
use anyhow::{Context, Result};
use multimatch_core::cli::{ExitCode, OutputFormat};
use multimatch_wasm::{GuestRuntime, ModuleReport};
use std::path::Path;
use tracing::{info, warn};

/// Runs the inspect command.
///
/// Exits with [`ExitCode::GUEST_ERROR`] when the module does not implement
/// the matcher ABI.
///
/// # Errors
///
/// Returns an error if the module cannot be read or compiled.
pub fn run(module: &Path, settings: &Settings, output_format: OutputFormat) -> Result<ExitCode> {
    let report = inspect(module, settings)?;
    println!("{}", format_output(&report, output_format)?);

    if report.conforms {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::GUEST_ERROR)
    }
}

/// Builds the conformance report for the module at `path`.
///
/// # Errors
///
/// Returns an error if the module cannot be read or compiled.
pub fn inspect(path: &Path, settings: &Settings) -> Result<ModuleReport> {
    let bytes = read_guest_module(path)?;
    let runtime =
        GuestRuntime::new(settings.guest.clone()).context("failed to create guest runtime")?;
    let report = runtime
        .inspect(&bytes)
        .with_context(|| format!("failed to compile guest module {}", path.display()))?;

    for check in report.violations() {
        warn!(export = check.name, status = %check.status, "guest ABI violation");
    }
    for import in report.stubbed_imports() {
        warn!(module = %import.module, name = %import.name, "guest import will trap if called");
    }
    info!(
        path = %path.display(),
        conforms = report.conforms,
        imports = report.imports.len(),
        exports = report.exports.len(),
        "inspected guest module"
    );
    Ok(report)
}
