//! `compare` command: run several backends over the same inputs.

use crate::cli::{GuestArgs, PatternArgs};
use crate::commands::backends::BackendFactory;
use crate::commands::common::{load_patterns, read_inputs};
use crate::formatters::format_output;
use crate::settings::Settings;
use anyhow::Result;
use multimatch_core::cli::{ExitCode, OutputFormat};
use multimatch_core::{Backend, Matcher, PatternSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of one backend over all inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendRun {
    /// Backend name
    pub backend: Backend,
    /// Compilation error, when the backend could not compile the patterns
    pub error: Option<String>,
    /// Compile time in milliseconds
    pub compile_ms: f64,
    /// Total time spent matching, in milliseconds
    pub match_ms: f64,
    /// Inputs with at least one match
    pub hits: usize,
    /// Inputs on which the matcher returned an error
    pub failures: usize,
    /// Inputs matched per second
    pub inputs_per_sec: Option<f64>,
    /// Input bytes matched per second
    pub bytes_per_sec: Option<f64>,
}

/// An input on which backends returned different first matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disagreement {
    /// 1-based line number in the input file
    pub line: usize,
    /// The input text
    pub input: String,
    /// First matching index per backend
    pub results: BTreeMap<&'static str, Option<usize>>,
}

/// Full comparison result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareReport {
    /// Number of patterns
    pub patterns: usize,
    /// Number of inputs
    pub inputs: usize,
    /// One entry per requested backend
    pub backends: Vec<BackendRun>,
    /// True when every compiled backend agreed on every input
    pub consistent: bool,
    /// Total number of disagreeing inputs
    pub disagreement_count: usize,
    /// The first disagreeing inputs
    pub disagreements: Vec<Disagreement>,
}

/// Runs the compare command.
///
/// Exits with [`ExitCode::SUCCESS`] when every backend compiled and all of
/// them agree, [`ExitCode::ERROR`] otherwise.
///
/// # Errors
///
/// Returns an error if patterns, inputs or the guest module cannot be
/// loaded.
pub fn run(
    inputs_path: &Path,
    backends: &[Backend],
    max_disagreements: usize,
    pattern_args: &PatternArgs,
    guest_args: &GuestArgs,
    mut settings: Settings,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    settings.apply_pattern_args(pattern_args)?;
    settings.apply_guest_args(guest_args)?;

    let patterns = load_patterns(pattern_args)?;
    let inputs = read_inputs(inputs_path)?;
    let factory = BackendFactory::new(&settings, guest_args.module.as_deref())?;

    let backends = if backends.is_empty() {
        factory.available()
    } else {
        backends.to_vec()
    };

    let report = compare(&factory, &backends, &patterns, &inputs, max_disagreements);
    println!("{}", format_output(&report, output_format)?);

    let all_compiled = report.backends.iter().all(|run| run.error.is_none());
    Ok(if report.consistent && all_compiled {
        ExitCode::SUCCESS
    } else {
        ExitCode::ERROR
    })
}

/// Compiles `patterns` with each backend and matches every input.
///
/// Backends that fail to compile are reported with their error and left
/// out of the agreement check. A per-input matcher error counts as a
/// failure and as no match.
#[must_use]
pub fn compare(
    factory: &BackendFactory,
    backends: &[Backend],
    patterns: &PatternSet,
    inputs: &[String],
    max_disagreements: usize,
) -> CompareReport {
    let total_bytes: usize = inputs.iter().map(String::len).sum();
    let mut runs = Vec::with_capacity(backends.len());
    let mut columns: Vec<(Backend, Vec<Option<usize>>)> = Vec::new();

    for &backend in backends {
        match factory.build_timed(backend, patterns) {
            Ok((matcher, compile_time)) => {
                let (results, run) =
                    run_backend(matcher.as_ref(), inputs, total_bytes, compile_time);
                matcher.close();
                info!(
                    %backend,
                    hits = run.hits,
                    failures = run.failures,
                    match_ms = run.match_ms,
                    "backend finished"
                );
                runs.push(run);
                columns.push((backend, results));
            }
            Err(e) => {
                warn!(%backend, error = %e, "backend failed to compile patterns");
                runs.push(BackendRun {
                    backend,
                    error: Some(e.to_string()),
                    compile_ms: 0.0,
                    match_ms: 0.0,
                    hits: 0,
                    failures: 0,
                    inputs_per_sec: None,
                    bytes_per_sec: None,
                });
            }
        }
    }

    let (disagreement_count, disagreements) =
        find_disagreements(&columns, inputs, max_disagreements);

    CompareReport {
        patterns: patterns.len(),
        inputs: inputs.len(),
        backends: runs,
        consistent: disagreement_count == 0,
        disagreement_count,
        disagreements,
    }
}

/// Counts inputs on which the columns differ and keeps the first `max`.
fn find_disagreements(
    columns: &[(Backend, Vec<Option<usize>>)],
    inputs: &[String],
    max: usize,
) -> (usize, Vec<Disagreement>) {
    let mut count = 0;
    let mut kept = Vec::new();
    let Some((_, reference)) = columns.first() else {
        return (count, kept);
    };
    for (i, input) in inputs.iter().enumerate() {
        if columns.iter().all(|(_, results)| results[i] == reference[i]) {
            continue;
        }
        count += 1;
        if kept.len() < max {
            kept.push(Disagreement {
                line: i + 1,
                input: input.clone(),
                results: columns
                    .iter()
                    .map(|(backend, results)| (backend.as_str(), results[i]))
                    .collect(),
            });
        }
    }
    (count, kept)
}

#[allow(clippy::cast_precision_loss)]
fn run_backend(
    matcher: &dyn Matcher,
    inputs: &[String],
    total_bytes: usize,
    compile_time: Duration,
) -> (Vec<Option<usize>>, BackendRun) {
    let mut failures = 0;
    let started = Instant::now();
    let results: Vec<Option<usize>> = inputs
        .iter()
        .map(|input| {
            matcher.try_match_first(input).unwrap_or_else(|e| {
                failures += 1;
                warn!(backend = %matcher.backend(), error = %e, "match failed");
                None
            })
        })
        .collect();
    let elapsed = started.elapsed().as_secs_f64();

    let per_sec = |count: usize| (elapsed > 0.0).then_some(count as f64 / elapsed);
    let run = BackendRun {
        backend: matcher.backend(),
        error: None,
        compile_ms: compile_time.as_secs_f64() * 1000.0,
        match_ms: elapsed * 1000.0,
        hits: results.iter().filter(|r| r.is_some()).count(),
        failures,
        inputs_per_sec: per_sec(inputs.len()),
        bytes_per_sec: per_sec(total_bytes),
    };
    (results, run)
}
