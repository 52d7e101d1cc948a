//! `match` command: compile once, match one input.

use crate::cli::{GuestArgs, PatternArgs};
use crate::commands::backends::BackendFactory;
use crate::commands::common::load_patterns;
use crate::formatters::format_output;
use crate::settings::Settings;
use anyhow::{Context, Result};
use multimatch_core::cli::{ExitCode, OutputFormat};
use multimatch_core::{Backend, Matcher, PatternSet};
use serde::Serialize;
use tracing::{info, warn};

/// A pattern that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternHit {
    /// Index in the pattern set
    pub index: usize,
    /// The pattern text
    pub pattern: String,
}

/// Outcome of matching one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    /// Backend that produced the result
    pub backend: Backend,
    /// Number of compiled patterns
    pub pattern_count: usize,
    /// The input text
    pub input: String,
    /// Whether any pattern matched
    pub matched: bool,
    /// Matching patterns: the first one, or all of them with `--all`
    pub hits: Vec<PatternHit>,
    /// Compile time in milliseconds
    pub compile_ms: f64,
}

/// Runs the match command.
///
/// # Errors
///
/// Returns an error if patterns or the guest module cannot be loaded, or
/// if compilation or matching fails.
pub fn run(
    input: &str,
    backend: Backend,
    all: bool,
    pattern_args: &PatternArgs,
    guest_args: &GuestArgs,
    mut settings: Settings,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    settings.apply_pattern_args(pattern_args)?;
    settings.apply_guest_args(guest_args)?;

    let patterns = load_patterns(pattern_args)?;
    let factory = BackendFactory::new(&settings, guest_args.module.as_deref())?;
    let (matcher, compile_time) = factory
        .build_timed(backend, &patterns)
        .with_context(|| format!("failed to compile patterns with the {backend} backend"))?;

    let mut report = evaluate(matcher.as_ref(), &patterns, input, all)?;
    report.compile_ms = compile_time.as_secs_f64() * 1000.0;
    matcher.close();

    info!(%backend, matched = report.matched, hits = report.hits.len(), "match finished");
    println!("{}", format_output(&report, output_format)?);

    Ok(if report.matched {
        ExitCode::SUCCESS
    } else {
        ExitCode::NO_MATCH
    })
}

/// Matches `input` with a ready matcher.
///
/// With `all`, backends without multi-match support report at most one
/// hit.
///
/// # Errors
///
/// Returns an error if the matcher fails on the input.
pub fn evaluate(
    matcher: &dyn Matcher,
    patterns: &PatternSet,
    input: &str,
    all: bool,
) -> Result<MatchReport> {
    let indices = if all {
        if !matcher.supports_multi_match() {
            warn!(
                backend = %matcher.backend(),
                "backend reports at most one match per input"
            );
        }
        matcher.try_match_all(input)?
    } else {
        matcher.try_match_first(input)?.into_iter().collect()
    };

    let hits: Vec<PatternHit> = indices
        .into_iter()
        .map(|index| PatternHit {
            index,
            pattern: patterns.get(index).unwrap_or_default().to_string(),
        })
        .collect();

    Ok(MatchReport {
        backend: matcher.backend(),
        pattern_count: matcher.pattern_count(),
        input: input.to_string(),
        matched: !hits.is_empty(),
        hits,
        compile_ms: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use multimatch_core::MatcherConfig;
    use multimatch_native::{AutomatonMatcher, SequentialMatcher};

    fn keywords() -> PatternSet {
        PatternSet::new(["error", "warning", "critical"]).unwrap()
    }

    #[test]
    fn test_evaluate_first() {
        let patterns = keywords();
        let matcher = SequentialMatcher::compile(&patterns, &MatcherConfig::default()).unwrap();

        let report = evaluate(&matcher, &patterns, "critical error", false).unwrap();
        assert!(report.matched);
        assert_eq!(report.backend, Backend::Sequential);
        assert_eq!(report.pattern_count, 3);
        assert_eq!(
            report.hits,
            vec![PatternHit {
                index: 0,
                pattern: "error".to_string()
            }]
        );
    }

    #[test]
    fn test_evaluate_all() {
        let patterns = keywords();
        let matcher = AutomatonMatcher::compile(&patterns, &MatcherConfig::default()).unwrap();

        let report = evaluate(&matcher, &patterns, "critical error", true).unwrap();
        let indices: Vec<_> = report.hits.iter().map(|h| h.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_evaluate_no_match() {
        let patterns = keywords();
        let matcher = SequentialMatcher::compile(&patterns, &MatcherConfig::default()).unwrap();

        let report = evaluate(&matcher, &patterns, "all good", true).unwrap();
        assert!(!report.matched);
        assert!(report.hits.is_empty());
    }

    #[test]
    fn test_evaluate_closed_matcher_fails() {
        let patterns = keywords();
        let matcher = SequentialMatcher::compile(&patterns, &MatcherConfig::default()).unwrap();
        matcher.close();

        let err = evaluate(&matcher, &patterns, "error", false).unwrap_err();
        let core = err.downcast_ref::<multimatch_core::Error>().unwrap();
        assert!(core.is_invalid_state());
    }
}
