//! Input loading shared across CLI commands.

use crate::cli::PatternArgs;
use anyhow::{Context, Result};
use multimatch_core::PatternSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Collects patterns from `-p` flags followed by the `-f` file.
///
/// # Errors
///
/// Returns an error if the pattern file cannot be read or no pattern was
/// given at all.
///
/// # Examples
///
/// ```
/// use multimatch_cli::cli::PatternArgs;
/// use multimatch_cli::commands::common::load_patterns;
///
/// let args = PatternArgs {
///     patterns: vec!["error".into(), "warn".into()],
///     ..PatternArgs::default()
/// };
/// let set = load_patterns(&args).unwrap();
/// assert_eq!(set.len(), 2);
/// ```
pub fn load_patterns(args: &PatternArgs) -> Result<PatternSet> {
    let mut patterns = args.patterns.clone();
    if let Some(path) = &args.patterns_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read pattern file {}", path.display()))?;
        let from_file = parse_pattern_lines(&text);
        debug!(path = %path.display(), count = from_file.len(), "loaded pattern file");
        patterns.extend(from_file);
    }
    PatternSet::new(patterns).context("no patterns given (use -p or -f)")
}

/// Splits a pattern file into patterns.
///
/// Each line is one pattern, trimmed of surrounding whitespace. Blank lines
/// and lines whose first non-blank character is `#` are skipped.
#[must_use]
pub fn parse_pattern_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads an input file, one input per line.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_inputs(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    Ok(text
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect())
}

/// Reads a guest module in binary or text format.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_guest_module(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read guest module {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read guest module");
    Ok(bytes)
}
