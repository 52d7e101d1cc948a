//! Sequential backend: one compiled regex per pattern.
//!
//! Patterns are tested one after another in index order, so the first hit
//! is also the smallest matching index. Cost grows linearly with the number
//! of patterns.

use multimatch_core::{Backend, Error, Matcher, MatcherConfig, MatcherState, PatternSet, Result};
use regex::{Regex, RegexBuilder};
use std::sync::{PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// Matcher that scans patterns one at a time.
///
/// # Examples
///
/// ```
/// use multimatch_core::{Matcher, MatcherConfig, PatternSet};
/// use multimatch_native::SequentialMatcher;
///
/// let patterns = PatternSet::new(["error", "fail", "panic"]).unwrap();
/// let matcher = SequentialMatcher::compile(&patterns, &MatcherConfig::default()).unwrap();
///
/// assert_eq!(matcher.match_first("error occurred"), Some(0));
/// assert_eq!(matcher.match_all("error and fail"), vec![0, 1]);
/// assert_eq!(matcher.match_first("all good"), None);
/// ```
#[derive(Debug)]
pub struct SequentialMatcher {
    regexes: RwLock<Option<Box<[Regex]>>>,
    patterns: PatternSet,
}

impl SequentialMatcher {
    /// Compiles every pattern of `patterns` into its own regex.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CompileError`] naming the first pattern that fails
    /// to compile, or [`Error::ConfigError`] for an invalid `config`.
    pub fn compile(patterns: &PatternSet, config: &MatcherConfig) -> Result<Self> {
        config.validate()?;
        let started = Instant::now();

        let regexes = patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                let mut builder = RegexBuilder::new(pattern);
                builder.case_insensitive(config.case_insensitive);
                if let Some(limit) = config.size_limit {
                    builder.size_limit(limit);
                }
                builder
                    .build()
                    .map_err(|e| Error::compile(Backend::Sequential, Some(index), e.to_string()))
            })
            .collect::<Result<Box<[Regex]>>>()?;

        info!(
            patterns = regexes.len(),
            elapsed_us = started.elapsed().as_micros(),
            "compiled sequential matcher"
        );

        Ok(Self {
            regexes: RwLock::new(Some(regexes)),
            patterns: patterns.clone(),
        })
    }

    /// Patterns this matcher was compiled from.
    #[must_use]
    pub const fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    fn with_regexes<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&[Regex]) -> T,
    ) -> Result<T> {
        let guard = self.regexes.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_deref().map(f).ok_or(Error::InvalidState {
            operation,
            state: MatcherState::Closed,
        })
    }
}

impl Matcher for SequentialMatcher {
    fn backend(&self) -> Backend {
        Backend::Sequential
    }

    fn state(&self) -> MatcherState {
        let guard = self.regexes.read().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            MatcherState::Ready
        } else {
            MatcherState::Closed
        }
    }

    fn pattern_count(&self) -> usize {
        self.with_regexes("count patterns of", <[Regex]>::len)
            .unwrap_or(0)
    }

    fn supports_multi_match(&self) -> bool {
        true
    }

    fn try_match_first(&self, input: &str) -> Result<Option<usize>> {
        self.with_regexes("match", |regexes| {
            regexes.iter().position(|re| re.is_match(input))
        })
    }

    fn try_match_all(&self, input: &str) -> Result<Vec<usize>> {
        self.with_regexes("match", |regexes| {
            regexes
                .iter()
                .enumerate()
                .filter_map(|(index, re)| re.is_match(input).then_some(index))
                .collect()
        })
    }

    fn close(&self) {
        let mut guard = self.regexes.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            debug!("closed sequential matcher");
        }
    }
}
