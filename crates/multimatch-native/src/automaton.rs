//! Automaton backend: all patterns compiled into one regex and matched in a
//! single pass over the input.

use multimatch_core::{Backend, Error, Matcher, MatcherConfig, MatcherState, PatternSet, Result};
use regex_automata::meta::{BuildError, Regex};
use regex_automata::util::syntax;
use regex_automata::{Input, MatchKind, PatternSet as HitSet};
use serde::Serialize;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// Whether a [`AutomatonMatcher::scan`] should keep reporting hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Report the next matching pattern.
    Continue,
    /// Stop scanning.
    Stop,
}

/// Description of a compiled automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutomatonInfo {
    /// Number of patterns compiled in.
    pub pattern_count: usize,
    /// Heap bytes used by the compiled regex and its caches.
    pub memory_usage: usize,
    /// Whether patterns were compiled case-insensitively.
    pub case_insensitive: bool,
}

impl fmt::Display for AutomatonInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "meta automaton: {} patterns, {} bytes, {}",
            self.pattern_count,
            self.memory_usage,
            if self.case_insensitive {
                "case-insensitive"
            } else {
                "case-sensitive"
            }
        )
    }
}

/// Matcher that evaluates every pattern simultaneously.
///
/// Uses overlapping search, so [`match_all`](Matcher::match_all) reports
/// every pattern that matches anywhere in the input.
///
/// # Examples
///
/// ```
/// use multimatch_core::{Matcher, MatcherConfig, PatternSet};
/// use multimatch_native::AutomatonMatcher;
///
/// let patterns = PatternSet::new(["error", "fail", "panic"]).unwrap();
/// let matcher = AutomatonMatcher::compile(&patterns, &MatcherConfig::default()).unwrap();
///
/// assert_eq!(matcher.match_first("it will fail, then panic"), Some(1));
/// assert_eq!(matcher.match_all("panic: error"), vec![0, 2]);
/// assert!(matcher.memory_usage() > 0);
/// ```
#[derive(Debug)]
pub struct AutomatonMatcher {
    regex: RwLock<Option<Regex>>,
    patterns: PatternSet,
    case_insensitive: bool,
}

impl AutomatonMatcher {
    /// Compiles `patterns` into a single automaton.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CompileError`] (with the offending index when the
    /// engine can attribute the failure to one pattern), or
    /// [`Error::ConfigError`] for an invalid `config`.
    pub fn compile(patterns: &PatternSet, config: &MatcherConfig) -> Result<Self> {
        config.validate()?;
        let started = Instant::now();

        let mut engine = Regex::config().match_kind(MatchKind::All);
        // None disables the NFA limit in regex-automata; keep its default instead.
        if let Some(limit) = config.size_limit {
            engine = engine.nfa_size_limit(Some(limit));
        }

        let regex = Regex::builder()
            .syntax(syntax::Config::new().case_insensitive(config.case_insensitive))
            .configure(engine)
            .build_many(patterns.as_slice())
            .map_err(|e| compile_error(&e))?;

        info!(
            patterns = regex.pattern_len(),
            memory_usage = regex.memory_usage(),
            elapsed_us = started.elapsed().as_micros(),
            "compiled automaton matcher"
        );

        Ok(Self {
            regex: RwLock::new(Some(regex)),
            patterns: patterns.clone(),
            case_insensitive: config.case_insensitive,
        })
    }

    /// Patterns this matcher was compiled from.
    #[must_use]
    pub const fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Heap bytes used by the compiled automaton, or 0 once closed.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.with_regex("inspect", Regex::memory_usage).unwrap_or(0)
    }

    /// Describes the compiled automaton.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] once closed.
    pub fn database_info(&self) -> Result<AutomatonInfo> {
        self.with_regex("inspect", |regex| AutomatonInfo {
            pattern_count: regex.pattern_len(),
            memory_usage: regex.memory_usage(),
            case_insensitive: self.case_insensitive,
        })
    }

    /// Reports matching pattern indices in ascending order until `on_match`
    /// returns [`Scan::Stop`]. Returns the number of indices reported.
    ///
    /// The input is searched once for every pattern before the first call
    /// to `on_match`; [`Scan::Stop`] ends reporting, not the search.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] once closed.
    ///
    /// # Examples
    ///
    /// ```
    /// use multimatch_core::{MatcherConfig, PatternSet};
    /// use multimatch_native::{AutomatonMatcher, Scan};
    ///
    /// let patterns = PatternSet::new(["a", "b", "c"]).unwrap();
    /// let matcher = AutomatonMatcher::compile(&patterns, &MatcherConfig::default()).unwrap();
    ///
    /// let mut seen = Vec::new();
    /// let reported = matcher
    ///     .scan("abc", |index| {
    ///         seen.push(index);
    ///         if seen.len() == 2 { Scan::Stop } else { Scan::Continue }
    ///     })
    ///     .unwrap();
    /// assert_eq!(reported, 2);
    /// assert_eq!(seen, vec![0, 1]);
    /// ```
    pub fn scan(&self, input: &str, mut on_match: impl FnMut(usize) -> Scan) -> Result<usize> {
        let hits = self.with_regex("scan", |regex| overlapping(regex, input))?;
        let mut reported = 0;
        for index in hits.iter().map(|id| id.as_usize()) {
            reported += 1;
            if on_match(index) == Scan::Stop {
                debug!(reported, "scan stopped early");
                break;
            }
        }
        Ok(reported)
    }

    fn with_regex<T>(&self, operation: &'static str, f: impl FnOnce(&Regex) -> T) -> Result<T> {
        let guard = self.regex.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f).ok_or(Error::InvalidState {
            operation,
            state: MatcherState::Closed,
        })
    }
}

fn overlapping(regex: &Regex, input: &str) -> HitSet {
    let mut hits = HitSet::new(regex.pattern_len());
    regex.which_overlapping_matches(&Input::new(input), &mut hits);
    hits
}

fn compile_error(e: &BuildError) -> Error {
    let index = e.pattern().map(|id| id.as_usize());
    let message = e.size_limit().map_or_else(
        || e.to_string(),
        |limit| format!("compiled automaton exceeds size limit of {limit} bytes"),
    );
    Error::compile(Backend::Automaton, index, message)
}

impl Matcher for AutomatonMatcher {
    fn backend(&self) -> Backend {
        Backend::Automaton
    }

    fn state(&self) -> MatcherState {
        let guard = self.regex.read().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            MatcherState::Ready
        } else {
            MatcherState::Closed
        }
    }

    fn pattern_count(&self) -> usize {
        self.with_regex("count patterns of", Regex::pattern_len)
            .unwrap_or(0)
    }

    fn supports_multi_match(&self) -> bool {
        true
    }

    fn try_match_first(&self, input: &str) -> Result<Option<usize>> {
        self.with_regex("match", |regex| {
            overlapping(regex, input)
                .iter()
                .next()
                .map(|id| id.as_usize())
        })
    }

    fn try_match_all(&self, input: &str) -> Result<Vec<usize>> {
        self.with_regex("match", |regex| {
            overlapping(regex, input)
                .iter()
                .map(|id| id.as_usize())
                .collect()
        })
    }

    fn close(&self) {
        let mut guard = self.regex.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            debug!("closed automaton matcher");
        }
    }
}
