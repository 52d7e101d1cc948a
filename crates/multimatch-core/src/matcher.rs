//! The [`Matcher`] contract shared by every backend.
//!
//! A matcher is compiled once from a [`PatternSet`](crate::PatternSet) and
//! then answers "which pattern matches this input" any number of times,
//! from any number of threads, until it is closed.
//!
//! Each backend implements the strict operations ([`Matcher::try_match_first`]
//! and optionally [`Matcher::try_match_all`]). The lenient operations are
//! provided: they absorb per-call failures into "no match" and log them.

use crate::{Backend, MatcherState, Result};
use std::fmt;
use tracing::warn;

/// Multi-pattern matcher over a fixed, ordered pattern set.
///
/// # Lifecycle
///
/// Matchers are returned by their constructors already `Ready`. After
/// [`close`](Matcher::close) the lenient operations report no match, the
/// strict operations return [`Error::InvalidState`](crate::Error::InvalidState)
/// and [`pattern_count`](Matcher::pattern_count) returns 0.
///
/// # Examples
///
/// ```
/// use multimatch_core::{Backend, Matcher, MatcherState, Result};
///
/// #[derive(Debug)]
/// struct Contains(Vec<String>);
///
/// impl Matcher for Contains {
///     fn backend(&self) -> Backend {
///         Backend::Sequential
///     }
///
///     fn state(&self) -> MatcherState {
///         MatcherState::Ready
///     }
///
///     fn pattern_count(&self) -> usize {
///         self.0.len()
///     }
///
///     fn supports_multi_match(&self) -> bool {
///         false
///     }
///
///     fn try_match_first(&self, input: &str) -> Result<Option<usize>> {
///         Ok(self.0.iter().position(|p| input.contains(p.as_str())))
///     }
///
///     fn close(&self) {}
/// }
///
/// let m = Contains(vec!["error".into(), "fail".into()]);
/// assert_eq!(m.match_first("it will fail"), Some(1));
/// assert_eq!(m.match_all("error and fail"), vec![0]);
/// ```
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Strategy implemented by this matcher.
    fn backend(&self) -> Backend;

    /// Current lifecycle state.
    fn state(&self) -> MatcherState;

    /// Number of compiled patterns, or 0 once closed.
    fn pattern_count(&self) -> usize;

    /// Whether [`match_all`](Matcher::match_all) reports every matching
    /// pattern rather than at most one.
    fn supports_multi_match(&self) -> bool;

    /// Returns the index of a matching pattern, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`](crate::Error::InvalidState) after
    /// close, and guest bridge errors for the guest backend.
    fn try_match_first(&self, input: &str) -> Result<Option<usize>>;

    /// Returns every matching pattern index in ascending order.
    ///
    /// Single-match backends return at most one index.
    ///
    /// # Errors
    ///
    /// Same as [`try_match_first`](Matcher::try_match_first).
    fn try_match_all(&self, input: &str) -> Result<Vec<usize>> {
        Ok(self.try_match_first(input)?.into_iter().collect())
    }

    /// Lenient form of [`try_match_first`](Matcher::try_match_first).
    ///
    /// Failures are logged and reported as no match.
    fn match_first(&self, input: &str) -> Option<usize> {
        self.try_match_first(input).unwrap_or_else(|e| {
            warn!(backend = %self.backend(), error = %e, "match failed, reporting no match");
            None
        })
    }

    /// Lenient form of [`try_match_all`](Matcher::try_match_all).
    fn match_all(&self, input: &str) -> Vec<usize> {
        self.try_match_all(input).unwrap_or_else(|e| {
            warn!(backend = %self.backend(), error = %e, "match-all failed, reporting no match");
            Vec::new()
        })
    }

    /// Releases all resources. Idempotent.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Default)]
    struct Flaky {
        closed: AtomicBool,
    }

    impl Matcher for Flaky {
        fn backend(&self) -> Backend {
            Backend::Guest
        }

        fn state(&self) -> MatcherState {
            if self.closed.load(Ordering::Acquire) {
                MatcherState::Closed
            } else {
                MatcherState::Ready
            }
        }

        fn pattern_count(&self) -> usize {
            if self.state().is_ready() { 2 } else { 0 }
        }

        fn supports_multi_match(&self) -> bool {
            false
        }

        fn try_match_first(&self, input: &str) -> Result<Option<usize>> {
            if !self.state().is_ready() {
                return Err(Error::InvalidState {
                    operation: "match",
                    state: self.state(),
                });
            }
            match input {
                "trap" => Err(Error::guest_trap("matcher_match", "unreachable")),
                "hit" => Ok(Some(1)),
                _ => Ok(None),
            }
        }

        fn close(&self) {
            self.closed.store(true, Ordering::Release);
        }
    }

    #[test]
    fn test_lenient_path_absorbs_errors() {
        let m = Flaky::default();
        assert!(m.try_match_first("trap").unwrap_err().is_guest_trap());
        assert_eq!(m.match_first("trap"), None);
        assert!(m.match_all("trap").is_empty());
    }

    #[test]
    fn test_default_match_all_degrades_to_single() {
        let m = Flaky::default();
        assert_eq!(m.try_match_all("hit").unwrap(), vec![1]);
        assert_eq!(m.match_all("miss"), Vec::<usize>::new());
    }

    #[test]
    fn test_closed_matcher_reports_state() {
        let m = Flaky::default();
        m.close();
        m.close();
        assert_eq!(m.pattern_count(), 0);
        assert_eq!(m.match_first("hit"), None);
        assert!(m.try_match_first("hit").unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_trait_object_usable() {
        let boxed: Box<dyn Matcher> = Box::new(Flaky::default());
        assert_eq!(boxed.match_first("hit"), Some(1));
    }
}
