//! Strong domain types for multi-pattern matching.
//!
//! Newtypes keep pattern sets, backend identities and memory limits from
//! being confused with the raw strings and integers they wrap.
//!
//! # Examples
//!
//! ```
//! use multimatch_core::{Backend, PatternSet};
//!
//! let set = PatternSet::new(vec!["error".into(), "fail".into()] as Vec<String>).unwrap();
//! assert_eq!(set.len(), 2);
//! assert_eq!(set.get(1), Some("fail"));
//!
//! let backend: Backend = "guest".parse().unwrap();
//! assert_eq!(backend, Backend::Guest);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Ordered, immutable list of patterns.
///
/// The position of a pattern is its identity: matchers report matches by
/// index into this set. Cloning is cheap and shares the underlying storage.
///
/// # Examples
///
/// ```
/// use multimatch_core::PatternSet;
///
/// let set = PatternSet::new(["a", "b", "c"]).unwrap();
/// let joined = set.join('\n');
/// assert_eq!(joined, "a\nb\nc");
///
/// assert!(PatternSet::new(Vec::<String>::new()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSet(Arc<[String]>);

impl PatternSet {
    /// Creates a pattern set from any list of strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPatternSet`] if `patterns` is empty.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Arc<[String]> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Err(Error::EmptyPatternSet);
        }
        Ok(Self(patterns))
    }

    /// Returns the number of patterns.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; an empty set cannot be constructed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the pattern at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Iterates over the patterns in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the patterns as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Finds the first pattern containing `separator`.
    ///
    /// Used by transports that join patterns into one delimited payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use multimatch_core::PatternSet;
    ///
    /// let set = PatternSet::new(["ok", "bad\nline"]).unwrap();
    /// assert_eq!(set.position_containing('\n'), Some(1));
    /// ```
    #[must_use]
    pub fn position_containing(&self, separator: char) -> Option<usize> {
        self.0.iter().position(|p| p.contains(separator))
    }

    /// Joins the patterns with `separator`.
    #[must_use]
    pub fn join(&self, separator: char) -> String {
        let mut buf = [0u8; 4];
        self.0.join(&*separator.encode_utf8(&mut buf))
    }
}

impl Serialize for PatternSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PatternSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let patterns = Vec::<String>::deserialize(deserializer)?;
        Self::new(patterns).map_err(serde::de::Error::custom)
    }
}

/// Matching strategy behind a matcher.
///
/// # Examples
///
/// ```
/// use multimatch_core::Backend;
///
/// assert_eq!(Backend::Automaton.as_str(), "automaton");
/// assert!("hyperscan".parse::<Backend>().is_err());
/// ```
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One compiled regex per pattern, tested in index order.
    Sequential,
    /// All patterns compiled into one automaton and matched simultaneously.
    Automaton,
    /// Patterns compiled and matched inside a sandboxed WASM guest.
    #[cfg_attr(feature = "cli", value(alias = "wasm"))]
    Guest,
}

impl Backend {
    /// All backends, in comparison order.
    pub const ALL: [Self; 3] = [Self::Sequential, Self::Automaton, Self::Guest];

    /// Returns the lowercase name of the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Automaton => "automaton",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "automaton" => Ok(Self::Automaton),
            "guest" | "wasm" => Ok(Self::Guest),
            _ => Err(Error::InvalidArgument(format!(
                "invalid backend: '{s}' (expected: sequential, automaton, or guest)"
            ))),
        }
    }
}

/// Lifecycle state of a matcher.
///
/// ```text
/// Uninitialized -> Compiling -> Ready -> Closed
/// ```
///
/// `Closed` is reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherState {
    /// Resources acquired, patterns not yet compiled.
    Uninitialized,
    /// Pattern compilation in progress.
    Compiling,
    /// Compiled and accepting match calls.
    Ready,
    /// Resources released.
    Closed,
}

impl MatcherState {
    /// Returns `true` if match calls are accepted.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Compiling => "compiling",
            Self::Ready => "ready",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for MatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory limit for a guest instance.
///
/// # Examples
///
/// ```
/// use multimatch_core::MemoryLimit;
///
/// let limit = MemoryLimit::from_mb(64).unwrap();
/// assert_eq!(limit.bytes(), 64 * 1024 * 1024);
/// assert_eq!(limit.megabytes(), 64);
///
/// assert!(MemoryLimit::from_mb(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct MemoryLimit(usize);

impl MemoryLimit {
    /// Smallest accepted limit: one 64 KiB WASM page.
    pub const MIN_BYTES: usize = 64 * 1024;

    /// Maximum addressable by a 32-bit guest: 4 GiB.
    pub const MAX_BYTES: usize = 4 * 1024 * 1024 * 1024;

    /// Default limit: 256 MiB.
    pub const DEFAULT_MB: usize = 256;

    /// Creates a limit from a byte count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if `bytes` is below one page or above
    /// 4 GiB.
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        if !(Self::MIN_BYTES..=Self::MAX_BYTES).contains(&bytes) {
            return Err(Error::ConfigError {
                message: format!(
                    "memory limit must be between {} and {} bytes, got {bytes}",
                    Self::MIN_BYTES,
                    Self::MAX_BYTES
                ),
            });
        }
        Ok(Self(bytes))
    }

    /// Creates a limit from a megabyte count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the limit is out of range.
    pub fn from_mb(mb: usize) -> Result<Self> {
        Self::from_bytes(mb.saturating_mul(1024 * 1024))
    }

    /// Returns the limit in bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.0
    }

    /// Returns the limit in whole megabytes.
    #[inline]
    #[must_use]
    pub const fn megabytes(&self) -> usize {
        self.0 / (1024 * 1024)
    }
}

impl Default for MemoryLimit {
    fn default() -> Self {
        Self(Self::DEFAULT_MB * 1024 * 1024)
    }
}

impl TryFrom<usize> for MemoryLimit {
    type Error = Error;

    fn try_from(bytes: usize) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl From<MemoryLimit> for usize {
    fn from(limit: MemoryLimit) -> Self {
        limit.0
    }
}
