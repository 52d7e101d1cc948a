//! Error types for multi-pattern matching.
//!
//! Every backend reports failures through the single [`Error`] enum so that
//! callers can handle compile failures, guest bridge faults and lifecycle
//! misuse uniformly regardless of the strategy behind a matcher.
//!
//! # Examples
//!
//! ```
//! use multimatch_core::{Error, PatternSet, Result};
//!
//! fn load(patterns: Vec<String>) -> Result<PatternSet> {
//!     PatternSet::new(patterns)
//! }
//!
//! let err = load(Vec::new()).unwrap_err();
//! assert!(err.is_empty_pattern_set());
//! ```

use crate::types::{Backend, MatcherState};
use thiserror::Error;

/// Main error type for multimatch.
///
/// Construction-time variants (`EmptyPatternSet`, `CompileError`,
/// `MissingExport`, `ExportSignature`, `ModuleLoad`, `UnsupportedPlatform`)
/// abort matcher creation. Per-call variants (`GuestTrap`, `MemoryBounds`,
/// `GuestAllocation`, `ProtocolViolation`, `InvalidState`) are only returned
/// by the strict matching path.
#[derive(Error, Debug)]
pub enum Error {
    /// The pattern set contained no patterns.
    ///
    /// Rejected before any backend or guest is involved.
    #[error("pattern set is empty")]
    EmptyPatternSet,

    /// A backend refused to compile the pattern set.
    #[error("{backend} backend failed to compile patterns{}: {message}", describe_location(*pattern_index, *code))]
    CompileError {
        /// Backend that produced the failure
        backend: Backend,
        /// Index of the offending pattern, when the backend reports one
        pattern_index: Option<usize>,
        /// Raw status code returned by a guest compile entry point
        code: Option<i32>,
        /// Backend diagnostic text (may be empty)
        message: String,
    },

    /// A required guest export does not exist.
    #[error("guest module is missing required export '{name}'")]
    MissingExport {
        /// Export name that could not be resolved
        name: String,
    },

    /// A guest export exists but has the wrong type.
    #[error("guest export '{name}' has an unexpected signature (expected {expected})")]
    ExportSignature {
        /// Export name
        name: String,
        /// Human-readable expected signature
        expected: String,
    },

    /// A host access to guest memory fell outside the guest's memory.
    #[error(
        "guest memory access out of bounds: offset {offset} + length {length} exceeds {memory_size} bytes"
    )]
    MemoryBounds {
        /// Start offset of the access
        offset: usize,
        /// Length of the access in bytes
        length: usize,
        /// Guest memory size at the time of the access
        memory_size: usize,
    },

    /// The guest allocator could not satisfy a request.
    #[error("guest allocator failed to allocate {size} bytes")]
    GuestAllocation {
        /// Requested size in bytes
        size: usize,
    },

    /// The guest trapped or a guest call could not be invoked.
    #[error("guest trapped during {operation}: {message}")]
    GuestTrap {
        /// Guest operation that failed (e.g. `matcher_match`)
        operation: String,
        /// Trap description from the runtime
        message: String,
    },

    /// The optional platform check reported an unsupported environment.
    #[error("guest reports unsupported platform (code {code})")]
    UnsupportedPlatform {
        /// Non-zero code returned by the platform check
        code: i32,
    },

    /// The guest module could not be compiled, linked or instantiated.
    #[error("failed to load guest module: {message}")]
    ModuleLoad {
        /// Description of the failure
        message: String,
        /// Underlying runtime error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The guest returned a value outside its documented contract.
    #[error("guest protocol violation: {message}")]
    ProtocolViolation {
        /// What the guest did wrong
        message: String,
    },

    /// An operation was attempted in a lifecycle state that forbids it.
    #[error("cannot {operation} a matcher in state {state}")]
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
        /// State the matcher was in
        state: MatcherState,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn describe_location(pattern_index: Option<usize>, code: Option<i32>) -> String {
    match (pattern_index, code) {
        (Some(index), Some(code)) => format!(" at pattern {index} (code {code})"),
        (Some(index), None) => format!(" at pattern {index}"),
        (None, Some(code)) => format!(" (code {code})"),
        (None, None) => String::new(),
    }
}

impl Error {
    /// Creates a compile error for a native backend.
    ///
    /// # Examples
    ///
    /// ```
    /// use multimatch_core::{Backend, Error};
    ///
    /// let err = Error::compile(Backend::Sequential, Some(1), "unclosed class");
    /// assert_eq!(err.pattern_index(), Some(1));
    /// ```
    #[must_use]
    pub fn compile(
        backend: Backend,
        pattern_index: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self::CompileError {
            backend,
            pattern_index,
            code: None,
            message: message.into(),
        }
    }

    /// Creates a guest trap error from a runtime failure.
    #[must_use]
    pub fn guest_trap(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::GuestTrap {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` if this is an empty pattern set error.
    #[must_use]
    pub const fn is_empty_pattern_set(&self) -> bool {
        matches!(self, Self::EmptyPatternSet)
    }

    /// Returns `true` if this is a compile error.
    ///
    /// # Examples
    ///
    /// ```
    /// use multimatch_core::{Backend, Error};
    ///
    /// let err = Error::compile(Backend::Automaton, None, "bad");
    /// assert!(err.is_compile_error());
    /// assert!(!err.is_guest_trap());
    /// ```
    #[must_use]
    pub const fn is_compile_error(&self) -> bool {
        matches!(self, Self::CompileError { .. })
    }

    /// Returns `true` if this is a missing or mistyped export.
    #[must_use]
    pub const fn is_missing_export(&self) -> bool {
        matches!(self, Self::MissingExport { .. } | Self::ExportSignature { .. })
    }

    /// Returns `true` if this is a guest trap.
    #[must_use]
    pub const fn is_guest_trap(&self) -> bool {
        matches!(self, Self::GuestTrap { .. })
    }

    /// Returns `true` if this is a guest memory fault (bounds or allocation).
    #[must_use]
    pub const fn is_memory_error(&self) -> bool {
        matches!(self, Self::MemoryBounds { .. } | Self::GuestAllocation { .. })
    }

    /// Returns `true` if this is an unsupported platform error.
    #[must_use]
    pub const fn is_unsupported_platform(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform { .. })
    }

    /// Returns `true` if this is a lifecycle state error.
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns the offending pattern index of a compile error.
    #[must_use]
    pub const fn pattern_index(&self) -> Option<usize> {
        match self {
            Self::CompileError { pattern_index, .. } => *pattern_index,
            _ => None,
        }
    }
}

/// Result type alias for multimatch operations.
pub type Result<T> = std::result::Result<T, Error>;
