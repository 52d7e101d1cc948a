//! CLI-facing types shared between the binary and its tests.
//!
//! # Examples
//!
//! ```
//! use multimatch_core::cli::{ExitCode, OutputFormat};
//!
//! let format: OutputFormat = "json".parse().unwrap();
//! assert_eq!(format, OutputFormat::Json);
//!
//! assert_eq!(ExitCode::NO_MATCH.as_i32(), 1);
//! ```

use std::fmt;
use std::str::FromStr;

/// Output format for command results.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Machine-readable JSON
    Json,
    /// Plain line-oriented text
    Text,
    /// Colored output for terminals
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Returns the lowercase name of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => Err(crate::Error::InvalidArgument(format!(
                "invalid output format: '{s}' (expected: json, text, or pretty)"
            ))),
        }
    }
}

/// Process exit code.
///
/// Follows the grep convention: 0 when something matched, 1 when nothing
/// matched, and 2 or above for failures.
///
/// # Examples
///
/// ```
/// use multimatch_core::cli::ExitCode;
/// use multimatch_core::Error;
///
/// assert!(ExitCode::SUCCESS.is_success());
/// assert_eq!(ExitCode::from_error(&Error::EmptyPatternSet), ExitCode::INVALID_INPUT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExitCode(i32);

impl ExitCode {
    /// A pattern matched, or the command completed (exit code 0).
    pub const SUCCESS: Self = Self(0);

    /// No pattern matched (exit code 1).
    pub const NO_MATCH: Self = Self(1);

    /// General error (exit code 2).
    pub const ERROR: Self = Self(2);

    /// Invalid patterns, arguments or configuration (exit code 3).
    pub const INVALID_INPUT: Self = Self(3);

    /// The guest module failed to load or misbehaved (exit code 4).
    pub const GUEST_ERROR: Self = Self(4);

    /// Creates an exit code from a raw value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns `true` for exit code 0.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Classifies a library error.
    #[must_use]
    pub const fn from_error(error: &crate::Error) -> Self {
        use crate::Error;

        match error {
            Error::EmptyPatternSet
            | Error::CompileError { .. }
            | Error::ConfigError { .. }
            | Error::InvalidArgument(_) => Self::INVALID_INPUT,
            Error::MissingExport { .. }
            | Error::ExportSignature { .. }
            | Error::MemoryBounds { .. }
            | Error::GuestAllocation { .. }
            | Error::GuestTrap { .. }
            | Error::UnsupportedPlatform { .. }
            | Error::ModuleLoad { .. }
            | Error::ProtocolViolation { .. } => Self::GUEST_ERROR,
            Error::InvalidState { .. } => Self::ERROR,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Backend, Error};

    #[test]
    fn test_output_format_parse_case_insensitive() {
        assert_eq!("PRETTY".parse::<OutputFormat>().unwrap(), OutputFormat::Pretty);
        assert_eq!("Text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Pretty);
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::NO_MATCH.as_i32(), 1);
        assert_eq!(ExitCode::ERROR.as_i32(), 2);
        assert_eq!(ExitCode::INVALID_INPUT.as_i32(), 3);
        assert_eq!(ExitCode::GUEST_ERROR.as_i32(), 4);
        assert_eq!(i32::from(ExitCode::from_i32(9)), 9);
        assert_eq!(ExitCode::default(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::compile(Backend::Sequential, Some(0), "x")),
            ExitCode::INVALID_INPUT
        );
        assert_eq!(
            ExitCode::from_error(&Error::MissingExport {
                name: "wasm_alloc".into()
            }),
            ExitCode::GUEST_ERROR
        );
        assert_eq!(
            ExitCode::from_error(&Error::InvalidState {
                operation: "match",
                state: crate::MatcherState::Closed
            }),
            ExitCode::ERROR
        );
    }
}
