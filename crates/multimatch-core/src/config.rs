//! Configuration for native pattern compilation.
//!
//! # Examples
//!
//! ```
//! use multimatch_core::MatcherConfig;
//!
//! let config = MatcherConfig::default();
//! assert!(!config.case_insensitive);
//!
//! let custom = MatcherConfig::builder()
//!     .case_insensitive(true)
//!     .size_limit(1024 * 1024)
//!     .build();
//! assert!(custom.validate().is_ok());
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Compilation options shared by the native backends.
///
/// The guest backend defines its own pattern language and ignores these
/// options.
///
/// Deserializes from a TOML `[matcher]` table; missing keys take their
/// default values.
///
/// # Examples
///
/// ```
/// use multimatch_core::MatcherConfig;
///
/// let config: MatcherConfig = serde_json::from_str(r#"{"case_insensitive": true}"#).unwrap();
/// assert!(config.case_insensitive);
/// assert_eq!(config.size_limit, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatcherConfig {
    /// Match letters regardless of case.
    ///
    /// Default: false
    pub case_insensitive: bool,

    /// Upper bound in bytes on the compiled program of each backend.
    ///
    /// `None` keeps the engine's own default.
    /// Default: None
    pub size_limit: Option<usize>,
}

impl MatcherConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MatcherConfigBuilder {
        MatcherConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if `size_limit` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use multimatch_core::MatcherConfig;
    ///
    /// let invalid = MatcherConfig { size_limit: Some(0), ..Default::default() };
    /// assert!(invalid.validate().unwrap_err().is_config_error());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.size_limit == Some(0) {
            return Err(Error::ConfigError {
                message: "size_limit must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`MatcherConfig`].
#[derive(Debug, Clone, Default)]
pub struct MatcherConfigBuilder {
    config: MatcherConfig,
}

impl MatcherConfigBuilder {
    /// Sets case-insensitive matching.
    #[must_use]
    pub const fn case_insensitive(mut self, enabled: bool) -> Self {
        self.config.case_insensitive = enabled;
        self
    }

    /// Sets the compiled program size limit in bytes.
    #[must_use]
    pub const fn size_limit(mut self, bytes: usize) -> Self {
        self.config.size_limit = Some(bytes);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> MatcherConfig {
        self.config
    }
}
