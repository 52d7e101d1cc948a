//! Configuration file loading.
//!
//! Settings come from an optional TOML file; command-line flags override
//! whatever the file sets.
//!
//! ```toml
//! [matcher]
//! case_insensitive = true
//! size_limit = 10485760
//!
//! [guest]
//! memory_limit = 67108864
//! require_supported_platform = false
//! module_cache_capacity = 4
//! link_wasi = true
//! ```

use crate::cli::{GuestArgs, PatternArgs};
use anyhow::{Context, Result};
use multimatch_core::{MatcherConfig, MemoryLimit};
use multimatch_wasm::GuestConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Effective configuration of one CLI invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Native backend options
    pub matcher: MatcherConfig,
    /// Guest backend options
    pub guest: GuestConfig,
}

impl Settings {
    /// Loads settings from `path`, or defaults when no file is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, has
    /// unknown keys, or holds invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let settings = Self::from_toml(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        debug!(path = %path.display(), ?settings, "loaded config file");
        Ok(settings)
    }

    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML or invalid values.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies pattern flags on top of the file settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting matcher options are invalid.
    pub fn apply_pattern_args(&mut self, args: &PatternArgs) -> Result<()> {
        if args.case_insensitive {
            self.matcher.case_insensitive = true;
        }
        if let Some(limit) = args.size_limit {
            self.matcher.size_limit = Some(limit);
        }
        self.matcher.validate()?;
        Ok(())
    }

    /// Applies guest flags on top of the file settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory limit is out of range.
    pub fn apply_guest_args(&mut self, args: &GuestArgs) -> Result<()> {
        if let Some(mb) = args.memory_limit_mb {
            self.guest.memory_limit = MemoryLimit::from_mb(mb)?;
        }
        if args.allow_unsupported_platform {
            self.guest.require_supported_platform = false;
        }
        if args.no_wasi {
            self.guest.link_wasi = false;
        }
        self.guest.validate()?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.matcher.validate()?;
        self.guest.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.guest.link_wasi);
        assert!(!settings.matcher.case_insensitive);
    }

    #[test]
    fn test_partial_tables() {
        let settings = Settings::from_toml("[matcher]\ncase_insensitive = true\n").unwrap();
        assert!(settings.matcher.case_insensitive);
        assert_eq!(settings.guest, GuestConfig::default());
    }

    #[test]
    fn test_full_file() {
        let settings = Settings::from_toml(
            r"
            [matcher]
            size_limit = 1048576

            [guest]
            memory_limit = 1048576
            require_supported_platform = false
            module_cache_capacity = 2
            link_wasi = false
            ",
        )
        .unwrap();
        assert_eq!(settings.matcher.size_limit, Some(1_048_576));
        assert_eq!(settings.guest.memory_limit.megabytes(), 1);
        assert!(!settings.guest.require_supported_platform);
        assert_eq!(settings.guest.module_cache_capacity, 2);
        assert!(!settings.guest.link_wasi);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Settings::from_toml("[matcher]\nfuzzy = true\n").is_err());
        assert!(Settings::from_toml("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Settings::from_toml("[guest]\nmodule_cache_capacity = 0\n").is_err());
        assert!(Settings::from_toml("[matcher]\nsize_limit = 0\n").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut settings = Settings::from_toml("[guest]\nlink_wasi = true\n").unwrap();
        settings
            .apply_guest_args(&GuestArgs {
                memory_limit_mb: Some(8),
                allow_unsupported_platform: true,
                no_wasi: true,
                ..GuestArgs::default()
            })
            .unwrap();
        assert_eq!(settings.guest.memory_limit.megabytes(), 8);
        assert!(!settings.guest.require_supported_platform);
        assert!(!settings.guest.link_wasi);

        settings
            .apply_pattern_args(&PatternArgs {
                case_insensitive: true,
                size_limit: Some(4096),
                ..PatternArgs::default()
            })
            .unwrap();
        assert!(settings.matcher.case_insensitive);
        assert_eq!(settings.matcher.size_limit, Some(4096));
    }

    #[test]
    fn test_memory_limit_flag_out_of_range() {
        let mut settings = Settings::default();
        let args = GuestArgs {
            memory_limit_mb: Some(0),
            ..GuestArgs::default()
        };
        assert!(settings.apply_guest_args(&args).is_err());
    }
}
