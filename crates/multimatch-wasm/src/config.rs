//! Guest runtime configuration.
//!
//! # Examples
//!
//! ```
//! use multimatch_wasm::GuestConfig;
//!
//! let config = GuestConfig::default();
//! assert_eq!(config.memory_limit.megabytes(), 256);
//! assert!(config.require_supported_platform);
//!
//! let custom = GuestConfig::builder()
//!     .memory_limit_mb(64)
//!     .module_cache_capacity(4)
//!     .link_wasi(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(custom.module_cache_capacity, 4);
//! ```

use multimatch_core::{Error, MemoryLimit, Result};
use serde::{Deserialize, Serialize};

/// Limits and linking options for guest instances.
///
/// Deserializes from a TOML `[guest]` table; missing keys take their
/// default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuestConfig {
    /// Upper bound on each guest's linear memory, in bytes.
    ///
    /// Enforced by the store's resource limiter: growth past it fails
    /// inside the guest as an ordinary `memory.grow` failure.
    /// Default: 256MB
    pub memory_limit: MemoryLimit,

    /// Fail construction when `matcher_check_platform` reports non-zero.
    ///
    /// Default: true
    pub require_supported_platform: bool,

    /// Number of compiled modules kept by the runtime.
    ///
    /// Default: 16
    pub module_cache_capacity: usize,

    /// Provide a WASI preview1 context to guests that import one.
    ///
    /// Default: true
    pub link_wasi: bool,
}

impl GuestConfig {
    /// Default module cache capacity.
    pub const DEFAULT_CACHE_CAPACITY: usize = 16;

    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> GuestConfigBuilder {
        GuestConfigBuilder::default()
    }

    /// Memory limit in bytes.
    #[inline]
    #[must_use]
    pub const fn memory_limit_bytes(&self) -> usize {
        self.memory_limit.bytes()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the module cache capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.module_cache_capacity == 0 {
            return Err(Error::ConfigError {
                message: "module_cache_capacity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            memory_limit: MemoryLimit::default(),
            require_supported_platform: true,
            module_cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
            link_wasi: true,
        }
    }
}

/// Builder for [`GuestConfig`].
#[derive(Debug, Default)]
pub struct GuestConfigBuilder {
    memory_limit_mb: Option<usize>,
    require_supported_platform: Option<bool>,
    module_cache_capacity: Option<usize>,
    link_wasi: Option<bool>,
}

impl GuestConfigBuilder {
    /// Sets the guest memory limit in megabytes.
    #[must_use]
    pub const fn memory_limit_mb(mut self, mb: usize) -> Self {
        self.memory_limit_mb = Some(mb);
        self
    }

    /// Sets whether an unsupported platform fails construction.
    #[must_use]
    pub const fn require_supported_platform(mut self, required: bool) -> Self {
        self.require_supported_platform = Some(required);
        self
    }

    /// Sets the module cache capacity.
    #[must_use]
    pub const fn module_cache_capacity(mut self, capacity: usize) -> Self {
        self.module_cache_capacity = Some(capacity);
        self
    }

    /// Sets whether WASI preview1 imports are satisfied.
    #[must_use]
    pub const fn link_wasi(mut self, link: bool) -> Self {
        self.link_wasi = Some(link);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for an out-of-range memory limit or a
    /// zero cache capacity.
    pub fn build(self) -> Result<GuestConfig> {
        let defaults = GuestConfig::default();
        let config = GuestConfig {
            memory_limit: self
                .memory_limit_mb
                .map_or(Ok(defaults.memory_limit), MemoryLimit::from_mb)?,
            require_supported_platform: self
                .require_supported_platform
                .unwrap_or(defaults.require_supported_platform),
            module_cache_capacity: self
                .module_cache_capacity
                .unwrap_or(defaults.module_cache_capacity),
            link_wasi: self.link_wasi.unwrap_or(defaults.link_wasi),
        };
        config.validate()?;
        Ok(config)
    }
}
