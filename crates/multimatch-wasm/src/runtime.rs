//! Shared wasmtime engine, module cache and import linker.

use crate::bridge::GuestBridge;
use crate::cache::ModuleCache;
use crate::config::GuestConfig;
use crate::inspect::{self, ModuleReport};
use crate::matcher::WasmMatcher;
use crate::monitor::BridgeMonitor;
use crate::sandbox::{self, GuestState, load_error};
use multimatch_core::{Error, PatternSet, Result};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use wasmtime::{Config, Engine, Linker, Module, Strategy, WasmBacktraceDetails};

/// Factory for guest matchers.
///
/// Owns one [`Engine`] and a cache of compiled modules, so building many
/// matchers from the same guest bytes compiles the module once. Each
/// matcher still gets its own store and instance.
///
/// `GuestRuntime` is `Send + Sync` and can be shared behind an `Arc`.
///
/// # Examples
///
/// ```
/// use multimatch_wasm::{GuestConfig, GuestRuntime};
///
/// let runtime = GuestRuntime::new(GuestConfig::default()).unwrap();
/// assert_eq!(runtime.module_cache().capacity(), 16);
/// ```
pub struct GuestRuntime {
    engine: Engine,
    linker: Linker<GuestState>,
    cache: ModuleCache,
    config: GuestConfig,
}

impl fmt::Debug for GuestRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestRuntime")
            .field("config", &self.config)
            .field("module_cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl GuestRuntime {
    /// Creates a runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for an invalid configuration, or
    /// [`Error::ModuleLoad`] if the engine or linker cannot be set up.
    pub fn new(config: GuestConfig) -> Result<Self> {
        config.validate()?;
        let capacity =
            NonZeroUsize::new(config.module_cache_capacity).ok_or_else(|| Error::ConfigError {
                message: "module_cache_capacity must be greater than zero".to_string(),
            })?;

        let mut wasmtime_config = Config::new();
        wasmtime_config.wasm_backtrace_details(WasmBacktraceDetails::Enable);
        wasmtime_config.strategy(Strategy::Cranelift);

        let engine = Engine::new(&wasmtime_config)
            .map_err(|e| load_error("failed to create wasmtime engine", e))?;
        let linker = sandbox::base_linker(&engine, &config)?;

        Ok(Self {
            engine,
            linker,
            cache: ModuleCache::new(capacity),
            config,
        })
    }

    /// The runtime configuration.
    #[must_use]
    pub const fn config(&self) -> &GuestConfig {
        &self.config
    }

    /// The compiled module cache.
    #[must_use]
    pub const fn module_cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Compiles guest bytes (binary or text format), reusing a cached
    /// module when the same bytes were loaded before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleLoad`] if the bytes are not a valid module.
    pub fn load_module(&self, bytes: &[u8]) -> Result<Module> {
        let key = ModuleCache::key_for(bytes);
        self.cache.get_or_compile(key, || {
            let started = Instant::now();
            let module = Module::new(&self.engine, bytes)
                .map_err(|e| load_error("failed to compile guest module", e))?;
            tracing::info!(
                bytes = bytes.len(),
                elapsed_ms = started.elapsed().as_millis(),
                "compiled guest module"
            );
            Ok(module)
        })
    }

    /// Instantiates a guest and resolves its ABI without compiling any
    /// patterns.
    ///
    /// # Errors
    ///
    /// - [`Error::ModuleLoad`] if compilation, linking or instantiation fails
    ///   (including an initial memory larger than the configured limit)
    /// - [`Error::MissingExport`] / [`Error::ExportSignature`] if the guest
    ///   does not implement the matcher ABI
    pub fn instantiate(&self, bytes: &[u8]) -> Result<GuestBridge> {
        let module = self.load_module(bytes)?;
        let linker = sandbox::module_linker(&self.linker, &module, &self.config)?;
        let mut store = sandbox::new_store(&self.engine, &self.config);
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| load_error("failed to instantiate guest module", e))?;
        GuestBridge::new(&instance, store, Arc::new(BridgeMonitor::default()))
    }

    /// Builds a ready matcher for `patterns` from guest bytes.
    ///
    /// # Errors
    ///
    /// Everything [`instantiate`](Self::instantiate) returns, plus
    /// [`Error::UnsupportedPlatform`], [`Error::CompileError`],
    /// [`Error::ProtocolViolation`] and guest bridge errors from the
    /// compilation handshake.
    pub fn compile_matcher(&self, bytes: &[u8], patterns: &PatternSet) -> Result<WasmMatcher> {
        let bridge = self.instantiate(bytes)?;
        WasmMatcher::compile(bridge, patterns, &self.config)
    }

    /// Describes a guest's imports, exports and ABI conformance without
    /// instantiating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleLoad`] if the bytes are not a valid module.
    pub fn inspect(&self, bytes: &[u8]) -> Result<ModuleReport> {
        let module = self.load_module(bytes)?;
        Ok(inspect::report(&module, bytes.len(), &self.config))
    }
}
