//! Builds matchers for any backend from one set of settings.

use crate::commands::common::read_guest_module;
use crate::settings::Settings;
use anyhow::{Context, Result};
use multimatch_core::{Backend, Error, Matcher, MatcherConfig, PatternSet};
use multimatch_native::{AutomatonMatcher, SequentialMatcher};
use multimatch_wasm::GuestRuntime;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// A loaded guest module and the runtime that compiles it.
#[derive(Debug)]
struct GuestModule {
    runtime: GuestRuntime,
    bytes: Vec<u8>,
    path: PathBuf,
}

/// Constructs matchers for the backends available to this invocation.
///
/// The guest backend is available only when a guest module was given.
///
/// # Examples
///
/// ```
/// use multimatch_cli::commands::backends::BackendFactory;
/// use multimatch_cli::settings::Settings;
/// use multimatch_core::{Backend, PatternSet};
///
/// let factory = BackendFactory::new(&Settings::default(), None).unwrap();
/// assert_eq!(factory.available(), vec![Backend::Sequential, Backend::Automaton]);
///
/// let patterns = PatternSet::new(["a+"]).unwrap();
/// let matcher = factory.build(Backend::Automaton, &patterns).unwrap();
/// assert_eq!(matcher.match_first("caaat"), Some(0));
/// ```
#[derive(Debug)]
pub struct BackendFactory {
    matcher: MatcherConfig,
    guest: Option<GuestModule>,
}

impl BackendFactory {
    /// Creates a factory; reads the guest module when `guest` is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the guest module cannot be read or the guest
    /// runtime cannot be created.
    pub fn new(settings: &Settings, guest: Option<&Path>) -> Result<Self> {
        let guest = guest
            .map(|path| -> Result<GuestModule> {
                let runtime = GuestRuntime::new(settings.guest.clone())
                    .context("failed to create guest runtime")?;
                Ok(GuestModule {
                    runtime,
                    bytes: read_guest_module(path)?,
                    path: path.to_path_buf(),
                })
            })
            .transpose()?;

        Ok(Self {
            matcher: settings.matcher.clone(),
            guest,
        })
    }

    /// Backends this factory can build, in comparison order.
    #[must_use]
    pub fn available(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|&backend| backend != Backend::Guest || self.guest.is_some())
            .collect()
    }

    /// Compiles `patterns` with `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for the guest backend without a guest
    /// module, otherwise whatever the backend's compilation returns.
    pub fn build(
        &self,
        backend: Backend,
        patterns: &PatternSet,
    ) -> multimatch_core::Result<Box<dyn Matcher>> {
        match backend {
            Backend::Sequential => Ok(Box::new(SequentialMatcher::compile(
                patterns,
                &self.matcher,
            )?)),
            Backend::Automaton => Ok(Box::new(AutomatonMatcher::compile(
                patterns,
                &self.matcher,
            )?)),
            Backend::Guest => {
                let guest = self.guest.as_ref().ok_or_else(|| Error::ConfigError {
                    message: "the guest backend needs a module (pass --guest <path>)".to_string(),
                })?;
                if self.matcher != MatcherConfig::default() {
                    tracing::warn!("matcher options do not apply to the guest backend");
                }
                Ok(Box::new(
                    guest.runtime.compile_matcher(&guest.bytes, patterns)?,
                ))
            }
        }
    }

    /// Like [`build`](Self::build), also returning the compile time.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_timed(
        &self,
        backend: Backend,
        patterns: &PatternSet,
    ) -> multimatch_core::Result<(Box<dyn Matcher>, Duration)> {
        let started = Instant::now();
        let matcher = self.build(backend, patterns)?;
        let elapsed = started.elapsed();
        info!(
            %backend,
            patterns = patterns.len(),
            elapsed_us = elapsed.as_micros(),
            "compiled matcher"
        );
        Ok((matcher, elapsed))
    }

    /// The guest module path, if one was loaded.
    #[must_use]
    pub fn guest_path(&self) -> Option<&Path> {
        self.guest.as_ref().map(|guest| guest.path.as_path())
    }
}
