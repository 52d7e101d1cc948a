//! [`WasmMatcher`]: the guest backend behind the [`Matcher`] contract.

use crate::bridge::GuestBridge;
use crate::config::GuestConfig;
use crate::handshake;
use crate::monitor::BridgeMonitor;
use crate::protocol;
use multimatch_core::stats::{BridgeStats, MatcherSnapshot, StatsProvider};
use multimatch_core::{Backend, Error, Matcher, MatcherState, PatternSet, Result};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Guest state guarded by the matcher's lock.
struct Session {
    state: MatcherState,
    bridge: Option<GuestBridge>,
}

/// Matcher whose patterns are compiled and evaluated inside a WASM guest.
///
/// The guest is single-instance and non-reentrant, so every operation that
/// touches it runs under one mutex: concurrent calls from many threads are
/// serialized. Distinct `WasmMatcher`s own distinct guest instances and do
/// not contend.
///
/// Dropping the matcher closes it.
///
/// # Examples
///
/// ```no_run
/// use multimatch_core::{Matcher, PatternSet};
/// use multimatch_wasm::{GuestConfig, GuestRuntime};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let runtime = GuestRuntime::new(GuestConfig::default())?;
/// let guest = std::fs::read("matcher.wasm")?;
/// let patterns = PatternSet::new(["error", "fail"])?;
///
/// let matcher = runtime.compile_matcher(&guest, &patterns)?;
/// assert_eq!(matcher.match_first("fail fast"), Some(1));
/// matcher.close();
/// # Ok(())
/// # }
/// ```
pub struct WasmMatcher {
    session: Mutex<Session>,
    patterns: PatternSet,
    pattern_count: usize,
    monitor: Arc<BridgeMonitor>,
}

impl fmt::Debug for WasmMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WasmMatcher")
            .field("state", &self.state())
            .field("pattern_count", &self.pattern_count)
            .field("stats", &self.monitor.snapshot())
            .finish_non_exhaustive()
    }
}

impl WasmMatcher {
    /// Drives a freshly instantiated guest from `Uninitialized` to `Ready`.
    ///
    /// On failure the guest is closed and dropped before returning.
    pub(crate) fn compile(
        mut bridge: GuestBridge,
        patterns: &PatternSet,
        config: &GuestConfig,
    ) -> Result<Self> {
        let started = Instant::now();
        debug!(state = %MatcherState::Uninitialized, "preparing guest");

        match Self::prepare(&mut bridge, patterns, config) {
            Ok(pattern_count) => {
                info!(
                    patterns = pattern_count,
                    elapsed_us = started.elapsed().as_micros(),
                    "compiled guest matcher"
                );
                let monitor = Arc::clone(bridge.monitor());
                Ok(Self {
                    session: Mutex::new(Session {
                        state: MatcherState::Ready,
                        bridge: Some(bridge),
                    }),
                    patterns: patterns.clone(),
                    pattern_count,
                    monitor,
                })
            }
            Err(e) => {
                if let Err(close_error) = bridge.close_guest() {
                    debug!(
                        error = %close_error,
                        "guest close after failed compilation also failed"
                    );
                }
                Err(e)
            }
        }
    }

    fn prepare(
        bridge: &mut GuestBridge,
        patterns: &PatternSet,
        config: &GuestConfig,
    ) -> Result<usize> {
        bridge.initialize()?;

        if let Some(code) = bridge.check_platform()?
            && code != 0
        {
            if config.require_supported_platform {
                return Err(Error::UnsupportedPlatform { code });
            }
            warn!(code, "guest reports unsupported platform; continuing");
        }

        debug!(state = %MatcherState::Compiling, "compiling patterns in guest");
        handshake::compile_patterns(bridge, patterns)
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_ready_bridge<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut GuestBridge) -> Result<T>,
    ) -> Result<T> {
        let mut session = self.lock();
        let state = session.state;
        match session.bridge.as_mut() {
            Some(bridge) if state.is_ready() => f(bridge),
            _ => Err(Error::InvalidState { operation, state }),
        }
    }

    /// Patterns this matcher was compiled from.
    #[must_use]
    pub const fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Re-runs the guest's platform probe.
    ///
    /// Returns `None` if the guest exports no probe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] once closed, or [`Error::GuestTrap`].
    pub fn check_platform(&self) -> Result<Option<i32>> {
        self.with_ready_bridge("check platform of", GuestBridge::check_platform)
    }

    /// The guest's current diagnostic message, or an empty string.
    #[must_use]
    pub fn last_error(&self) -> String {
        self.with_ready_bridge("read diagnostics of", |bridge| {
            Ok(bridge.read_diagnostic().unwrap_or_default())
        })
        .unwrap_or_default()
    }

    /// Snapshot of the bridge counters.
    #[must_use]
    pub fn bridge_stats(&self) -> BridgeStats {
        self.monitor.snapshot()
    }
}

impl Matcher for WasmMatcher {
    fn backend(&self) -> Backend {
        Backend::Guest
    }

    fn state(&self) -> MatcherState {
        self.lock().state
    }

    fn pattern_count(&self) -> usize {
        if self.state().is_ready() {
            self.pattern_count
        } else {
            0
        }
    }

    fn supports_multi_match(&self) -> bool {
        false
    }

    fn try_match_first(&self, input: &str) -> Result<Option<usize>> {
        let result = self.with_ready_bridge("match", |bridge| {
            protocol::match_input(bridge, input.as_bytes(), self.pattern_count)
        });
        if let Ok(found) = &result {
            self.monitor.record_match(found.is_some());
        }
        result
    }

    fn close(&self) {
        let mut session = self.lock();
        if let Some(mut bridge) = session.bridge.take()
            && let Err(e) = bridge.close_guest()
        {
            warn!(error = %e, "guest close failed; releasing instance anyway");
        }
        if session.state != MatcherState::Closed {
            debug!("closed guest matcher");
        }
        session.state = MatcherState::Closed;
    }
}

impl StatsProvider for WasmMatcher {
    type Stats = MatcherSnapshot;

    fn capture_stats(&self) -> Self::Stats {
        MatcherSnapshot::new(Backend::Guest, self.state(), self.pattern_count())
            .with_bridge(self.monitor.snapshot())
    }
}

impl Drop for WasmMatcher {
    fn drop(&mut self) {
        self.close();
    }
}
