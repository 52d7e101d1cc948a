//! Statistics snapshots for matchers and the guest bridge.
//!
//! Live counters are kept by each component (usually atomics); the types in
//! this module are immutable, serializable snapshots of them.
//!
//! # Examples
//!
//! ```rust
//! use multimatch_core::stats::BridgeStats;
//!
//! let stats = BridgeStats {
//!     allocations: 10,
//!     frees: 10,
//!     guest_calls: 12,
//!     matches: 10,
//!     hits: 4,
//!     ..Default::default()
//! };
//!
//! assert_eq!(stats.outstanding_buffers(), 0);
//! assert_eq!(stats.hit_rate(), Some(0.4));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one guest bridge.
///
/// Every successful guest allocation is paired with exactly one free, so
/// [`outstanding_buffers`](Self::outstanding_buffers) is zero whenever no
/// call is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Successful guest allocations.
    pub allocations: u64,

    /// Guest frees issued.
    pub frees: u64,

    /// Bytes copied from host into guest memory.
    pub bytes_written: u64,

    /// Guest function invocations of any kind.
    pub guest_calls: u64,

    /// Guest invocations that trapped.
    pub guest_traps: u64,

    /// Match requests served (including empty inputs).
    pub matches: u64,

    /// Match requests that reported a pattern.
    pub hits: u64,
}

impl BridgeStats {
    /// Returns allocations not yet freed.
    #[must_use]
    pub const fn outstanding_buffers(&self) -> u64 {
        self.allocations.saturating_sub(self.frees)
    }

    /// Fraction of match requests that reported a pattern.
    ///
    /// Returns `None` if no match has been requested.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> Option<f64> {
        if self.matches == 0 {
            return None;
        }
        Some(self.hits as f64 / self.matches as f64)
    }

    /// Fraction of guest invocations that trapped.
    ///
    /// Returns `None` if the guest has never been called.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn trap_rate(&self) -> Option<f64> {
        if self.guest_calls == 0 {
            return None;
        }
        Some(self.guest_traps as f64 / self.guest_calls as f64)
    }
}

/// Timestamped statistics snapshot of one matcher.
///
/// # Examples
///
/// ```rust
/// use multimatch_core::stats::{BridgeStats, MatcherSnapshot};
/// use multimatch_core::{Backend, MatcherState};
///
/// let snapshot = MatcherSnapshot::new(Backend::Guest, MatcherState::Ready, 3)
///     .with_bridge(BridgeStats::default());
///
/// assert!(snapshot.snapshot_time() <= chrono::Utc::now());
/// assert!(snapshot.bridge().is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherSnapshot {
    snapshot_time: DateTime<Utc>,
    backend: crate::Backend,
    state: crate::MatcherState,
    pattern_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    bridge: Option<BridgeStats>,
}

impl MatcherSnapshot {
    /// Creates a snapshot stamped with the current time.
    #[must_use]
    pub fn new(backend: crate::Backend, state: crate::MatcherState, pattern_count: usize) -> Self {
        Self {
            snapshot_time: Utc::now(),
            backend,
            state,
            pattern_count,
            bridge: None,
        }
    }

    /// Attaches guest bridge counters.
    #[must_use]
    pub fn with_bridge(mut self, bridge: BridgeStats) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Time the snapshot was captured.
    #[must_use]
    pub const fn snapshot_time(&self) -> DateTime<Utc> {
        self.snapshot_time
    }

    /// Backend of the matcher.
    #[must_use]
    pub const fn backend(&self) -> crate::Backend {
        self.backend
    }

    /// State of the matcher when captured.
    #[must_use]
    pub const fn state(&self) -> crate::MatcherState {
        self.state
    }

    /// Pattern count when captured.
    #[must_use]
    pub const fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    /// Guest bridge counters, for guest matchers.
    #[must_use]
    pub const fn bridge(&self) -> Option<&BridgeStats> {
        self.bridge.as_ref()
    }
}

/// Components that can produce a statistics snapshot.
pub trait StatsProvider {
    /// The snapshot type produced.
    type Stats: Clone + std::fmt::Debug + Serialize;

    /// Captures current statistics without blocking on in-flight calls
    /// longer than necessary.
    fn capture_stats(&self) -> Self::Stats;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Backend, MatcherState};

    #[test]
    fn test_rates_none_when_idle() {
        let stats = BridgeStats::default();
        assert_eq!(stats.hit_rate(), None);
        assert_eq!(stats.trap_rate(), None);
        assert_eq!(stats.outstanding_buffers(), 0);
    }

    #[test]
    fn test_trap_rate() {
        let stats = BridgeStats {
            guest_calls: 4,
            guest_traps: 1,
            ..Default::default()
        };
        assert_eq!(stats.trap_rate(), Some(0.25));
    }

    #[test]
    fn test_outstanding_buffers_saturates() {
        let stats = BridgeStats {
            allocations: 1,
            frees: 3,
            ..Default::default()
        };
        assert_eq!(stats.outstanding_buffers(), 0);
    }

    #[test]
    fn test_snapshot_serialization_omits_missing_bridge() {
        let snapshot = MatcherSnapshot::new(Backend::Automaton, MatcherState::Ready, 5);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["backend"], "automaton");
        assert_eq!(json["state"], "ready");
        assert_eq!(json["pattern_count"], 5);
        assert!(json.get("bridge").is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = MatcherSnapshot::new(Backend::Guest, MatcherState::Closed, 0).with_bridge(
            BridgeStats {
                allocations: 2,
                frees: 2,
                ..Default::default()
            },
        );
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MatcherSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend(), Backend::Guest);
        assert_eq!(back.bridge().map(|b| b.allocations), Some(2));
    }
}
