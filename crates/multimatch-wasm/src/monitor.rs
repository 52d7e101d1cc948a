//! Live counters for one guest bridge.
//!
//! Counters are atomics so statistics can be sampled from any thread
//! without taking the matcher's session lock.
//!
//! # Examples
//!
//! ```
//! use multimatch_wasm::monitor::BridgeMonitor;
//!
//! let monitor = BridgeMonitor::default();
//! monitor.record_allocation(16);
//! monitor.record_free();
//!
//! let stats = monitor.snapshot();
//! assert_eq!(stats.allocations, 1);
//! assert_eq!(stats.outstanding_buffers(), 0);
//! ```

use multimatch_core::stats::BridgeStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters behind [`BridgeStats`].
#[derive(Debug, Default)]
pub struct BridgeMonitor {
    allocations: AtomicU64,
    frees: AtomicU64,
    bytes_written: AtomicU64,
    guest_calls: AtomicU64,
    guest_traps: AtomicU64,
    matches: AtomicU64,
    hits: AtomicU64,
}

impl BridgeMonitor {
    /// Records a successful guest allocation of `size` bytes.
    pub fn record_allocation(&self, size: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(size, "guest buffer allocated");
    }

    /// Records a guest free.
    pub fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    /// Records bytes copied into guest memory.
    pub fn record_write(&self, bytes: usize) {
        self.bytes_written
            .fetch_add(u64::try_from(bytes).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    /// Records a guest invocation and whether it trapped.
    pub fn record_call(&self, trapped: bool) {
        self.guest_calls.fetch_add(1, Ordering::Relaxed);
        if trapped {
            self.guest_traps.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a served match request.
    pub fn record_match(&self, hit: bool) {
        self.matches.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Captures the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            guest_calls: self.guest_calls.load(Ordering::Relaxed),
            guest_traps: self.guest_traps.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let monitor = BridgeMonitor::default();
        monitor.record_allocation(8);
        monitor.record_allocation(8);
        monitor.record_free();
        monitor.record_write(8);
        monitor.record_call(false);
        monitor.record_call(true);
        monitor.record_match(true);
        monitor.record_match(false);

        let stats = monitor.snapshot();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.outstanding_buffers(), 1);
        assert_eq!(stats.bytes_written, 8);
        assert_eq!(stats.guest_calls, 2);
        assert_eq!(stats.guest_traps, 1);
        assert_eq!(stats.hit_rate(), Some(0.5));
    }
}
