//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for engine activity.
///
/// Uses Relaxed ordering; counters are observational and never read back
/// into a decision.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Apply calls that reached a registered replica
    applies: AtomicU64,
    /// Apply calls where no rule matched
    noop_applies: AtomicU64,
    /// Apply calls rejected with UnknownReplica
    unknown_replicas: AtomicU64,
    /// Local transitions that changed state
    local_transitions: AtomicU64,
    /// Sibling transitions produced by propagation
    propagated_transitions: AtomicU64,
    /// Refresh/read-miss without an authoritative source
    unresolved_sources: AtomicU64,
    /// Sweep passes
    sweeps: AtomicU64,
    /// Replicas demoted by the sweep
    staleness_timeouts: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_applies(&self) {
        self.applies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_noop_applies(&self) {
        self.noop_applies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unknown_replicas(&self) {
        self.unknown_replicas.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_local_transitions(&self) {
        self.local_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_propagated_transitions(&self, count: u64) {
        self.propagated_transitions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_unresolved_sources(&self) {
        self.unresolved_sources.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sweeps(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_staleness_timeouts(&self, count: u64) {
        self.staleness_timeouts.fetch_add(count, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            applies: self.applies.load(Ordering::Relaxed),
            noop_applies: self.noop_applies.load(Ordering::Relaxed),
            unknown_replicas: self.unknown_replicas.load(Ordering::Relaxed),
            local_transitions: self.local_transitions.load(Ordering::Relaxed),
            propagated_transitions: self.propagated_transitions.load(Ordering::Relaxed),
            unresolved_sources: self.unresolved_sources.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            staleness_timeouts: self.staleness_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub applies: u64,
    pub noop_applies: u64,
    pub unknown_replicas: u64,
    pub local_transitions: u64,
    pub propagated_transitions: u64,
    pub unresolved_sources: u64,
    pub sweeps: u64,
    pub staleness_timeouts: u64,
}
