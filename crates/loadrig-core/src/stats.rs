use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Run-wide request counters, shared by every in-flight dispatch.
///
/// Increments are relaxed atomics: totals are exact under any interleaving,
/// though a snapshot taken mid-flight may observe the three fields at
/// slightly different instants.
#[derive(Debug, Default)]
pub struct StatsCollector {
    sent: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an attempt the moment it is made, before the outcome is known.
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Zeroes all counters. Only called at run start, before any dispatch
    /// is in flight.
    pub fn reset(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub succeeded: u64,
    pub failed: u64,
}
