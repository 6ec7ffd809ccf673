//! System-wide atomic counters.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicU64, Ordering};

// Layer 2: Third-party crate imports
use serde::Serialize;

// Layer 3: Internal module imports
use crate::scheduler::WorkerSnapshot;

/// Lifetime counters for one system.
#[derive(Debug, Default)]
pub struct SystemStats {
    total_created: AtomicU64,
    total_stopped: AtomicU64,
    total_restarts: AtomicU64,
    total_failures: AtomicU64,
    active_actors: AtomicU64,
}

impl SystemStats {
    /// Create counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an actor creation.
    pub fn record_created(&self) {
        self.total_created.fetch_add(1, Ordering::Relaxed);
        self.active_actors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an actor stop.
    pub fn record_stopped(&self) {
        self.total_stopped.fetch_add(1, Ordering::Relaxed);
        // Saturating decrement: stop paths can race in tests.
        let _ = self
            .active_actors
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Record a supervised restart.
    pub fn record_restart(&self) {
        self.total_restarts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a behavior failure.
    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Total actors ever created.
    pub fn total_created(&self) -> u64 {
        self.total_created.load(Ordering::Relaxed)
    }

    /// Total actors ever stopped.
    pub fn total_stopped(&self) -> u64 {
        self.total_stopped.load(Ordering::Relaxed)
    }

    /// Actors currently live.
    pub fn active_actors(&self) -> u64 {
        self.active_actors.load(Ordering::Relaxed)
    }

    /// Total supervised restarts.
    pub fn total_restarts(&self) -> u64 {
        self.total_restarts.load(Ordering::Relaxed)
    }

    /// Total behavior failures.
    pub fn total_failures(&self) -> u64 {
        self.total_failures.load(Ordering::Relaxed)
    }
}

/// Serializable system statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatisticsSnapshot {
    /// Total actors ever created.
    pub total_created: u64,
    /// Total actors ever stopped.
    pub total_stopped: u64,
    /// Actors currently live.
    pub active_actors: u64,
    /// Total supervised restarts.
    pub total_restarts: u64,
    /// Total behavior failures.
    pub total_failures: u64,
    /// Messages that completed the dispatch pipeline.
    pub total_messages: u64,
    /// Lifetime dead letters.
    pub dead_letters: u64,
    /// Currently registered names.
    pub registered_names: usize,
    /// Per-worker scheduler state.
    pub scheduler: Vec<WorkerSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_and_stopped_balance() {
        let stats = SystemStats::new();
        stats.record_created();
        stats.record_created();
        stats.record_stopped();

        assert_eq!(stats.total_created(), 2);
        assert_eq!(stats.total_stopped(), 1);
        assert_eq!(stats.active_actors(), 1);
        // Live count equals created minus stopped at quiescence.
        assert_eq!(
            stats.active_actors(),
            stats.total_created() - stats.total_stopped()
        );
    }

    #[test]
    fn test_stop_never_underflows() {
        let stats = SystemStats::new();
        stats.record_stopped();
        assert_eq!(stats.active_actors(), 0);
    }

    #[test]
    fn test_failure_and_restart_counters() {
        let stats = SystemStats::new();
        stats.record_failure();
        stats.record_restart();
        stats.record_restart();

        assert_eq!(stats.total_failures(), 1);
        assert_eq!(stats.total_restarts(), 2);
    }
}
