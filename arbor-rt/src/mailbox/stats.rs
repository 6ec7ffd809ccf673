//! Lock-free mailbox statistics.
//!
//! Counters use atomic operations so the hot enqueue/dequeue path never
//! takes an extra lock for accounting. The last-activity timestamp sits
//! behind a parking_lot RwLock; it is written rarely relative to reads.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicU64, Ordering};

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

// Layer 3: Internal module imports
// (none)

/// Atomic counters for a single mailbox.
#[derive(Debug, Default)]
pub struct MailboxStats {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    dropped: AtomicU64,
    overflowed: AtomicU64,
    filtered: AtomicU64,
    dead_lettered: AtomicU64,
    backpressure_waits: AtomicU64,
    backpressure_timeouts: AtomicU64,
    last_activity: RwLock<Option<DateTime<Utc>>>,
}

impl MailboxStats {
    /// Create a stats block with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful enqueue.
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        *self.last_activity.write() = Some(Utc::now());
    }

    /// Record a successful dequeue.
    pub fn record_dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
        *self.last_activity.write() = Some(Utc::now());
    }

    /// Record a message removed or refused without delivery.
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an overflow event (the policy resolved it).
    pub fn record_overflowed(&self) {
        self.overflowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a filter rejection.
    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message diverted to the dead-letter list.
    pub fn record_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a producer blocking on backpressure.
    pub fn record_backpressure_wait(&self) {
        self.backpressure_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backpressure wait that hit its deadline.
    pub fn record_backpressure_timeout(&self) {
        self.backpressure_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Total successful enqueues.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Total successful dequeues.
    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Total drops.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Total overflow events.
    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }

    /// Total filter rejections.
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    /// Total dead-lettered messages.
    pub fn dead_lettered(&self) -> u64 {
        self.dead_lettered.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MailboxStatsSnapshot {
        MailboxStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            backpressure_waits: self.backpressure_waits.load(Ordering::Relaxed),
            backpressure_timeouts: self.backpressure_timeouts.load(Ordering::Relaxed),
            last_activity: *self.last_activity.read(),
        }
    }
}

/// Serializable point-in-time view of [`MailboxStats`].
#[derive(Debug, Clone, Serialize)]
pub struct MailboxStatsSnapshot {
    /// Total successful enqueues.
    pub enqueued: u64,
    /// Total successful dequeues.
    pub dequeued: u64,
    /// Total drops.
    pub dropped: u64,
    /// Total overflow events.
    pub overflowed: u64,
    /// Total filter rejections.
    pub filtered: u64,
    /// Total dead-lettered messages.
    pub dead_lettered: u64,
    /// Total producer waits under backpressure.
    pub backpressure_waits: u64,
    /// Total backpressure deadline expiries.
    pub backpressure_timeouts: u64,
    /// Last enqueue or dequeue time.
    pub last_activity: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = MailboxStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.enqueued, 0);
        assert_eq!(snap.dequeued, 0);
        assert_eq!(snap.dropped, 0);
        assert!(snap.last_activity.is_none());
    }

    #[test]
    fn test_record_and_read() {
        let stats = MailboxStats::new();
        stats.record_enqueued();
        stats.record_enqueued();
        stats.record_dequeued();
        stats.record_overflowed();
        stats.record_filtered();
        stats.record_dead_lettered();

        assert_eq!(stats.enqueued(), 2);
        assert_eq!(stats.dequeued(), 1);
        assert_eq!(stats.overflowed(), 1);
        assert_eq!(stats.filtered(), 1);
        assert_eq!(stats.dead_lettered(), 1);
        assert!(stats.snapshot().last_activity.is_some());
    }

    #[test]
    fn test_concurrent_recording() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(MailboxStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        s.record_enqueued();
                    }
                })
            })
            .collect();

        for h in handles {
            let _ = h.join();
        }

        assert_eq!(stats.enqueued(), 4000);
    }
}
