//! Timestamped I/O event log backing the windowed diagnostics
//! endpoints.

// Layer 1: Standard library imports
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

// Layer 3: Internal module imports
use super::types::IoEventKind;
use crate::util::ActorId;

/// Default bound on retained event records.
pub const DEFAULT_LOG_CAPACITY: usize = 4096;

/// One delivered (or refused) I/O event.
#[derive(Debug, Clone, Serialize)]
pub struct IoEventRecord {
    /// When the event was handled.
    pub time: DateTime<Utc>,
    /// Connection identity.
    pub conn: u64,
    /// Event class.
    pub kind: IoEventKind,
    /// Target actor.
    pub target: ActorId,
    /// Whether the event reached the mailbox.
    pub delivered: bool,
}

/// Optional time window for log queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoLogQuery {
    /// Inclusive lower bound.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub until: Option<DateTime<Utc>>,
}

impl IoLogQuery {
    fn matches(&self, record: &IoEventRecord) -> bool {
        if let Some(since) = self.since {
            if record.time < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.time > until {
                return false;
            }
        }
        true
    }
}

/// Bounded, overwrite-oldest log of I/O events.
#[derive(Debug)]
pub struct IoEventLog {
    entries: RwLock<VecDeque<IoEventRecord>>,
    capacity: usize,
}

impl Default for IoEventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl IoEventLog {
    /// Create a log retaining up to `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Append a record, overwriting the oldest at capacity.
    pub fn record(&self, conn: u64, kind: IoEventKind, target: ActorId, delivered: bool) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(IoEventRecord {
            time: Utc::now(),
            conn,
            kind,
            target,
            delivered,
        });
    }

    /// All records inside the window, oldest first.
    pub fn query(&self, window: IoLogQuery) -> Vec<IoEventRecord> {
        self.entries
            .read()
            .iter()
            .filter(|r| window.matches(r))
            .cloned()
            .collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop records older than `cutoff`. Used by the GC task.
    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|r| r.time >= cutoff);
        before - entries.len()
    }
}
