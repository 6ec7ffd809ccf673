//! System-level dead-letter accounting.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use crate::message::Message;

/// Default bound on retained dead letters.
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 1024;

/// Bounded store of undeliverable messages.
///
/// The lifetime counter keeps counting even when retention is disabled
/// or the ring overwrites old entries.
#[derive(Debug)]
pub struct DeadLetterStore {
    entries: Mutex<VecDeque<Message>>,
    capacity: usize,
    enabled: bool,
    total: AtomicU64,
}

impl DeadLetterStore {
    /// Create a store retaining up to `capacity` messages.
    pub fn new(capacity: usize, enabled: bool) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            enabled,
            total: AtomicU64::new(0),
        }
    }

    /// Record an undeliverable message.
    pub fn push(&self, msg: Message) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !self.enabled {
            return;
        }
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(msg);
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no messages are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lifetime count of dead letters, retained or not.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Drain all retained messages.
    pub fn drain(&self) -> Vec<Message> {
        self.entries.lock().drain(..).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::util::{ActorId, MessageId};

    fn msg(id: u64) -> Message {
        Message::new(
            MessageId::from_raw(id),
            1,
            ActorId::SYSTEM,
            ActorId::from_raw(1),
        )
    }

    #[test]
    fn test_push_and_drain() {
        let store = DeadLetterStore::new(8, true);
        store.push(msg(1));
        store.push(msg(2));

        assert_eq!(store.len(), 2);
        assert_eq!(store.total(), 2);

        let drained = store.drain();
        assert_eq!(drained.len(), 2);
        assert!(store.is_empty());
        // Total is a lifetime counter; draining does not reset it.
        assert_eq!(store.total(), 2);
    }

    #[test]
    fn test_capacity_overwrites_oldest() {
        let store = DeadLetterStore::new(2, true);
        store.push(msg(1));
        store.push(msg(2));
        store.push(msg(3));

        let ids: Vec<u64> = store.drain().iter().map(|m| m.id.as_u64()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(store.total(), 3);
    }

    #[test]
    fn test_disabled_counts_but_does_not_retain() {
        let store = DeadLetterStore::new(8, false);
        store.push(msg(1));

        assert!(store.is_empty());
        assert_eq!(store.total(), 1);
    }
}
