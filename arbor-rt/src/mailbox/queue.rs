// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;

// Layer 3: Internal module imports
use super::priority::PriorityQueue;
use super::stats::{MailboxStats, MailboxStatsSnapshot};
use crate::message::Message;
use crate::util::{ActorId, MailboxId};

/// Default wait budget for the BackPressure overflow policy.
pub const DEFAULT_BACK_PRESSURE_WAIT: Duration = Duration::from_millis(100);

/// Queue discipline of a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MailboxMode {
    /// First-in first-out.
    #[default]
    Fifo,
    /// Max-priority heap; ties resolve in insertion order.
    Priority,
}

/// What a full mailbox does with one more message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OverflowPolicy {
    /// Remove the oldest queued message, append the new one.
    #[default]
    DropOldest,

    /// Refuse the new message.
    DropNewest,

    /// Remove the minimum-priority queued message, append the new one.
    DropLowPriority,

    /// Block the producer until space frees up or the wait budget expires.
    BackPressure,

    /// Divert the new message to the mailbox's dead-letter list.
    DeadLetter,
}

/// Enqueue outcome for the non-error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    /// Appended with capacity to spare.
    Enqueued,
    /// Capacity was hit and the overflow policy resolved it.
    OverflowHandled,
}

/// Enqueue failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    /// An installed filter rejected the message.
    #[error("message rejected by mailbox filter")]
    Filtered,

    /// The mailbox is full and the policy cannot resolve it without
    /// blocking (non-suspending enqueue under BackPressure).
    #[error("mailbox full: capacity {capacity}")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },

    /// BackPressure waited for space past its deadline.
    #[error("backpressure wait exceeded {waited:?}")]
    BackPressureTimeout {
        /// How long the producer waited before giving up.
        waited: Duration,
    },
}

/// Message predicate; returning `false` rejects the message.
pub type MessageFilter = Box<dyn Fn(&Message) -> bool + Send + Sync>;

struct Inner {
    fifo: VecDeque<Message>,
    heap: PriorityQueue,
    filters: Vec<MessageFilter>,
    dead_letters: VecDeque<Message>,
}

impl Inner {
    fn len(&self, mode: MailboxMode) -> usize {
        match mode {
            MailboxMode::Fifo => self.fifo.len(),
            MailboxMode::Priority => self.heap.len(),
        }
    }
}

/// A bounded message queue owned by exactly one actor.
///
/// Concurrent enqueue/dequeue are serialized by the mailbox's own mutex.
/// The `not_full` signal is edge-triggered: every dequeue that reduces
/// the queue size stores at most one pending wakeup, which a producer
/// blocked under the BackPressure policy consumes.
///
/// Invariant: `len() <= capacity()` at all times.
pub struct Mailbox {
    id: MailboxId,
    owner: ActorId,
    capacity: usize,
    mode: MailboxMode,
    policy: OverflowPolicy,
    back_pressure_wait: Duration,
    inner: Mutex<Inner>,
    not_full: Notify,
    stats: MailboxStats,
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("capacity", &self.capacity)
            .field("mode", &self.mode)
            .field("policy", &self.policy)
            .field("len", &self.len())
            .finish()
    }
}

impl Mailbox {
    /// Create a mailbox for `owner` with the given discipline and policy.
    pub fn new(
        id: MailboxId,
        owner: ActorId,
        capacity: usize,
        mode: MailboxMode,
        policy: OverflowPolicy,
    ) -> Self {
        Self {
            id,
            owner,
            capacity: capacity.max(1),
            mode,
            policy,
            back_pressure_wait: DEFAULT_BACK_PRESSURE_WAIT,
            inner: Mutex::new(Inner {
                fifo: VecDeque::new(),
                heap: PriorityQueue::new(),
                filters: Vec::new(),
                dead_letters: VecDeque::new(),
            }),
            not_full: Notify::new(),
            stats: MailboxStats::new(),
        }
    }

    /// Override the BackPressure wait budget.
    pub fn with_back_pressure_wait(mut self, wait: Duration) -> Self {
        self.back_pressure_wait = wait;
        self
    }

    /// Mailbox id.
    pub fn id(&self) -> MailboxId {
        self.id
    }

    /// Owning actor.
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue discipline.
    pub fn mode(&self) -> MailboxMode {
        self.mode
    }

    /// Overflow policy.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Current queue length.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.len(self.mode)
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statistics counters.
    pub fn stats(&self) -> MailboxStatsSnapshot {
        self.stats.snapshot()
    }

    /// Install a message filter. Filters run in installation order on
    /// every enqueue; the first one returning `false` rejects.
    pub fn add_filter(&self, filter: impl Fn(&Message) -> bool + Send + Sync + 'static) {
        self.inner.lock().filters.push(Box::new(filter));
    }

    /// Enqueue a message.
    ///
    /// Filters run first; a rejection reports [`MailboxError::Filtered`].
    /// A full mailbox dispatches to the overflow policy. Only the
    /// BackPressure policy suspends, and only up to its wait budget.
    pub async fn enqueue(&self, msg: Message) -> Result<EnqueueResult, MailboxError> {
        match self.try_enqueue_inner(msg)? {
            TryEnqueue::Done(result) => Ok(result),
            TryEnqueue::WouldBlock(msg) => self.enqueue_back_pressure(msg).await,
        }
    }

    /// Non-suspending enqueue. Under BackPressure a full mailbox reports
    /// [`MailboxError::Full`] instead of blocking.
    pub fn try_enqueue(&self, msg: Message) -> Result<EnqueueResult, MailboxError> {
        match self.try_enqueue_inner(msg)? {
            TryEnqueue::Done(result) => Ok(result),
            TryEnqueue::WouldBlock(_) => {
                self.stats.record_overflowed();
                Err(MailboxError::Full {
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Remove the next message: FIFO head, or the max-priority entry in
    /// priority mode. Fires the not-full signal on success.
    pub fn dequeue(&self) -> Option<Message> {
        let msg = {
            let mut inner = self.inner.lock();
            match self.mode {
                MailboxMode::Fifo => inner.fifo.pop_front(),
                MailboxMode::Priority => inner.heap.pop(),
            }
        };

        if msg.is_some() {
            self.stats.record_dequeued();
            // Coalesced single-permit wakeup for blocked producers.
            self.not_full.notify_one();
        }
        msg
    }

    /// Drop all queued messages. Counts them as dropped and releases any
    /// blocked producer.
    pub fn clear(&self) {
        let removed = {
            let mut inner = self.inner.lock();
            let n = inner.len(self.mode);
            inner.fifo.clear();
            inner.heap.clear();
            n
        };
        for _ in 0..removed {
            self.stats.record_dropped();
        }
        if removed > 0 {
            self.not_full.notify_one();
        }
    }

    /// Drain the mailbox's dead-letter list.
    pub fn take_dead_letters(&self) -> Vec<Message> {
        self.inner.lock().dead_letters.drain(..).collect()
    }

    fn try_enqueue_inner(&self, msg: Message) -> Result<TryEnqueue, MailboxError> {
        let mut inner = self.inner.lock();

        if !inner.filters.iter().all(|f| f(&msg)) {
            self.stats.record_filtered();
            return Err(MailboxError::Filtered);
        }

        if inner.len(self.mode) < self.capacity {
            self.push(&mut inner, msg);
            self.stats.record_enqueued();
            return Ok(TryEnqueue::Done(EnqueueResult::Enqueued));
        }

        match self.policy {
            OverflowPolicy::DropOldest => {
                let _removed = match self.mode {
                    MailboxMode::Fifo => inner.fifo.pop_front(),
                    MailboxMode::Priority => inner.heap.remove_oldest(),
                };
                self.push(&mut inner, msg);
                self.stats.record_overflowed();
                self.stats.record_enqueued();
                Ok(TryEnqueue::Done(EnqueueResult::OverflowHandled))
            }
            OverflowPolicy::DropNewest => {
                self.stats.record_overflowed();
                self.stats.record_dropped();
                Ok(TryEnqueue::Done(EnqueueResult::OverflowHandled))
            }
            OverflowPolicy::DropLowPriority => {
                let _removed = match self.mode {
                    MailboxMode::Fifo => {
                        // Linear scan for the minimum-priority entry.
                        let min_idx = inner
                            .fifo
                            .iter()
                            .enumerate()
                            .min_by_key(|(_, m)| m.priority)
                            .map(|(i, _)| i);
                        min_idx.and_then(|i| inner.fifo.remove(i))
                    }
                    MailboxMode::Priority => inner.heap.remove_min(),
                };
                self.push(&mut inner, msg);
                self.stats.record_overflowed();
                self.stats.record_enqueued();
                Ok(TryEnqueue::Done(EnqueueResult::OverflowHandled))
            }
            OverflowPolicy::BackPressure => Ok(TryEnqueue::WouldBlock(msg)),
            OverflowPolicy::DeadLetter => {
                if inner.dead_letters.len() >= self.capacity {
                    inner.dead_letters.pop_front();
                }
                inner.dead_letters.push_back(msg);
                self.stats.record_overflowed();
                self.stats.record_dead_lettered();
                Ok(TryEnqueue::Done(EnqueueResult::OverflowHandled))
            }
        }
    }

    async fn enqueue_back_pressure(&self, msg: Message) -> Result<EnqueueResult, MailboxError> {
        let start = Instant::now();
        let deadline = start + self.back_pressure_wait;
        self.stats.record_backpressure_wait();

        loop {
            // Arm the wakeup before rechecking so a dequeue between the
            // capacity check and the await is never missed: notify_one
            // stores a permit when no waiter is registered.
            let notified = self.not_full.notified();

            {
                let mut inner = self.inner.lock();
                if inner.len(self.mode) < self.capacity {
                    self.push(&mut inner, msg);
                    self.stats.record_enqueued();
                    return Ok(EnqueueResult::Enqueued);
                }
            }

            tokio::select! {
                _ = notified => {
                    // Space may be available; retry under the lock.
                }
                _ = tokio::time::sleep_until(deadline) => {
                    self.stats.record_backpressure_timeout();
                    return Err(MailboxError::BackPressureTimeout {
                        waited: start.elapsed(),
                    });
                }
            }
        }
    }

    fn push(&self, inner: &mut Inner, msg: Message) {
        match self.mode {
            MailboxMode::Fifo => inner.fifo.push_back(msg),
            MailboxMode::Priority => inner.heap.push(msg),
        }
    }
}

enum TryEnqueue {
    Done(EnqueueResult),
    WouldBlock(Message),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::{Payload, Priority};
    use crate::util::MessageId;

    fn mailbox(capacity: usize, mode: MailboxMode, policy: OverflowPolicy) -> Mailbox {
        Mailbox::new(
            MailboxId::from_raw(1),
            ActorId::from_raw(1),
            capacity,
            mode,
            policy,
        )
    }

    fn msg(id: u64) -> Message {
        Message::new(
            MessageId::from_raw(id),
            1,
            ActorId::SYSTEM,
            ActorId::from_raw(1),
        )
    }

    fn msg_with_priority(id: u64, priority: Priority) -> Message {
        msg(id).with_priority(priority)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let mb = mailbox(8, MailboxMode::Fifo, OverflowPolicy::DropOldest);
        for i in 1..=3 {
            mb.enqueue(msg(i)).await.unwrap();
        }

        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 1);
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 2);
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 3);
        assert!(mb.dequeue().is_none());
    }

    #[tokio::test]
    async fn test_len_never_exceeds_capacity() {
        let mb = mailbox(4, MailboxMode::Fifo, OverflowPolicy::DropOldest);
        for i in 0..20 {
            mb.enqueue(msg(i)).await.unwrap();
            assert!(mb.len() <= mb.capacity());
        }
    }

    #[tokio::test]
    async fn test_drop_oldest_keeps_newest() {
        let mb = mailbox(2, MailboxMode::Fifo, OverflowPolicy::DropOldest);
        mb.enqueue(msg(1)).await.unwrap();
        mb.enqueue(msg(2)).await.unwrap();
        let result = mb.enqueue(msg(3)).await.unwrap();

        assert_eq!(result, EnqueueResult::OverflowHandled);
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 2);
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 3);

        // Overflow is recorded, but nothing counts as dropped.
        let stats = mb.stats();
        assert_eq!(stats.overflowed, 1);
        assert_eq!(stats.dropped, 0);
    }

    #[tokio::test]
    async fn test_drop_newest_refuses_message() {
        let mb = mailbox(2, MailboxMode::Fifo, OverflowPolicy::DropNewest);
        mb.enqueue(msg(1)).await.unwrap();
        mb.enqueue(msg(2)).await.unwrap();
        let result = mb.enqueue(msg(3)).await.unwrap();

        assert_eq!(result, EnqueueResult::OverflowHandled);
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 1);
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 2);
        assert!(mb.dequeue().is_none());

        let stats = mb.stats();
        assert_eq!(stats.dropped, 1);
    }

    #[tokio::test]
    async fn test_drop_low_priority_evicts_minimum() {
        let mb = mailbox(2, MailboxMode::Fifo, OverflowPolicy::DropLowPriority);
        mb.enqueue(msg_with_priority(1, Priority::Low)).await.unwrap();
        mb.enqueue(msg_with_priority(2, Priority::High)).await.unwrap();
        mb.enqueue(msg_with_priority(3, Priority::Normal))
            .await
            .unwrap();

        let remaining: Vec<u64> = std::iter::from_fn(|| mb.dequeue())
            .map(|m| m.id.as_u64())
            .collect();
        assert_eq!(remaining, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_dead_letter_policy() {
        let mb = mailbox(1, MailboxMode::Fifo, OverflowPolicy::DeadLetter);
        mb.enqueue(msg(1)).await.unwrap();
        mb.enqueue(msg(2)).await.unwrap();
        mb.enqueue(msg(3)).await.unwrap();

        assert_eq!(mb.len(), 1);
        let dead: Vec<u64> = mb
            .take_dead_letters()
            .iter()
            .map(|m| m.id.as_u64())
            .collect();
        assert_eq!(dead, vec![2, 3]);
        assert_eq!(mb.stats().dead_lettered, 2);
    }

    #[tokio::test]
    async fn test_back_pressure_times_out() {
        let mb = mailbox(1, MailboxMode::Fifo, OverflowPolicy::BackPressure)
            .with_back_pressure_wait(Duration::from_millis(20));
        mb.enqueue(msg(1)).await.unwrap();

        let result = mb.enqueue(msg(2)).await;
        assert!(matches!(
            result,
            Err(MailboxError::BackPressureTimeout { .. })
        ));
        assert_eq!(mb.len(), 1);
    }

    #[tokio::test]
    async fn test_back_pressure_unblocks_on_dequeue() {
        use std::sync::Arc;

        let mb = Arc::new(
            mailbox(1, MailboxMode::Fifo, OverflowPolicy::BackPressure)
                .with_back_pressure_wait(Duration::from_secs(5)),
        );
        mb.enqueue(msg(1)).await.unwrap();

        let producer = {
            let mb = Arc::clone(&mb);
            tokio::spawn(async move { mb.enqueue(msg(2)).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 1);

        let result = producer.await.unwrap();
        assert_eq!(result.unwrap(), EnqueueResult::Enqueued);
        assert_eq!(mb.dequeue().unwrap().id.as_u64(), 2);
    }

    #[tokio::test]
    async fn test_filter_rejects() {
        let mb = mailbox(8, MailboxMode::Fifo, OverflowPolicy::DropOldest);
        mb.add_filter(|m| m.payload.as_text() != Some("blocked"));

        mb.enqueue(msg(1).with_payload(Payload::from("ok")))
            .await
            .unwrap();
        let rejected = mb
            .enqueue(msg(2).with_payload(Payload::from("blocked")))
            .await;

        assert_eq!(rejected, Err(MailboxError::Filtered));
        assert_eq!(mb.len(), 1);
        assert_eq!(mb.stats().filtered, 1);
    }

    #[tokio::test]
    async fn test_priority_mode_dequeues_max() {
        let mb = mailbox(16, MailboxMode::Priority, OverflowPolicy::DropOldest);
        for (i, p) in [
            Priority::Low,
            Priority::Critical,
            Priority::Normal,
            Priority::High,
        ]
        .iter()
        .enumerate()
        {
            mb.enqueue(msg_with_priority(i as u64, *p)).await.unwrap();
        }

        let mut last = Priority::Critical;
        while let Some(m) = mb.dequeue() {
            assert!(m.priority <= last);
            last = m.priority;
        }
    }

    #[tokio::test]
    async fn test_clear_empties_and_counts() {
        let mb = mailbox(8, MailboxMode::Fifo, OverflowPolicy::DropOldest);
        for i in 0..5 {
            mb.enqueue(msg(i)).await.unwrap();
        }
        mb.clear();

        assert!(mb.is_empty());
        assert_eq!(mb.stats().dropped, 5);
    }

    #[test]
    fn test_try_enqueue_back_pressure_fails_fast() {
        use tokio_test::{assert_err, assert_ok};

        let mb = mailbox(1, MailboxMode::Fifo, OverflowPolicy::BackPressure);
        assert_ok!(mb.try_enqueue(msg(1)));

        let result = assert_err!(mb.try_enqueue(msg(2)));
        assert_eq!(result, MailboxError::Full { capacity: 1 });
    }
}
