// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

// Layer 3: Internal module imports
use crate::message::{Message, Priority};
use crate::util::{ActorId, MessageId};

/// Default per-actor ring size.
pub const DEFAULT_TRACE_BUFFER: usize = 128;

/// One recorded message delivery.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    /// When the event was recorded.
    pub time: DateTime<Utc>,
    /// Sending actor.
    pub sender: ActorId,
    /// Receiving actor.
    pub receiver: ActorId,
    /// Message type tag.
    #[serde(rename = "type")]
    pub message_type: u32,
    /// Message priority.
    pub priority: Priority,
    /// Correlation id, if the message carried one.
    pub correlation_id: Option<String>,
    /// Message id.
    pub message_id: MessageId,
}

impl TraceEvent {
    /// Build a trace event from a message at delivery time.
    pub fn from_message(msg: &Message) -> Self {
        Self {
            time: Utc::now(),
            sender: msg.sender,
            receiver: msg.receiver,
            message_type: msg.message_type,
            priority: msg.priority,
            correlation_id: msg.correlation_id.clone(),
            message_id: msg.id,
        }
    }
}

/// Bounded overwrite-oldest ring.
#[derive(Debug)]
struct Ring {
    buf: VecDeque<TraceEvent>,
    capacity: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    fn push(&mut self, event: TraceEvent) {
        if self.buf.len() >= self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(event);
    }

    /// The newest `n` events in chronological order.
    fn recent(&self, n: usize) -> Vec<TraceEvent> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip).cloned().collect()
    }

    fn newest_time(&self) -> Option<DateTime<Utc>> {
        self.buf.back().map(|e| e.time)
    }
}

/// Message tracer: one ring per actor plus one per correlation id.
///
/// Each ring has its own mutex; the maps sit behind read/write locks so
/// recording typically takes the read side plus one ring lock.
#[derive(Debug)]
pub struct Tracer {
    capacity: usize,
    per_actor: RwLock<HashMap<ActorId, Mutex<Ring>>>,
    per_correlation: RwLock<HashMap<String, Mutex<Ring>>>,
}

impl Tracer {
    /// Create a tracer with the given per-actor ring capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            per_actor: RwLock::new(HashMap::new()),
            per_correlation: RwLock::new(HashMap::new()),
        }
    }

    /// Per-actor ring capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record one delivery: sender ring, receiver ring (when distinct),
    /// and correlation ring (when a correlation id is present).
    pub fn record(&self, event: TraceEvent) {
        self.push_actor(event.sender, event.clone());
        if event.receiver != event.sender {
            self.push_actor(event.receiver, event.clone());
        }
        if let Some(cid) = event.correlation_id.clone() {
            self.push_correlation(cid, event);
        }
    }

    /// Newest `n` events involving `actor`, chronological.
    pub fn recent(&self, actor: ActorId, n: usize) -> Vec<TraceEvent> {
        let rings = self.per_actor.read();
        match rings.get(&actor) {
            Some(ring) => ring.lock().recent(n),
            None => Vec::new(),
        }
    }

    /// Newest `n` events for a correlation id, chronological.
    pub fn by_correlation(&self, correlation_id: &str, n: usize) -> Vec<TraceEvent> {
        let rings = self.per_correlation.read();
        match rings.get(correlation_id) {
            Some(ring) => ring.lock().recent(n),
            None => Vec::new(),
        }
    }

    /// Drop correlation rings whose newest event predates `cutoff`.
    /// Called by the GC task so long-lived systems do not accumulate
    /// rings for one-shot correlation ids.
    pub fn prune_idle_correlations(&self, cutoff: DateTime<Utc>) -> usize {
        let mut rings = self.per_correlation.write();
        let before = rings.len();
        rings.retain(|_, ring| match ring.lock().newest_time() {
            Some(t) => t >= cutoff,
            None => false,
        });
        before - rings.len()
    }

    /// Drop the ring of a stopped actor.
    pub fn forget_actor(&self, actor: ActorId) {
        self.per_actor.write().remove(&actor);
    }

    fn push_actor(&self, actor: ActorId, event: TraceEvent) {
        {
            let rings = self.per_actor.read();
            if let Some(ring) = rings.get(&actor) {
                ring.lock().push(event);
                return;
            }
        }
        let mut rings = self.per_actor.write();
        rings
            .entry(actor)
            .or_insert_with(|| Mutex::new(Ring::new(self.capacity)))
            .lock()
            .push(event);
    }

    fn push_correlation(&self, cid: String, event: TraceEvent) {
        {
            let rings = self.per_correlation.read();
            if let Some(ring) = rings.get(&cid) {
                ring.lock().push(event);
                return;
            }
        }
        let mut rings = self.per_correlation.write();
        rings
            .entry(cid)
            .or_insert_with(|| Mutex::new(Ring::new(self.capacity)))
            .lock()
            .push(event);
    }
}
