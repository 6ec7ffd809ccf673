//! Per-actor context: properties, watch bookkeeping, named timers, and
//! the stash buffer. The context shares the actor's lifetime and is only
//! ever touched under the actor's lock, so it carries no locking of its
//! own.

// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde_json::Value;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::mailbox::Mailbox;
use crate::message::Message;
use crate::util::ActorId;

/// Default bound on stashed messages.
pub const DEFAULT_STASH_LIMIT: usize = 128;

/// Per-actor context handed to every behavior callback.
pub struct Context {
    actor_id: ActorId,
    /// Sender of the message currently being processed.
    sender: ActorId,
    mailbox: Option<Arc<Mailbox>>,
    props: HashMap<String, Value>,
    watched: HashSet<ActorId>,
    watchers: HashSet<ActorId>,
    timers: HashMap<String, JoinHandle<()>>,
    stash: VecDeque<Message>,
    stash_limit: usize,
}

impl Context {
    /// Create a context bound to the actor's own mailbox.
    pub fn new(actor_id: ActorId, mailbox: Arc<Mailbox>) -> Self {
        Self {
            actor_id,
            sender: ActorId::SYSTEM,
            mailbox: Some(mailbox),
            props: HashMap::new(),
            watched: HashSet::new(),
            watchers: HashSet::new(),
            timers: HashMap::new(),
            stash: VecDeque::new(),
            stash_limit: DEFAULT_STASH_LIMIT,
        }
    }

    /// Create a context without a mailbox. Used by unit tests and by
    /// behaviors exercised outside a running system.
    pub fn detached(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            sender: ActorId::SYSTEM,
            mailbox: None,
            props: HashMap::new(),
            watched: HashSet::new(),
            watchers: HashSet::new(),
            timers: HashMap::new(),
            stash: VecDeque::new(),
            stash_limit: DEFAULT_STASH_LIMIT,
        }
    }

    /// The owning actor's id.
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Sender of the message currently being processed;
    /// `ActorId::SYSTEM` outside of `receive`.
    pub fn sender(&self) -> ActorId {
        self.sender
    }

    pub(crate) fn set_sender(&mut self, sender: ActorId) {
        self.sender = sender;
    }

    /// Bound the stash buffer; `0` disables stashing entirely.
    pub(crate) fn set_stash_limit(&mut self, limit: usize) {
        self.stash_limit = limit;
    }

    /// Read a property.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Set a property.
    pub fn set_prop(&mut self, key: impl Into<String>, value: Value) {
        self.props.insert(key.into(), value);
    }

    /// Actors this actor watches (outgoing edges).
    pub fn watched(&self) -> &HashSet<ActorId> {
        &self.watched
    }

    /// Actors watching this actor (incoming edges).
    pub fn watchers(&self) -> &HashSet<ActorId> {
        &self.watchers
    }

    pub(crate) fn add_watched(&mut self, target: ActorId) {
        self.watched.insert(target);
    }

    pub(crate) fn remove_watched(&mut self, target: ActorId) {
        self.watched.remove(&target);
    }

    pub(crate) fn add_watcher(&mut self, watcher: ActorId) {
        self.watchers.insert(watcher);
    }

    pub(crate) fn remove_watcher(&mut self, watcher: ActorId) {
        self.watchers.remove(&watcher);
    }

    /// Defer a message for later processing. Returns `false` when the
    /// stash is full; the message is dropped in that case.
    pub fn stash(&mut self, msg: Message) -> bool {
        if self.stash.len() >= self.stash_limit {
            return false;
        }
        self.stash.push_back(msg);
        true
    }

    /// Number of stashed messages.
    pub fn stash_len(&self) -> usize {
        self.stash.len()
    }

    /// Re-enqueue all stashed messages into the mailbox in stash order.
    /// Returns the number of messages moved. Messages that no longer fit
    /// go through the mailbox's overflow policy like any other enqueue.
    pub fn unstash_all(&mut self) -> usize {
        let Some(mailbox) = self.mailbox.clone() else {
            return 0;
        };
        let mut moved = 0;
        while let Some(msg) = self.stash.pop_front() {
            if mailbox.try_enqueue(msg).is_ok() {
                moved += 1;
            }
        }
        moved
    }

    pub(crate) fn register_timer(&mut self, name: impl Into<String>, handle: JoinHandle<()>) {
        // Replacing a timer cancels the previous one under the same name.
        if let Some(old) = self.timers.insert(name.into(), handle) {
            old.abort();
        }
    }

    pub(crate) fn cancel_timer(&mut self, name: &str) -> bool {
        match self.timers.remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub(crate) fn cancel_all_timers(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }

    /// Names of the currently armed timers.
    pub fn timer_names(&self) -> Vec<String> {
        self.timers.keys().cloned().collect()
    }
}
