// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;

// Layer 3: Internal module imports
use super::dead_letter::DeadLetterStore;
use crate::mailbox::{Mailbox, MailboxError};
use crate::message::Message;
use crate::scheduler::Scheduler;
use crate::trace::{TraceEvent, Tracer};
use crate::util::ActorId;

/// Interceptor failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InterceptError(pub String);

/// Transformer failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransformError(pub String);

/// Pipeline failure reported to the caller of send.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// An interceptor rejected the message; it was not enqueued.
    #[error("interception failed: {0}")]
    Interception(#[from] InterceptError),

    /// A transformer failed; the message was not enqueued.
    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),

    /// No actor resolves for the receiver; routed to dead letters.
    #[error("receiver not found: {0}")]
    ReceiverNotFound(ActorId),

    /// The receiver's mailbox refused the message; routed to dead
    /// letters.
    #[error("enqueue failed: {0}")]
    Enqueue(#[from] MailboxError),
}

/// One routing rule: messages of the configured type go to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Receiving actor for matching messages.
    pub target: ActorId,
}

/// Hook that can inspect or mutate a message before delivery.
pub trait Interceptor: Send + Sync {
    /// Inspect or mutate `msg`; an error aborts delivery.
    fn intercept(&self, msg: &mut Message) -> Result<(), InterceptError>;
}

impl<F> Interceptor for F
where
    F: Fn(&mut Message) -> Result<(), InterceptError> + Send + Sync,
{
    fn intercept(&self, msg: &mut Message) -> Result<(), InterceptError> {
        self(msg)
    }
}

/// Hook that can rewrite headers or payload before delivery.
pub trait Transformer: Send + Sync {
    /// Rewrite `msg`; an error aborts delivery.
    fn transform(&self, msg: &mut Message) -> Result<(), TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(&mut Message) -> Result<(), TransformError> + Send + Sync,
{
    fn transform(&self, msg: &mut Message) -> Result<(), TransformError> {
        self(msg)
    }
}

/// The send pipeline.
///
/// `deliver` runs route → intercept → transform → enqueue → notify.
/// Routing tables and hook chains sit behind read/write locks; the hot
/// path snapshots them under the read side and releases before running
/// any hook. Mailbox resolution goes through a shared index the system
/// maintains, so delivery never takes an actor lock.
pub struct Dispatcher {
    routes: RwLock<HashMap<u32, Vec<Route>>>,
    interceptors: RwLock<Vec<Arc<dyn Interceptor>>>,
    transformers: RwLock<Vec<Arc<dyn Transformer>>>,
    mailboxes: Arc<DashMap<ActorId, Arc<Mailbox>>>,
    dead_letters: Arc<DeadLetterStore>,
    tracer: RwLock<Option<Arc<Tracer>>>,
    total_messages: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher over the system's mailbox index and
    /// dead-letter store.
    pub fn new(
        mailboxes: Arc<DashMap<ActorId, Arc<Mailbox>>>,
        dead_letters: Arc<DeadLetterStore>,
    ) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            interceptors: RwLock::new(Vec::new()),
            transformers: RwLock::new(Vec::new()),
            mailboxes,
            dead_letters,
            tracer: RwLock::new(None),
            total_messages: AtomicU64::new(0),
        }
    }

    /// Install a tracer; delivered messages are recorded after routing.
    pub fn set_tracer(&self, tracer: Option<Arc<Tracer>>) {
        *self.tracer.write() = tracer;
    }

    /// Append a routing rule for a message type. The first rule wins at
    /// delivery time.
    pub fn add_route(&self, message_type: u32, route: Route) {
        self.routes
            .write()
            .entry(message_type)
            .or_default()
            .push(route);
    }

    /// Append an interceptor to the chain.
    pub fn add_interceptor(&self, interceptor: impl Interceptor + 'static) {
        self.interceptors.write().push(Arc::new(interceptor));
    }

    /// Append a transformer to the chain.
    pub fn add_transformer(&self, transformer: impl Transformer + 'static) {
        self.transformers.write().push(Arc::new(transformer));
    }

    /// Lifetime count of messages that completed the pipeline.
    pub fn total_messages(&self) -> u64 {
        self.total_messages.load(Ordering::Relaxed)
    }

    /// First route target for a message type, if any.
    pub fn route_for(&self, message_type: u32) -> Option<ActorId> {
        self.routes
            .read()
            .get(&message_type)
            .and_then(|routes| routes.first())
            .map(|route| route.target)
    }

    /// Run the full delivery pipeline for `msg`.
    ///
    /// On success the receiver has the message in its mailbox and the
    /// scheduler has been notified. Interception/transform errors leave
    /// the message unenqueued; resolution and enqueue failures also
    /// record the message as a dead letter.
    pub async fn deliver(
        &self,
        mut msg: Message,
        scheduler: &Scheduler,
        affinity_mask_of: impl Fn(ActorId) -> u64,
    ) -> Result<(), DispatchError> {
        // Snapshot tables under the read side, then release.
        if let Some(target) = self.route_for(msg.message_type) {
            msg.receiver = target;
        }
        let interceptors: Vec<Arc<dyn Interceptor>> = self.interceptors.read().clone();
        let transformers: Vec<Arc<dyn Transformer>> = self.transformers.read().clone();

        let Some(mailbox) = self
            .mailboxes
            .get(&msg.receiver)
            .map(|entry| Arc::clone(entry.value()))
        else {
            let receiver = msg.receiver;
            self.dead_letters.push(msg);
            return Err(DispatchError::ReceiverNotFound(receiver));
        };

        for interceptor in &interceptors {
            interceptor.intercept(&mut msg)?;
        }
        for transformer in &transformers {
            transformer.transform(&mut msg)?;
        }

        let receiver = msg.receiver;
        let trace = self
            .tracer
            .read()
            .as_ref()
            .map(|t| (Arc::clone(t), TraceEvent::from_message(&msg)));
        if let Err(err) = mailbox.enqueue(msg.clone()).await {
            self.dead_letters.push(msg);
            return Err(DispatchError::Enqueue(err));
        }
        if let Some((tracer, event)) = trace {
            tracer.record(event);
        }

        scheduler.schedule(receiver, affinity_mask_of(receiver));
        self.total_messages.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
