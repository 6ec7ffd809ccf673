// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use super::log::{IoEventLog, IoLogQuery, IoEventRecord};
use super::types::{
    FsEvent, FsWatcher, IoError, IoEventKind, IoWatchOptions, PollHandler, Poller,
};
use crate::mailbox::{EnqueueResult, Mailbox};
use crate::message::{Message, Payload, Priority, FS_CHANGED, IO_ERROR_EVT};
use crate::scheduler::Scheduler;
use crate::util::{ActorId, IdGenerator};

/// Minimum spacing between filesystem error deliveries to one target.
pub const FS_ERROR_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// State for one watched connection.
struct Binding {
    conn: u64,
    kinds: Vec<IoEventKind>,
    target: ActorId,
    opts: IoWatchOptions,
    paused: AtomicBool,
    /// Low watermark captured when the pause was triggered.
    pause_low: AtomicUsize,
    backoff: Mutex<Duration>,
    monitor_active: AtomicBool,
}

impl Binding {
    fn reset_backoff(&self) {
        *self.backoff.lock() = self.opts.backoff_initial;
    }

    /// Current backoff, doubling for the next overflow up to the cap.
    fn bump_backoff(&self) -> Duration {
        let mut backoff = self.backoff.lock();
        let current = *backoff;
        *backoff = (current * 2).min(self.opts.backoff_max);
        current
    }
}

/// Serializable view of one binding for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct BindingSnapshot {
    /// Connection identity.
    pub conn: u64,
    /// Target actor.
    pub target: ActorId,
    /// Watched event classes.
    pub kinds: Vec<IoEventKind>,
    /// Whether delivery is currently paused.
    pub paused: bool,
}

/// Binds poller readiness events to actor mailboxes.
///
/// Event handling is synchronous and never calls into actor behaviors;
/// it enqueues a message, nudges the scheduler, and returns. Watermark
/// monitors and backoff timers run as background tasks observing the
/// system's cancellation token.
pub struct IoIntegration {
    poller: RwLock<Option<Arc<dyn Poller>>>,
    bindings: DashMap<u64, Arc<Binding>>,
    mailboxes: Arc<DashMap<ActorId, Arc<Mailbox>>>,
    scheduler: Arc<Scheduler>,
    ids: Arc<IdGenerator>,
    log: IoEventLog,
    cancel: CancellationToken,
    default_opts: IoWatchOptions,
    fs_error_last: DashMap<ActorId, DateTime<Utc>>,
}

impl IoIntegration {
    /// Create the integration over the system's mailbox index.
    pub fn new(
        mailboxes: Arc<DashMap<ActorId, Arc<Mailbox>>>,
        scheduler: Arc<Scheduler>,
        ids: Arc<IdGenerator>,
        cancel: CancellationToken,
        default_opts: IoWatchOptions,
    ) -> Self {
        Self {
            poller: RwLock::new(None),
            bindings: DashMap::new(),
            mailboxes,
            scheduler,
            ids,
            log: IoEventLog::default(),
            cancel,
            default_opts,
            fs_error_last: DashMap::new(),
        }
    }

    /// Attach the external poller.
    pub fn attach_poller(&self, poller: Arc<dyn Poller>) {
        *self.poller.write() = Some(poller);
    }

    /// Whether a poller is attached.
    pub fn has_poller(&self) -> bool {
        self.poller.read().is_some()
    }

    fn poller(&self) -> Result<Arc<dyn Poller>, IoError> {
        self.poller
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(IoError::PollerMissing)
    }

    fn handler(self: &Arc<Self>) -> PollHandler {
        let weak = Arc::downgrade(self);
        Arc::new(move |conn, kind| {
            if let Some(io) = weak.upgrade() {
                io.handle_event(conn, kind);
            }
        })
    }

    /// Register `conn` with the poller and bind its events to `target`.
    ///
    /// `opts` falls back to the system default watch options; watermark
    /// normalization must pass.
    pub fn watch_connection(
        self: &Arc<Self>,
        conn: u64,
        kinds: &[IoEventKind],
        target: ActorId,
        opts: Option<IoWatchOptions>,
    ) -> Result<(), IoError> {
        let poller = self.poller()?;
        let opts = opts.unwrap_or_else(|| self.default_opts.clone()).normalized()?;

        let binding = Arc::new(Binding {
            conn,
            kinds: kinds.to_vec(),
            target,
            backoff: Mutex::new(opts.backoff_initial),
            opts,
            paused: AtomicBool::new(false),
            pause_low: AtomicUsize::new(0),
            monitor_active: AtomicBool::new(false),
        });

        poller.register(conn, kinds, self.handler())?;
        self.bindings.insert(conn, binding);
        Ok(())
    }

    /// Remove the binding and deregister from the poller.
    pub fn unwatch_connection(&self, conn: u64) -> Result<(), IoError> {
        let (_, _binding) = self
            .bindings
            .remove(&conn)
            .ok_or(IoError::NotWatched(conn))?;
        if let Ok(poller) = self.poller() {
            let _ = poller.deregister(conn);
        }
        Ok(())
    }

    /// Number of watched connections.
    pub fn watched_count(&self) -> usize {
        self.bindings.len()
    }

    /// Diagnostics view of all bindings.
    pub fn bindings_snapshot(&self) -> Vec<BindingSnapshot> {
        self.bindings
            .iter()
            .map(|entry| BindingSnapshot {
                conn: entry.conn,
                target: entry.target,
                kinds: entry.kinds.clone(),
                paused: entry.paused.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Windowed view of the event log.
    pub fn events(&self, window: IoLogQuery) -> Vec<IoEventRecord> {
        self.log.query(window)
    }

    /// Drop event-log records older than `cutoff`. Called by the GC
    /// task.
    pub fn prune_events_before(&self, cutoff: DateTime<Utc>) -> usize {
        self.log.prune_before(cutoff)
    }

    /// Handle one readiness event from the poller.
    ///
    /// Never blocks and never runs actor code. Unknown connections are
    /// ignored (the binding may have been removed concurrently).
    pub fn handle_event(self: &Arc<Self>, conn: u64, kind: IoEventKind) {
        let Some(binding) = self.bindings.get(&conn).map(|b| Arc::clone(b.value())) else {
            return;
        };
        let Some(mailbox) = self.mailbox_of(binding.target) else {
            return;
        };

        // Watermark pause: past the high mark, stop the event source
        // before it floods the mailbox further.
        let (high, low) = binding.opts.watermarks_for(kind);
        if high > 0
            && mailbox.len() >= high
            && !binding.paused.swap(true, Ordering::SeqCst)
        {
            binding.pause_low.store(low, Ordering::SeqCst);
            if let Ok(poller) = self.poller() {
                let _ = poller.deregister(conn);
            }
            debug!(conn, target = %binding.target, "io binding paused at high watermark");
            self.spawn_monitor(Arc::clone(&binding));
        }

        let msg = Message::new(
            self.ids.next_message(),
            kind.message_type(),
            ActorId::SYSTEM,
            binding.target,
        )
        .with_payload(Payload::IoReady { conn })
        .with_priority(binding.opts.priority_for(kind));

        match mailbox.try_enqueue(msg) {
            Ok(EnqueueResult::Enqueued) => {
                self.scheduler.schedule(binding.target, 0);
                binding.reset_backoff();
                self.log.record(conn, kind, binding.target, true);

                // A successful delivery on a paused binding resumes
                // immediately once the queue has drained to the low
                // mark.
                if binding.paused.load(Ordering::SeqCst)
                    && mailbox.len() <= binding.pause_low.load(Ordering::SeqCst)
                {
                    self.try_resume(&binding);
                }
            }
            _ => {
                self.log.record(conn, kind, binding.target, false);
                if binding.opts.drop_on_overflow {
                    return;
                }
                // Stop the source and retry registration after the
                // current backoff.
                if let Ok(poller) = self.poller() {
                    let _ = poller.deregister(conn);
                }
                let delay = binding.bump_backoff();
                self.schedule_reregister(Arc::clone(&binding), delay);
            }
        }
    }

    fn mailbox_of(&self, target: ActorId) -> Option<Arc<Mailbox>> {
        self.mailboxes
            .get(&target)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Re-register a paused binding. Returns whether delivery resumed.
    fn try_resume(self: &Arc<Self>, binding: &Arc<Binding>) -> bool {
        let Ok(poller) = self.poller() else {
            return false;
        };
        match poller.register(binding.conn, &binding.kinds, self.handler()) {
            Ok(()) => {
                binding.paused.store(false, Ordering::SeqCst);
                debug!(conn = binding.conn, "io binding resumed");
                true
            }
            Err(err) => {
                warn!(conn = binding.conn, error = %err, "io re-register failed");
                false
            }
        }
    }

    /// Monitor a paused binding until the mailbox drains to the low
    /// watermark, then resume. At most one monitor per binding.
    fn spawn_monitor(self: &Arc<Self>, binding: Arc<Binding>) {
        if binding.monitor_active.swap(true, Ordering::SeqCst) {
            return;
        }
        let weak = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let interval = binding.opts.monitor_interval;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                let Some(io) = weak.upgrade() else { break };
                if !io.bindings.contains_key(&binding.conn) {
                    break;
                }
                if !binding.paused.load(Ordering::SeqCst) {
                    break;
                }
                let Some(mailbox) = io.mailbox_of(binding.target) else {
                    break;
                };
                if mailbox.len() <= binding.pause_low.load(Ordering::SeqCst)
                    && io.try_resume(&binding)
                {
                    break;
                }
            }
            binding.monitor_active.store(false, Ordering::SeqCst);
        });
    }

    /// Re-register after an overflow backoff.
    fn schedule_reregister(self: &Arc<Self>, binding: Arc<Binding>, delay: Duration) {
        let weak = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let Some(io) = weak.upgrade() else { return };
            if !io.bindings.contains_key(&binding.conn) {
                return;
            }
            let _ = io.try_resume(&binding);
        });
    }

    /// Bridge filesystem change events for `path` to `target`.
    ///
    /// Change events deliver `FS_CHANGED` messages; watcher errors
    /// deliver error messages rate-limited to one per 200 ms per
    /// target.
    pub fn watch_path(
        self: &Arc<Self>,
        watcher: &Arc<dyn FsWatcher>,
        path: &str,
        target: ActorId,
    ) -> Result<(), IoError> {
        let weak = Arc::downgrade(self);
        watcher.watch(
            path,
            Arc::new(move |event| {
                let Some(io) = weak.upgrade() else { return };
                match event {
                    FsEvent::Changed(path) => {
                        io.deliver_fs(target, FS_CHANGED, path, Priority::Normal);
                    }
                    FsEvent::Error(reason) => {
                        if io.fs_error_allowed(target) {
                            io.deliver_fs(target, IO_ERROR_EVT, reason, Priority::High);
                        }
                    }
                }
            }),
        )
    }

    fn deliver_fs(&self, target: ActorId, message_type: u32, path: String, priority: Priority) {
        let Some(mailbox) = self.mailbox_of(target) else {
            return;
        };
        let msg = Message::new(self.ids.next_message(), message_type, ActorId::SYSTEM, target)
            .with_payload(Payload::FsChange { path })
            .with_priority(priority);
        if matches!(mailbox.try_enqueue(msg), Ok(EnqueueResult::Enqueued)) {
            self.scheduler.schedule(target, 0);
        }
    }

    /// Rate limiter for filesystem error deliveries.
    fn fs_error_allowed(&self, target: ActorId) -> bool {
        let now = Utc::now();
        let mut entry = self.fs_error_last.entry(target).or_insert(
            now - chrono::Duration::milliseconds(FS_ERROR_MIN_INTERVAL.as_millis() as i64 * 2),
        );
        let elapsed = now.signed_duration_since(*entry);
        if elapsed >= chrono::Duration::milliseconds(FS_ERROR_MIN_INTERVAL.as_millis() as i64) {
            *entry = now;
            true
        } else {
            false
        }
    }
}
