// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

// Layer 3: Internal module imports
use super::config::{SchedulerConfig, SchedulingStrategy};
use crate::util::ActorId;

/// Callback a worker invokes for one scheduled actor: dequeue one
/// message from the actor's mailbox and run its behavior.
pub type ProcessFn = Arc<dyn Fn(ActorId) + Send + Sync>;

/// Point-in-time view of one worker for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
    /// Worker index.
    pub index: usize,
    /// CPU affinity mask assigned at startup.
    pub cpu_mask: u64,
    /// Current queue length.
    pub queue_len: usize,
    /// Work items completed.
    pub completed: u64,
    /// Work items taken from siblings.
    pub stolen: u64,
}

struct Worker {
    index: usize,
    cpu_mask: u64,
    capacity: usize,
    queue: Mutex<VecDeque<ActorId>>,
    queue_len: AtomicUsize,
    notify: Notify,
    completed: AtomicU64,
    stolen: AtomicU64,
}

impl Worker {
    fn new(index: usize, cpu_mask: u64, capacity: usize) -> Self {
        Self {
            index,
            cpu_mask,
            capacity,
            queue: Mutex::new(VecDeque::new()),
            queue_len: AtomicUsize::new(0),
            notify: Notify::new(),
            completed: AtomicU64::new(0),
            stolen: AtomicU64::new(0),
        }
    }

    /// Non-blocking bounded push. The atomic length mirrors the queue
    /// under the lock so least-loaded selection stays lock-free.
    fn push(&self, actor: ActorId) -> bool {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            return false;
        }
        queue.push_back(actor);
        self.queue_len.fetch_add(1, Ordering::Relaxed);
        drop(queue);
        self.notify.notify_one();
        true
    }

    /// Non-blocking pop from the front.
    fn pop(&self) -> Option<ActorId> {
        let mut queue = self.queue.lock();
        let actor = queue.pop_front()?;
        self.queue_len.fetch_sub(1, Ordering::Relaxed);
        Some(actor)
    }

    fn len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            index: self.index,
            cpu_mask: self.cpu_mask,
            queue_len: self.len(),
            completed: self.completed.load(Ordering::Relaxed),
            stolen: self.stolen.load(Ordering::Relaxed),
        }
    }
}

/// Worker pool dispatching actor processing.
///
/// `schedule` picks the least-loaded worker whose CPU mask overlaps the
/// actor's affinity mask (a zero affinity mask means "any worker"),
/// falling back to the global least-loaded worker when the preferred
/// queue is full. When every queue is saturated the hint is dropped:
/// the message stays in the mailbox and dequeue-driven rescheduling
/// retries later.
pub struct Scheduler {
    workers: Vec<Arc<Worker>>,
    config: SchedulerConfig,
    handles: Mutex<Vec<JoinHandle<()>>>,
    rr_cursor: AtomicUsize,
    scheduled_total: AtomicU64,
    dropped_hints: AtomicU64,
}

impl Scheduler {
    /// Build the pool. Worker `i` gets the one-hot CPU mask
    /// `1 << (i % cpu_count)`; with more than 64 CPUs masks degrade to
    /// all-ones.
    pub fn new(config: SchedulerConfig) -> Self {
        let cpu_count = num_cpus::get().max(1);
        let workers = (0..config.worker_count.max(1))
            .map(|i| {
                let mask = if cpu_count > 64 {
                    u64::MAX
                } else {
                    1u64 << (i % cpu_count)
                };
                Arc::new(Worker::new(i, mask, config.queue_capacity))
            })
            .collect();

        Self {
            workers,
            config,
            handles: Mutex::new(Vec::new()),
            rr_cursor: AtomicUsize::new(0),
            scheduled_total: AtomicU64::new(0),
            dropped_hints: AtomicU64::new(0),
        }
    }

    /// Number of workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Lifetime count of accepted scheduling hints.
    pub fn scheduled_total(&self) -> u64 {
        self.scheduled_total.load(Ordering::Relaxed)
    }

    /// Lifetime count of dropped scheduling hints.
    pub fn dropped_hints(&self) -> u64 {
        self.dropped_hints.load(Ordering::Relaxed)
    }

    /// Per-worker diagnostics.
    pub fn snapshot(&self) -> Vec<WorkerSnapshot> {
        self.workers.iter().map(|w| w.snapshot()).collect()
    }

    /// Spawn the worker tasks. Each loop runs until `cancel` fires.
    pub fn start(&self, cancel: CancellationToken, process: ProcessFn) {
        let mut handles = self.handles.lock();
        for worker in &self.workers {
            let worker = Arc::clone(worker);
            let siblings = self.workers.clone();
            let cancel = cancel.clone();
            let process = Arc::clone(&process);
            let idle_wait = self.config.idle_wait;
            let stealing = self.config.work_stealing_enabled;

            handles.push(tokio::spawn(async move {
                Self::worker_loop(worker, siblings, cancel, process, idle_wait, stealing).await;
            }));
        }
    }

    /// Abort all worker tasks. Queued hints are discarded; pending
    /// messages stay in their mailboxes.
    pub fn stop(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }

    /// Enqueue a processing hint for `actor`.
    ///
    /// Returns `false` when every eligible queue is full and the hint
    /// was dropped. Scheduling an actor id that no longer resolves is
    /// harmless; the process callback treats it as a no-op.
    pub fn schedule(&self, actor: ActorId, affinity_mask: u64) -> bool {
        let preferred = self.select_worker(affinity_mask);

        if let Some(worker) = preferred {
            if worker.push(actor) {
                self.scheduled_total.fetch_add(1, Ordering::Relaxed);
                return true;
            }
        }

        // Preferred queue full (or no candidate matched the mask):
        // fall back to the global least-loaded worker.
        if let Some(worker) = self.least_loaded(|_| true) {
            if worker.push(actor) {
                self.scheduled_total.fetch_add(1, Ordering::Relaxed);
                return true;
            }
        }

        // Saturated. Drop the hint; dequeue-driven rescheduling retries.
        self.dropped_hints.fetch_add(1, Ordering::Relaxed);
        debug!(actor = %actor, "scheduler saturated, dropping hint");
        false
    }

    fn select_worker(&self, affinity_mask: u64) -> Option<&Arc<Worker>> {
        let matches_mask =
            |w: &Worker| affinity_mask == 0 || (w.cpu_mask & affinity_mask) != 0;

        match self.config.strategy {
            SchedulingStrategy::RoundRobin => {
                let n = self.workers.len();
                let start = self.rr_cursor.fetch_add(1, Ordering::Relaxed);
                (0..n)
                    .map(|k| &self.workers[(start + k) % n])
                    .find(|w| matches_mask(w))
            }
            _ => self.least_loaded(matches_mask),
        }
    }

    fn least_loaded(&self, eligible: impl Fn(&Worker) -> bool) -> Option<&Arc<Worker>> {
        self.workers
            .iter()
            .filter(|w| eligible(w))
            .min_by_key(|w| w.len())
    }

    async fn worker_loop(
        worker: Arc<Worker>,
        siblings: Vec<Arc<Worker>>,
        cancel: CancellationToken,
        process: ProcessFn,
        idle_wait: std::time::Duration,
        stealing: bool,
    ) {
        let n = siblings.len();
        loop {
            if cancel.is_cancelled() {
                break;
            }

            if let Some(actor) = worker.pop() {
                (*process)(actor);
                worker.completed.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            // Idle: wait briefly for a wakeup on the own queue.
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = worker.notify.notified() => continue,
                _ = tokio::time::sleep(idle_wait) => {}
            }

            if !stealing {
                continue;
            }

            // Non-blocking polls over sibling queues, round-robin
            // starting at (self + 1) % n.
            for k in 1..n {
                let victim = &siblings[(worker.index + k) % n];
                if let Some(actor) = victim.pop() {
                    (*process)(actor);
                    worker.completed.fetch_add(1, Ordering::Relaxed);
                    worker.stolen.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        }
    }
}
