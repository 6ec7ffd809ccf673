//! Work-stealing scheduler.
//!
//! N workers, each with a bounded queue of actor ids and an atomic queue
//! length for lock-free least-loaded selection. A worker that finds its
//! own queue empty for a short idle window polls its siblings'
//! queues round-robin starting at `(self + 1) % n`, non-blocking. No
//! condition variables: wakeups go through a coalesced
//! [`tokio::sync::Notify`] per worker.
//!
//! Saturation is handled by dropping the scheduling hint: the message
//! stays in the target's mailbox and the next enqueue or dequeue
//! reschedules the actor. Senders are never blocked on scheduler
//! capacity.

pub mod config;
pub mod pool;

pub use config::{SchedulerConfig, SchedulingStrategy};
pub use pool::{ProcessFn, Scheduler, WorkerSnapshot};
