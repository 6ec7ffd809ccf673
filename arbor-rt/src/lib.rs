//! # arbor-rt - Supervised Actor Runtime
//!
//! A general-purpose concurrency runtime built around three tightly
//! coupled subsystems:
//!
//! 1. **Actor system**: typed ids, bounded mailboxes with five overflow
//!    policies, a work-stealing multi-worker scheduler with CPU
//!    affinity, a dispatch pipeline with interceptors and transformers,
//!    and a hierarchical supervision tree with sliding restart windows.
//! 2. **I/O integration**: binds readiness events from an external
//!    pollable source to actor mailboxes, with watermark-based
//!    pause/resume and bounded exponential backoff.
//! 3. **Diagnostics plane**: read-only snapshots, message tracing with
//!    correlation, an actor relationship graph, deadlock detection via
//!    strongly connected components over watch edges, and an HTTP
//!    surface with `/metrics` text exposition.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use arbor_rt::prelude::*;
//!
//! struct Echo {
//!     seen: Vec<String>,
//! }
//!
//! impl Behavior for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     fn receive(&mut self, _ctx: &mut Context, msg: &Message) -> Result<(), BehaviorError> {
//!         if let Some(text) = msg.payload.as_text() {
//!             self.seen.push(text.to_owned());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SystemError> {
//!     let system = ActorSystem::new(SystemConfig::default())?;
//!     system.start()?;
//!
//!     let echo = system.create_actor(
//!         "echo",
//!         "worker",
//!         Box::new(Echo { seen: Vec::new() }),
//!         ActorConfig::default(),
//!     )?;
//!     system.send(ActorId::SYSTEM, echo, 1, Payload::from("hello")).await?;
//!
//!     system.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency Model
//!
//! Actors are single-threaded relative to themselves: a worker holds
//! the actor's own lock for the whole of `Behavior::receive`, so a
//! behavior never races with itself. Different actors run in parallel
//! across workers. Behaviors are synchronous by design; anything
//! asynchronous is modeled as messages, including timers and I/O
//! readiness.
//!
//! Lock order is fixed: system map → supervisor → actor → mailbox.
//! Watermark monitors and I/O timers never call into behaviors
//! synchronously.
//!
//! # Module Organization
//!
//! - [`message`] - priorities, tagged payloads, the message record
//! - [`mailbox`] - bounded queues, overflow policies, priority heap
//! - [`registry`] - name→id resolution
//! - [`actor`] - behavior seam, lifecycle, context, cell
//! - [`supervisor`] - restart windows and strategy dispatch
//! - [`dispatch`] - route → intercept → transform → enqueue
//! - [`scheduler`] - worker pool with affinity and stealing
//! - [`system`] - the composition root
//! - [`io`] - poller binding with watermarks and backoff
//! - [`trace`] - tracer rings, actor graph, deadlock detection
//! - [`diag`] - diagnostics HTTP plane and metrics exposition
//! - [`util`] - id generation and serde helpers

pub mod actor;
pub mod diag;
pub mod dispatch;
pub mod io;
pub mod mailbox;
pub mod message;
pub mod prelude;
pub mod registry;
pub mod scheduler;
pub mod supervisor;
pub mod system;
pub mod trace;
pub mod util;

// Re-export commonly used types
pub use actor::{ActorState, Behavior, BehaviorError, Context};
pub use mailbox::{EnqueueResult, Mailbox, MailboxError, MailboxMode, OverflowPolicy};
pub use message::{Message, Payload, Priority};
pub use supervisor::{SupervisionStrategy, SupervisorConfig, SupervisorType};
pub use system::{
    ActorConfig, ActorSystem, GroupConfig, MailboxType, Remote, SystemConfig, SystemError,
};
pub use util::{ActorId, GroupId, MailboxId, MessageId, SupervisorId};
