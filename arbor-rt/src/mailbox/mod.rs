//! Message queuing: bounded mailboxes with overflow policies, an optional
//! priority heap, and the edge-triggered not-full signal used by
//! backpressure.

pub mod priority;
pub mod queue;
pub mod stats;

pub use priority::PriorityQueue;
pub use queue::{
    EnqueueResult, Mailbox, MailboxError, MailboxMode, OverflowPolicy,
    DEFAULT_BACK_PRESSURE_WAIT,
};
pub use stats::{MailboxStats, MailboxStatsSnapshot};
