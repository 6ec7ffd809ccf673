//! Convenience re-exports for the common path.
//!
//! ```rust
//! use arbor_rt::prelude::*;
//! ```

pub use crate::actor::{ActorState, Behavior, BehaviorError, Context};
pub use crate::io::{FsWatcher, IoEventKind, IoWatchOptions, Poller, TlsConnector};
pub use crate::mailbox::{MailboxMode, OverflowPolicy};
pub use crate::message::{
    Message, Payload, Priority, FS_CHANGED, IO_ERROR_EVT, IO_READABLE, IO_WRITABLE,
    SYSTEM_TERMINATED,
};
pub use crate::supervisor::{SupervisionStrategy, SupervisorConfig, SupervisorType};
pub use crate::system::{
    ActorConfig, ActorSystem, GroupConfig, MailboxType, Remote, SystemConfig, SystemError,
};
pub use crate::util::{ActorId, GroupId, MailboxId, MessageId, SupervisorId};
