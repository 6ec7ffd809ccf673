//! I/O integration: binds readiness events from an external pollable
//! source to actor mailboxes, with watermark-based pause/resume and
//! bounded exponential backoff. The poller, filesystem watcher, and TLS
//! wrapper are peripheral collaborators specified only as interfaces.

pub mod integration;
pub mod log;
pub mod types;

pub use integration::IoIntegration;
pub use log::{IoEventLog, IoEventRecord, IoLogQuery};
pub use types::{
    FsEvent, FsWatcher, IoError, IoEventKind, IoWatchOptions, PollHandler, Pollable, Poller,
    TlsConnector,
};
