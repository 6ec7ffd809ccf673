//! Message model: priorities, tagged payloads, and the immutable record
//! that flows through mailboxes and the dispatcher.

pub mod envelope;
pub mod types;

pub use envelope::Message;
pub use types::{
    Payload, Priority, FS_CHANGED, IO_ERROR_EVT, IO_READABLE, IO_WRITABLE, SYSTEM_TERMINATED,
};
