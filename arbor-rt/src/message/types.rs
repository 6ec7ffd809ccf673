// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
use crate::util::ActorId;

/// Reserved message type tag: termination notice delivered to watchers.
pub const SYSTEM_TERMINATED: u32 = 0xFFFF_0001;

/// Reserved message type tag: connection became readable.
pub const IO_READABLE: u32 = 0x0001_0001;

/// Reserved message type tag: connection became writable.
pub const IO_WRITABLE: u32 = 0x0001_0002;

/// Reserved message type tag: connection reported an error condition.
pub const IO_ERROR_EVT: u32 = 0x0001_0003;

/// Reserved message type tag: filesystem path changed.
pub const FS_CHANGED: u32 = 0x0002_0001;

/// Message priority levels for mailbox ordering.
///
/// Five levels, strictly ordered `Low < Normal < High < System < Critical`.
/// A priority mailbox always dequeues the highest priority present;
/// FIFO mailboxes ignore priority entirely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Priority {
    /// Background work that can be deferred.
    Low = 0,

    /// Default priority for routine messages.
    #[default]
    Normal = 1,

    /// Time-sensitive messages handled ahead of routine traffic.
    High = 2,

    /// Runtime-internal messages (termination notices, supervision).
    System = 3,

    /// Highest priority, reserved for shutdown-critical signals.
    Critical = 4,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::High => "High",
            Self::System => "System",
            Self::Critical => "Critical",
        };
        write!(f, "{name}")
    }
}

/// Tagged message payload.
///
/// Known runtime bodies get their own variants; user payloads travel in
/// the opaque [`Payload::Json`] envelope. The message `type` tag is the
/// discriminant clients match on, not the payload variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value")]
pub enum Payload {
    /// No payload.
    #[default]
    None,

    /// UTF-8 text.
    Text(String),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// Signed integer.
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Boolean flag.
    Bool(bool),

    /// Opaque user payload.
    Json(Value),

    /// Actor terminated; carried by `SYSTEM_TERMINATED` messages.
    Terminated(ActorId),

    /// I/O readiness event; carried by the reserved IO_* tags.
    IoReady {
        /// Opaque connection identity as registered with the poller.
        conn: u64,
    },

    /// Filesystem change; carried by `FS_CHANGED` messages.
    FsChange {
        /// The watched path that changed.
        path: String,
    },
}

impl Payload {
    /// Text accessor, `None` for other variants.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Terminated-actor accessor, `None` for other variants.
    pub fn as_terminated(&self) -> Option<ActorId> {
        match self {
            Self::Terminated(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}
