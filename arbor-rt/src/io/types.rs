// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Layer 3: Internal module imports
use crate::message::{Priority, IO_ERROR_EVT, IO_READABLE, IO_WRITABLE};
use crate::util::serde_helpers::duration_millis_serde;

/// Default initial re-register backoff.
pub const DEFAULT_BACKOFF_INITIAL: Duration = Duration::from_millis(5);

/// Default backoff cap.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_millis(100);

/// Default watermark monitor interval.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_millis(10);

/// I/O integration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// No poller is attached to the system.
    #[error("no I/O poller attached")]
    PollerMissing,

    /// The external poller refused a registration.
    #[error("poller registration failed: {0}")]
    Register(String),

    /// Watermarks violate `low <= high`.
    #[error("invalid watermarks: low {low} > high {high}")]
    InvalidWatermark {
        /// Offending low watermark.
        low: usize,
        /// Offending high watermark.
        high: usize,
    },

    /// The connection is not watched.
    #[error("connection not watched: {0}")]
    NotWatched(u64),
}

/// Readiness event classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoEventKind {
    /// Data can be read.
    Readable,
    /// Data can be written.
    Writable,
    /// The connection reported an error.
    Error,
}

impl IoEventKind {
    /// Reserved message type tag for this event class.
    pub fn message_type(&self) -> u32 {
        match self {
            Self::Readable => IO_READABLE,
            Self::Writable => IO_WRITABLE,
            Self::Error => IO_ERROR_EVT,
        }
    }
}

/// Handler the integration registers with the external poller.
pub type PollHandler = Arc<dyn Fn(u64, IoEventKind) + Send + Sync>;

/// An I/O source that can be identified to the poller.
pub trait Pollable: Send + Sync {
    /// Opaque connection identity.
    fn conn_id(&self) -> u64;
}

/// External readiness poller, specified as an interface only.
///
/// Implementations invoke the registered handler for each readiness
/// event; the handler must not block.
pub trait Poller: Send + Sync {
    /// Register interest in `kinds` for `conn`, delivering events to
    /// `handler`.
    fn register(
        &self,
        conn: u64,
        kinds: &[IoEventKind],
        handler: PollHandler,
    ) -> Result<(), IoError>;

    /// Drop interest in `conn`.
    fn deregister(&self, conn: u64) -> Result<(), IoError>;
}

/// TLS wrapper, specified as an interface only: wraps a registered
/// connection before events start flowing.
pub trait TlsConnector: Send + Sync {
    /// Wrap `conn`, returning the identity of the wrapped connection.
    fn wrap(&self, conn: u64) -> Result<u64, IoError>;
}

/// Filesystem change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    /// The watched path changed.
    Changed(String),
    /// The watcher reported an error for the path.
    Error(String),
}

/// External filesystem watcher, specified as an interface only.
pub trait FsWatcher: Send + Sync {
    /// Watch `path`, delivering events to `handler`.
    fn watch(
        &self,
        path: &str,
        handler: Arc<dyn Fn(FsEvent) + Send + Sync>,
    ) -> Result<(), IoError>;

    /// Stop watching `path`.
    fn unwatch(&self, path: &str) -> Result<(), IoError>;
}

/// Options for one watched connection.
///
/// Per-event-class watermarks inherit the global pair when zero.
/// [`IoWatchOptions::normalized`] must pass before the options are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoWatchOptions {
    /// Priority for Readable events.
    pub read_priority: Priority,
    /// Priority for Writable events.
    pub write_priority: Priority,
    /// Priority for Error events.
    pub error_priority: Priority,

    /// Global high watermark (mailbox length that pauses delivery).
    pub high_watermark: usize,
    /// Global low watermark (mailbox length that resumes delivery).
    pub low_watermark: usize,
    /// Read-class high watermark; `0` inherits the global value.
    pub read_high_watermark: usize,
    /// Read-class low watermark; `0` inherits the global value.
    pub read_low_watermark: usize,
    /// Write-class high watermark; `0` inherits the global value.
    pub write_high_watermark: usize,
    /// Write-class low watermark; `0` inherits the global value.
    pub write_low_watermark: usize,

    /// Initial re-register backoff after an overflow.
    #[serde(with = "duration_millis_serde")]
    pub backoff_initial: Duration,
    /// Backoff cap.
    #[serde(with = "duration_millis_serde")]
    pub backoff_max: Duration,
    /// Watermark monitor poll interval.
    #[serde(with = "duration_millis_serde")]
    pub monitor_interval: Duration,

    /// Discard events on overflow instead of backing off.
    pub drop_on_overflow: bool,
}

impl Default for IoWatchOptions {
    fn default() -> Self {
        Self {
            read_priority: Priority::Normal,
            write_priority: Priority::Normal,
            error_priority: Priority::High,
            high_watermark: 0,
            low_watermark: 0,
            read_high_watermark: 0,
            read_low_watermark: 0,
            write_high_watermark: 0,
            write_low_watermark: 0,
            backoff_initial: DEFAULT_BACKOFF_INITIAL,
            backoff_max: DEFAULT_BACKOFF_MAX,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            drop_on_overflow: false,
        }
    }
}

impl IoWatchOptions {
    /// Priority for an event class.
    pub fn priority_for(&self, kind: IoEventKind) -> Priority {
        match kind {
            IoEventKind::Readable => self.read_priority,
            IoEventKind::Writable => self.write_priority,
            IoEventKind::Error => self.error_priority,
        }
    }

    /// Effective `(high, low)` watermarks for an event class, after
    /// inheritance. A zero high watermark disables pausing for the
    /// class.
    pub fn watermarks_for(&self, kind: IoEventKind) -> (usize, usize) {
        let (mut high, mut low) = match kind {
            IoEventKind::Readable => (self.read_high_watermark, self.read_low_watermark),
            IoEventKind::Writable => (self.write_high_watermark, self.write_low_watermark),
            IoEventKind::Error => (0, 0),
        };
        if high == 0 {
            high = self.high_watermark;
        }
        if low == 0 {
            low = self.low_watermark;
        }
        (high, low)
    }

    /// Validate the watermark relationships (`low <= high` wherever a
    /// class has a non-zero high watermark).
    pub fn normalized(self) -> Result<Self, IoError> {
        for kind in [IoEventKind::Readable, IoEventKind::Writable] {
            let (high, low) = self.watermarks_for(kind);
            if high != 0 && low > high {
                return Err(IoError::InvalidWatermark { low, high });
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priorities() {
        let opts = IoWatchOptions::default();
        assert_eq!(opts.priority_for(IoEventKind::Readable), Priority::Normal);
        assert_eq!(opts.priority_for(IoEventKind::Writable), Priority::Normal);
        assert_eq!(opts.priority_for(IoEventKind::Error), Priority::High);
    }

    #[test]
    fn test_event_kind_message_types() {
        assert_eq!(IoEventKind::Readable.message_type(), IO_READABLE);
        assert_eq!(IoEventKind::Writable.message_type(), IO_WRITABLE);
        assert_eq!(IoEventKind::Error.message_type(), IO_ERROR_EVT);
    }

    #[test]
    fn test_watermark_inheritance() {
        let opts = IoWatchOptions {
            high_watermark: 100,
            low_watermark: 10,
            read_high_watermark: 50,
            ..IoWatchOptions::default()
        };

        // Read class: own high, inherited low.
        assert_eq!(opts.watermarks_for(IoEventKind::Readable), (50, 10));
        // Write class: inherits both.
        assert_eq!(opts.watermarks_for(IoEventKind::Writable), (100, 10));
    }

    #[test]
    fn test_normalization_rejects_inverted_watermarks() {
        let opts = IoWatchOptions {
            high_watermark: 10,
            low_watermark: 20,
            ..IoWatchOptions::default()
        };
        assert!(matches!(
            opts.normalized(),
            Err(IoError::InvalidWatermark { low: 20, high: 10 })
        ));
    }

    #[test]
    fn test_normalization_accepts_disabled_watermarks() {
        // All zeros: pausing disabled entirely; valid.
        let opts = IoWatchOptions::default();
        assert!(opts.normalized().is_ok());
    }

    #[test]
    fn test_normalization_checks_per_class() {
        let opts = IoWatchOptions {
            write_high_watermark: 5,
            write_low_watermark: 9,
            ..IoWatchOptions::default()
        };
        assert!(opts.normalized().is_err());
    }

    struct FakeConn(u64);

    impl Pollable for FakeConn {
        fn conn_id(&self) -> u64 {
            self.0
        }
    }

    struct IdentityTls;

    impl TlsConnector for IdentityTls {
        fn wrap(&self, conn: u64) -> Result<u64, IoError> {
            // A real connector would return the wrapped stream's id.
            Ok(conn)
        }
    }

    #[test]
    fn test_tls_wrap_before_watch() {
        let conn = FakeConn(7);
        let tls = IdentityTls;

        let wrapped = tls.wrap(conn.conn_id());
        assert_eq!(wrapped, Ok(7));
    }
}
