//! System-level error taxonomy.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::dispatch::DispatchError;
use crate::io::IoError;
use crate::mailbox::MailboxError;
use crate::registry::RegistryError;
use crate::util::{ActorId, GroupId, SupervisorId};

/// Errors surfaced by system operations.
#[derive(Error, Debug)]
pub enum SystemError {
    /// Operation issued before start or after stop.
    #[error("system not running")]
    NotRunning,

    /// Unknown actor id.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// Unknown actor name.
    #[error("name not found: {0}")]
    NameNotFound(String),

    /// Unknown supervisor id.
    #[error("supervisor not found: {0}")]
    SupervisorNotFound(SupervisorId),

    /// Unknown group id.
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    /// The live-actor cap was hit.
    #[error("actor limit exceeded: current {current}, max {max}")]
    ActorLimitExceeded {
        /// Actors currently live.
        current: usize,
        /// Configured cap.
        max: usize,
    },

    /// Actor creation failed in a lifecycle hook.
    #[error("failed to spawn actor: {0}")]
    SpawnFailed(String),

    /// Delivery pipeline failure (interception, transform, resolution,
    /// or enqueue).
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Direct mailbox failure outside the dispatch pipeline.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),

    /// Name registration failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// I/O integration failure.
    #[error(transparent)]
    Io(#[from] IoError),

    /// A `node:name` send with no remote transport attached.
    #[error("remote transport unavailable for node: {0}")]
    RemoteUnavailable(String),

    /// Invalid argument (watermarks, capacities, configuration).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Graceful shutdown exceeded its budget.
    #[error("shutdown timeout exceeded after {0:?}")]
    ShutdownTimeout(Duration),
}

impl SystemError {
    /// Whether a retry may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SystemError::Dispatch(DispatchError::Enqueue(_))
                | SystemError::Mailbox(
                    MailboxError::Full { .. } | MailboxError::BackPressureTimeout { .. }
                )
        )
    }

    /// Whether the system cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SystemError::NotRunning | SystemError::ShutdownTimeout(_)
        )
    }

    /// Whether the error can be handled without stopping the system.
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InterceptError;

    #[test]
    fn test_display_messages() {
        let err = SystemError::ActorNotFound(ActorId::from_raw(3));
        assert!(err.to_string().contains("actor not found"));
        assert!(err.to_string().contains('3'));

        let err = SystemError::ActorLimitExceeded {
            current: 10,
            max: 5,
        };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains('5'));

        assert_eq!(SystemError::NotRunning.to_string(), "system not running");
    }

    #[test]
    fn test_transient_classification() {
        let full = SystemError::Dispatch(DispatchError::Enqueue(MailboxError::Filtered));
        assert!(full.is_transient());

        let not_found = SystemError::ActorNotFound(ActorId::from_raw(1));
        assert!(!not_found.is_transient());
        assert!(not_found.is_recoverable());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(SystemError::NotRunning.is_fatal());
        assert!(SystemError::ShutdownTimeout(Duration::from_secs(30)).is_fatal());
        assert!(!SystemError::NameNotFound("x".into()).is_fatal());
    }

    #[test]
    fn test_dispatch_conversion() {
        let err: SystemError = DispatchError::Interception(InterceptError("no".into())).into();
        assert!(matches!(err, SystemError::Dispatch(_)));
        assert!(err.to_string().contains("interception failed"));
    }

    #[test]
    fn test_io_conversion() {
        let err: SystemError = IoError::PollerMissing.into();
        assert!(matches!(err, SystemError::Io(_)));
        assert!(err.is_recoverable());
    }
}
