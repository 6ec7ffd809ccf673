//! Actor lifecycle state machine.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// Lifecycle state of an actor.
///
/// Transitions happen only under the actor's own lock.
///
/// ```text
/// Idle ⇄ Busy
///  │  ↘ Waiting
///  │     Restarting → Idle
///  └→ Stopping → Stopped
///        Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActorState {
    /// Ready for the next message.
    #[default]
    Idle,

    /// Currently running its behavior.
    Busy,

    /// Waiting on an external condition (stashing, timer).
    Waiting,

    /// Supervisor-driven restart in progress.
    Restarting,

    /// Stop requested; no further messages accepted.
    Stopping,

    /// Stopped; terminal.
    Stopped,

    /// Failed and awaiting a supervision decision.
    Failed,
}

impl ActorState {
    /// Whether the actor can accept a message for processing.
    pub fn can_process(&self) -> bool {
        matches!(self, Self::Idle | Self::Busy | Self::Waiting | Self::Failed)
    }

    /// Whether the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Whether the actor is shutting down or already gone.
    pub fn is_stopping_or_stopped(&self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Busy => "Busy",
            Self::Waiting => "Waiting",
            Self::Restarting => "Restarting",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
            Self::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(ActorState::default(), ActorState::Idle);
    }

    #[test]
    fn test_can_process() {
        assert!(ActorState::Idle.can_process());
        assert!(ActorState::Failed.can_process());
        assert!(!ActorState::Stopping.can_process());
        assert!(!ActorState::Stopped.can_process());
    }

    #[test]
    fn test_terminal() {
        assert!(ActorState::Stopped.is_terminal());
        assert!(!ActorState::Failed.is_terminal());
        assert!(!ActorState::Restarting.is_terminal());
    }

    #[test]
    fn test_stopping_or_stopped() {
        assert!(ActorState::Stopping.is_stopping_or_stopped());
        assert!(ActorState::Stopped.is_stopping_or_stopped());
        assert!(!ActorState::Busy.is_stopping_or_stopped());
    }

    #[test]
    fn test_display() {
        assert_eq!(ActorState::Restarting.to_string(), "Restarting");
    }
}
