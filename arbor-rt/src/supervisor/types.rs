//! Type definitions for the supervision framework.

// Layer 1: Standard library imports
use std::fmt;
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::duration_serde;

/// Default cap on restarts inside one retry period.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default sliding window for restart counting.
pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(10);

/// Default timeout when escalating to a parent supervisor.
pub const DEFAULT_ESCALATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Which children a supervisor acts on when one of them fails.
///
/// The scopes mirror Erlang/OTP supervision:
/// - **OneForOne**: only the failed child.
/// - **OneForAll**: every child.
/// - **RestForOne**: the failed child plus all children created after
///   it, in creation order.
/// - **SimpleOneForOne**: like OneForOne, for homogeneous dynamically
///   added children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SupervisorType {
    /// Act on the failed child only.
    #[default]
    OneForOne,

    /// Act on every child.
    OneForAll,

    /// Act on the failed child and all later-created siblings.
    RestForOne,

    /// OneForOne for homogeneous dynamic children.
    SimpleOneForOne,
}

impl fmt::Display for SupervisorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OneForOne => "OneForOne",
            Self::OneForAll => "OneForAll",
            Self::RestForOne => "RestForOne",
            Self::SimpleOneForOne => "SimpleOneForOne",
        };
        write!(f, "{name}")
    }
}

/// What a supervisor does with the children in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SupervisionStrategy {
    /// Restart, subject to each child's restart window.
    #[default]
    Restart,

    /// Take no action; the actor continues with its next message.
    Resume,

    /// Terminate the children in scope.
    Stop,

    /// Propagate the failure to the parent supervisor. With no parent,
    /// falls back to Restart.
    Escalate,
}

impl fmt::Display for SupervisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Restart => "Restart",
            Self::Resume => "Resume",
            Self::Stop => "Stop",
            Self::Escalate => "Escalate",
        };
        write!(f, "{name}")
    }
}

/// Supervisor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Failure handling strategy.
    pub strategy: SupervisionStrategy,

    /// Restarts allowed inside `retry_period`; `0` disables the limit.
    pub max_retries: u32,

    /// Sliding window for restart counting; zero disables the limit.
    #[serde(with = "duration_serde")]
    pub retry_period: Duration,

    /// How long an escalated failure may wait on the parent.
    #[serde(with = "duration_serde")]
    pub escalation_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            strategy: SupervisionStrategy::Restart,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_period: DEFAULT_RETRY_PERIOD,
            escalation_timeout: DEFAULT_ESCALATION_TIMEOUT,
        }
    }
}
