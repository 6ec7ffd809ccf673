//! The behavior seam: five lifecycle callbacks plus a name.
//!
//! Behaviors are deliberately synchronous. Actor processing is a
//! straight-line critical section under the actor's own lock; anything
//! asynchronous a behavior wants done must be modeled as messages (to
//! itself or to others). Timers and I/O events enter the actor the same
//! way.

// Layer 1: Standard library imports
use std::error::Error;
use std::fmt;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::context::Context;
use crate::message::Message;

/// Error produced by a behavior callback.
///
/// Behavior errors never reach the sender; the owning actor records them
/// and funnels them into its supervisor's failure handler.
#[derive(Debug)]
pub struct BehaviorError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl BehaviorError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The failure reason.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BehaviorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for BehaviorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

impl From<&str> for BehaviorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for BehaviorError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Actor behavior: message handling plus lifecycle hooks.
///
/// `receive` is the only required method. Lifecycle hooks default to
/// no-ops so simple behaviors stay small.
///
/// # Example
/// ```rust
/// use arbor_rt::actor::{Behavior, BehaviorError, Context};
/// use arbor_rt::message::Message;
///
/// struct Echo {
///     seen: Vec<String>,
/// }
///
/// impl Behavior for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn receive(&mut self, _ctx: &mut Context, msg: &Message) -> Result<(), BehaviorError> {
///         if let Some(text) = msg.payload.as_text() {
///             self.seen.push(text.to_owned());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Behavior: Send {
    /// Human-readable behavior name, used in logs and snapshots.
    fn name(&self) -> &str;

    /// Handle one message. Runs under the actor's exclusive lock.
    fn receive(&mut self, ctx: &mut Context, msg: &Message) -> Result<(), BehaviorError>;

    /// Called once before the actor is scheduled for the first time.
    fn pre_start(&mut self, _ctx: &mut Context) -> Result<(), BehaviorError> {
        Ok(())
    }

    /// Called during stop, before watchers are notified.
    fn post_stop(&mut self, _ctx: &mut Context) -> Result<(), BehaviorError> {
        Ok(())
    }

    /// Called before a supervisor-driven restart, with the failure reason.
    fn pre_restart(&mut self, _ctx: &mut Context, _reason: &str) -> Result<(), BehaviorError> {
        Ok(())
    }

    /// Called after a supervisor-driven restart completes.
    fn post_restart(&mut self, _ctx: &mut Context) -> Result<(), BehaviorError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::util::ActorId;

    struct Counting {
        received: u32,
        started: bool,
    }

    impl Behavior for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn receive(&mut self, _ctx: &mut Context, _msg: &Message) -> Result<(), BehaviorError> {
            self.received += 1;
            Ok(())
        }

        fn pre_start(&mut self, _ctx: &mut Context) -> Result<(), BehaviorError> {
            self.started = true;
            Ok(())
        }
    }

    #[test]
    fn test_default_hooks_are_noops() {
        let mut b = Counting {
            received: 0,
            started: false,
        };
        let mut ctx = Context::detached(ActorId::from_raw(1));

        assert!(b.post_stop(&mut ctx).is_ok());
        assert!(b.pre_restart(&mut ctx, "boom").is_ok());
        assert!(b.post_restart(&mut ctx).is_ok());
    }

    #[test]
    fn test_pre_start_override() {
        let mut b = Counting {
            received: 0,
            started: false,
        };
        let mut ctx = Context::detached(ActorId::from_raw(1));
        b.pre_start(&mut ctx).unwrap();
        assert!(b.started);
    }

    #[test]
    fn test_behavior_error_display_and_source() {
        let err = BehaviorError::new("outer")
            .with_source(std::io::Error::new(std::io::ErrorKind::Other, "inner"));

        assert_eq!(err.to_string(), "outer");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_behavior_error_from_str() {
        let err: BehaviorError = "bad state".into();
        assert_eq!(err.message(), "bad state");
        assert!(err.source().is_none());
    }
}
