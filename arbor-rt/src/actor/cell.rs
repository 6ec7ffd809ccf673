// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// Layer 3: Internal module imports
use super::behavior::{Behavior, BehaviorError};
use super::context::Context;
use super::lifecycle::ActorState;
use crate::mailbox::Mailbox;
use crate::message::Message;
use crate::system::ActorConfig;
use crate::util::{ActorId, SupervisorId};

/// Errors from processing a message on a cell.
#[derive(Error, Debug)]
pub enum ActorError {
    /// The actor is stopping or stopped and no longer accepts messages.
    #[error("actor {0} is not accepting messages")]
    NotAccepting(ActorId),

    /// The behavior's `receive` failed; funneled to the supervisor.
    #[error(transparent)]
    Behavior(#[from] BehaviorError),
}

/// Plain per-actor counters. The cell is only touched under the actor's
/// exclusive lock, so no atomics are needed here.
#[derive(Debug, Default, Clone)]
pub struct ActorStats {
    /// Messages handed to the behavior.
    pub received: u64,
    /// Messages the behavior handled successfully.
    pub processed: u64,
    /// Messages the behavior failed on.
    pub failed: u64,
    /// Last time the behavior ran.
    pub last_activity: Option<DateTime<Utc>>,
}

impl ActorStats {
    /// Serializable copy.
    pub fn snapshot(&self) -> ActorStatsSnapshot {
        ActorStatsSnapshot {
            received: self.received,
            processed: self.processed,
            failed: self.failed,
            last_activity: self.last_activity,
        }
    }
}

/// Serializable view of [`ActorStats`].
#[derive(Debug, Clone, Serialize)]
pub struct ActorStatsSnapshot {
    /// Messages handed to the behavior.
    pub received: u64,
    /// Messages the behavior handled successfully.
    pub processed: u64,
    /// Messages the behavior failed on.
    pub failed: u64,
    /// Last time the behavior ran.
    pub last_activity: Option<DateTime<Utc>>,
}

/// The arena-owned record of one actor.
///
/// The system holds cells as `Arc<parking_lot::Mutex<ActorCell>>`; all
/// state transitions and behavior execution happen under that lock.
/// Supervisor and children are back-references by id, resolved through
/// the system maps.
pub struct ActorCell {
    /// Actor id.
    pub id: ActorId,
    /// Registered unique name.
    pub name: String,
    /// Free-form actor type label.
    pub actor_type: String,
    /// Lifecycle state.
    pub state: ActorState,
    /// The actor's mailbox. Exactly one actor owns one mailbox.
    pub mailbox: Arc<Mailbox>,
    /// Supervising supervisor (back-reference, non-owning).
    pub supervisor: SupervisorId,
    /// Child actor ids.
    pub children: Vec<ActorId>,
    /// User behavior.
    pub behavior: Box<dyn Behavior>,
    /// Per-actor configuration.
    pub config: ActorConfig,
    /// Processing counters.
    pub stats: ActorStats,
    /// Context shared with behavior callbacks.
    pub context: Context,
    /// Last heartbeat, refreshed on every processed message.
    pub last_heartbeat: DateTime<Utc>,
    /// Number of supervisor-driven restarts.
    pub restart_count: u32,
    /// Creation time.
    pub create_time: DateTime<Utc>,
}

impl ActorCell {
    /// Assemble a cell. The context is bound to the cell's mailbox.
    pub fn new(
        id: ActorId,
        name: impl Into<String>,
        actor_type: impl Into<String>,
        mailbox: Arc<Mailbox>,
        supervisor: SupervisorId,
        behavior: Box<dyn Behavior>,
        config: ActorConfig,
    ) -> Self {
        let now = Utc::now();
        let context = Context::new(id, Arc::clone(&mailbox));
        Self {
            id,
            name: name.into(),
            actor_type: actor_type.into(),
            state: ActorState::Idle,
            mailbox,
            supervisor,
            children: Vec::new(),
            behavior,
            config,
            stats: ActorStats::default(),
            context,
            last_heartbeat: now,
            restart_count: 0,
            create_time: now,
        }
    }

    /// Run the behavior on one message.
    ///
    /// Rejects when stopping/stopped. Marks the message delivered, makes
    /// the sender visible on the context, refreshes the heartbeat, and
    /// restores `Idle` afterwards. Behavior errors propagate upward for
    /// the supervisor funnel; they are also recorded in the stats.
    pub fn process_message(&mut self, mut msg: Message) -> Result<(), ActorError> {
        if self.state.is_stopping_or_stopped() {
            return Err(ActorError::NotAccepting(self.id));
        }

        self.state = ActorState::Busy;
        self.context.set_sender(msg.sender);
        self.last_heartbeat = Utc::now();
        msg.delivered = true;

        let result = self.behavior.receive(&mut self.context, &msg);

        self.stats.received += 1;
        match &result {
            Ok(()) => self.stats.processed += 1,
            Err(_) => self.stats.failed += 1,
        }
        self.stats.last_activity = Some(Utc::now());

        self.context.set_sender(ActorId::SYSTEM);
        self.state = ActorState::Idle;

        result.map_err(ActorError::Behavior)
    }

    /// Run the pre-start hook.
    pub fn pre_start(&mut self) -> Result<(), BehaviorError> {
        self.behavior.pre_start(&mut self.context)
    }

    /// Transition to Stopping and run the post-stop hook. Hook errors
    /// are returned for recording but do not abort the stop. Cancels all
    /// named timers.
    pub fn begin_stop(&mut self) -> Result<(), BehaviorError> {
        self.state = ActorState::Stopping;
        self.context.cancel_all_timers();
        self.behavior.post_stop(&mut self.context)
    }

    /// Finalize the stop transition.
    pub fn finish_stop(&mut self) {
        self.state = ActorState::Stopped;
    }

    /// Run one restart cycle: Restarting state, bump the counter,
    /// pre-restart and post-restart hooks, back to Idle. The mailbox is
    /// left untouched so queued messages survive the restart.
    pub fn restart(&mut self, reason: &str) -> Result<(), BehaviorError> {
        self.state = ActorState::Restarting;
        self.restart_count += 1;
        self.last_heartbeat = Utc::now();
        self.context.cancel_all_timers();

        self.behavior.pre_restart(&mut self.context, reason)?;
        self.behavior.post_restart(&mut self.context)?;

        self.state = ActorState::Idle;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mailbox::{MailboxMode, OverflowPolicy};
    use crate::message::Payload;
    use crate::util::{MailboxId, MessageId};

    struct Recorder {
        seen: Vec<String>,
        fail_on: Option<String>,
        restarts: u32,
    }

    impl Behavior for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn receive(&mut self, _ctx: &mut Context, msg: &Message) -> Result<(), BehaviorError> {
            let text = msg.payload.as_text().unwrap_or_default().to_owned();
            if self.fail_on.as_deref() == Some(text.as_str()) {
                return Err(BehaviorError::new(format!("refused: {text}")));
            }
            self.seen.push(text);
            Ok(())
        }

        fn post_restart(&mut self, _ctx: &mut Context) -> Result<(), BehaviorError> {
            self.restarts += 1;
            Ok(())
        }
    }

    fn cell(fail_on: Option<&str>) -> ActorCell {
        let id = ActorId::from_raw(1);
        let mailbox = Arc::new(Mailbox::new(
            MailboxId::from_raw(1),
            id,
            8,
            MailboxMode::Fifo,
            OverflowPolicy::DropOldest,
        ));
        ActorCell::new(
            id,
            "recorder",
            "test",
            mailbox,
            SupervisorId::from_raw(1),
            Box::new(Recorder {
                seen: Vec::new(),
                fail_on: fail_on.map(str::to_owned),
                restarts: 0,
            }),
            ActorConfig::default(),
        )
    }

    fn msg(text: &str) -> Message {
        Message::new(
            MessageId::from_raw(1),
            1,
            ActorId::from_raw(9),
            ActorId::from_raw(1),
        )
        .with_payload(Payload::from(text))
    }

    #[test]
    fn test_process_updates_stats_and_state() {
        let mut cell = cell(None);
        cell.process_message(msg("hello")).unwrap();

        assert_eq!(cell.state, ActorState::Idle);
        assert_eq!(cell.stats.received, 1);
        assert_eq!(cell.stats.processed, 1);
        assert_eq!(cell.stats.failed, 0);
        assert!(cell.stats.last_activity.is_some());
    }

    #[test]
    fn test_process_failure_is_counted_and_propagated() {
        let mut cell = cell(Some("bad"));
        let err = cell.process_message(msg("bad")).unwrap_err();

        assert!(matches!(err, ActorError::Behavior(_)));
        assert_eq!(cell.stats.failed, 1);
        // The cell returns to Idle; supervision decides what happens next.
        assert_eq!(cell.state, ActorState::Idle);
    }

    #[test]
    fn test_rejects_when_stopping() {
        let mut cell = cell(None);
        cell.state = ActorState::Stopping;

        let err = cell.process_message(msg("x")).unwrap_err();
        assert!(matches!(err, ActorError::NotAccepting(_)));
        assert_eq!(cell.stats.received, 0);
    }

    #[test]
    fn test_restart_preserves_mailbox() {
        let mut cell = cell(None);
        cell.mailbox.try_enqueue(msg("queued")).unwrap();

        cell.restart("boom").unwrap();

        assert_eq!(cell.state, ActorState::Idle);
        assert_eq!(cell.restart_count, 1);
        assert_eq!(cell.mailbox.len(), 1);
    }

    #[test]
    fn test_stop_transitions() {
        let mut cell = cell(None);
        cell.begin_stop().unwrap();
        assert_eq!(cell.state, ActorState::Stopping);

        cell.finish_stop();
        assert_eq!(cell.state, ActorState::Stopped);
    }
}
