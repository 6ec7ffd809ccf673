// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
use super::types::{SupervisionStrategy, SupervisorConfig, SupervisorType};
use super::window::RestartWindow;
use crate::util::{ActorId, SupervisorId};

/// Action for one child in a failure plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAction {
    /// Restart the child (its restart window allowed it).
    Restart,
    /// Stop the child (its restart window is exhausted).
    Stop,
}

/// What the system should do after a child failure.
///
/// The supervisor computes the plan under its own lock; the system
/// applies it afterwards so actor locks are never taken while the
/// supervisor lock is held in the wrong order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePlan {
    /// No action; the child continues with its next message.
    Resume,

    /// Per-child actions in application order.
    Act(Vec<(ActorId, ChildAction)>),

    /// Re-dispatch the failure to the parent supervisor.
    Escalate(SupervisorId),
}

/// The arena-owned record of one supervisor.
///
/// Children are kept both as an ordered list (creation order, needed by
/// RestForOne and OneForAll) and as membership in `restart_track`.
/// Parent is a non-owning back-reference by id. The root supervisor has
/// no parent and outlives every actor.
#[derive(Debug)]
pub struct Supervisor {
    /// Supervisor id.
    pub id: SupervisorId,
    /// Supervisor name.
    pub name: String,
    /// Which children are in scope on failure.
    pub supervisor_type: SupervisorType,
    /// Configuration (strategy, restart window bounds).
    pub config: SupervisorConfig,
    /// Children in creation order.
    children: Vec<ActorId>,
    /// Per-child restart windows.
    restart_track: HashMap<ActorId, RestartWindow>,
    /// Parent supervisor (back-reference, non-owning).
    pub parent: Option<SupervisorId>,
}

impl Supervisor {
    /// Create a supervisor with no children.
    pub fn new(
        id: SupervisorId,
        name: impl Into<String>,
        supervisor_type: SupervisorType,
        config: SupervisorConfig,
        parent: Option<SupervisorId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            supervisor_type,
            config,
            children: Vec::new(),
            restart_track: HashMap::new(),
            parent,
        }
    }

    /// Children in creation order.
    pub fn children(&self) -> &[ActorId] {
        &self.children
    }

    /// Whether `child` is supervised here.
    pub fn has_child(&self, child: ActorId) -> bool {
        self.children.contains(&child)
    }

    /// Append a child. Creation order is preserved for RestForOne.
    pub fn add_child(&mut self, child: ActorId) {
        if !self.children.contains(&child) {
            self.children.push(child);
            self.restart_track.insert(child, RestartWindow::new());
        }
    }

    /// Remove a child and its restart history.
    pub fn remove_child(&mut self, child: ActorId) {
        self.children.retain(|c| *c != child);
        self.restart_track.remove(&child);
    }

    /// Compute the failure plan for `failed` at `now`.
    ///
    /// For the Restart strategy each in-scope child is checked against
    /// its own sliding window: an allowed restart is recorded
    /// immediately (the system applies the plan next), an exhausted
    /// window downgrades that child to Stop. An escalated failure for
    /// an actor this supervisor does not own is handled with OneForOne
    /// scope on that actor alone.
    pub fn plan_for_failure(&mut self, failed: ActorId, now: DateTime<Utc>) -> FailurePlan {
        match self.config.strategy {
            SupervisionStrategy::Resume => FailurePlan::Resume,
            SupervisionStrategy::Escalate => match self.parent {
                Some(parent) => FailurePlan::Escalate(parent),
                // Root has nobody to escalate to; fall back to Restart.
                None => self.restart_plan(failed, now),
            },
            SupervisionStrategy::Stop => {
                let targets = self.scope_of(failed);
                FailurePlan::Act(targets.into_iter().map(|c| (c, ChildAction::Stop)).collect())
            }
            SupervisionStrategy::Restart => self.restart_plan(failed, now),
        }
    }

    fn restart_plan(&mut self, failed: ActorId, now: DateTime<Utc>) -> FailurePlan {
        let targets = self.scope_of(failed);
        let max_retries = self.config.max_retries;
        let retry_period = self.config.retry_period;

        let mut plan = Vec::with_capacity(targets.len());
        for child in targets {
            let window = self.restart_track.entry(child).or_default();
            if window.allows(now, max_retries, retry_period) {
                window.record(now);
                plan.push((child, ChildAction::Restart));
            } else {
                plan.push((child, ChildAction::Stop));
            }
        }
        FailurePlan::Act(plan)
    }

    /// Children in scope for a failure of `failed`, in creation order.
    /// A foreign actor (escalated failure) scopes to itself.
    fn scope_of(&self, failed: ActorId) -> Vec<ActorId> {
        if !self.has_child(failed) {
            return vec![failed];
        }
        match self.supervisor_type {
            SupervisorType::OneForOne | SupervisorType::SimpleOneForOne => vec![failed],
            SupervisorType::OneForAll => self.children.clone(),
            SupervisorType::RestForOne => {
                match self.children.iter().position(|c| *c == failed) {
                    Some(idx) => self.children[idx..].to_vec(),
                    None => vec![failed],
                }
            }
        }
    }
}
