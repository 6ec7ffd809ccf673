//! The actor system: arena ownership, lifecycle, delivery, supervision
//! funnel, groups, heartbeat and GC tasks, and diagnostics snapshots.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

// Layer 3: Internal module imports
use super::config::{ActorConfig, MailboxType, SystemConfig, DEFAULT_MESSAGE_TTL};
use super::errors::SystemError;
use super::groups::{Group, GroupConfig};
use super::remote::Remote;
use super::stats::{SystemStats, SystemStatisticsSnapshot};
use crate::actor::{ActorCell, ActorError, ActorState, ActorStatsSnapshot, Behavior};
use crate::dispatch::{DeadLetterStore, Dispatcher, Interceptor, Route, Transformer};
use crate::dispatch::DEFAULT_DEAD_LETTER_CAPACITY;
use crate::io::{
    FsWatcher, IoEventKind, IoEventRecord, IoIntegration, IoLogQuery, IoWatchOptions, Poller,
};
use crate::mailbox::{Mailbox, MailboxMode, MailboxStatsSnapshot};
use crate::message::{Message, Payload, Priority, SYSTEM_TERMINATED};
use crate::registry::Registry;
use crate::scheduler::{ProcessFn, Scheduler};
use crate::supervisor::{
    ChildAction, FailurePlan, Supervisor, SupervisionStrategy, SupervisorConfig, SupervisorType,
};
use crate::trace::{
    detect_watch_cycles, ActorGraph, EdgeKind, GraphEdge, GraphNode, TraceEvent, Tracer,
    WatchCycleReport,
};
use crate::util::{ActorId, GroupId, IdGenerator, MessageId, SupervisorId};

/// Lifecycle of the system itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SystemState {
    /// Constructed, background tasks not yet running.
    Created,
    /// Accepting sends; workers and monitors running.
    Running,
    /// Stopped; terminal.
    Stopped,
}

/// Serializable actor summary for snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct ActorSummary {
    /// Actor id.
    pub id: ActorId,
    /// Registered name.
    pub name: String,
    /// Actor type label.
    pub actor_type: String,
    /// Lifecycle state.
    pub state: ActorState,
    /// Mailbox length.
    pub mailbox_len: usize,
    /// Supervising supervisor.
    pub supervisor: SupervisorId,
    /// Supervised restarts so far.
    pub restart_count: u32,
    /// Last heartbeat.
    pub last_heartbeat: DateTime<Utc>,
    /// Creation time.
    pub create_time: DateTime<Utc>,
    /// Processing counters.
    pub stats: ActorStatsSnapshot,
}

/// Serializable supervisor summary for snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorSummary {
    /// Supervisor id.
    pub id: SupervisorId,
    /// Supervisor name.
    pub name: String,
    /// Failure scope.
    pub supervisor_type: SupervisorType,
    /// Failure strategy.
    pub strategy: SupervisionStrategy,
    /// Children in creation order.
    pub children: Vec<ActorId>,
    /// Parent supervisor.
    pub parent: Option<SupervisorId>,
}

/// Full system snapshot served by the diagnostics plane.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    /// Snapshot time.
    pub time: DateTime<Utc>,
    /// System lifecycle state.
    pub state: SystemState,
    /// All live actors.
    pub actors: Vec<ActorSummary>,
    /// All supervisors.
    pub supervisors: Vec<SupervisorSummary>,
    /// All groups.
    pub groups: Vec<Group>,
    /// Per-worker scheduler queues.
    #[serde(rename = "schedulerQueue")]
    pub scheduler_queue: Vec<crate::scheduler::WorkerSnapshot>,
    /// System counters.
    pub statistics: SystemStatisticsSnapshot,
}

pub(crate) struct SystemInner {
    pub(crate) config: SystemConfig,
    ids: Arc<IdGenerator>,
    state: RwLock<SystemState>,
    actors: RwLock<HashMap<ActorId, Arc<Mutex<ActorCell>>>>,
    supervisors: RwLock<HashMap<SupervisorId, Arc<Mutex<Supervisor>>>>,
    groups: RwLock<HashMap<GroupId, Group>>,
    mailboxes: Arc<DashMap<ActorId, Arc<Mailbox>>>,
    affinity: Arc<DashMap<ActorId, u64>>,
    registry: Registry,
    dispatcher: Dispatcher,
    scheduler: Arc<Scheduler>,
    dead_letters: Arc<DeadLetterStore>,
    tracer: RwLock<Option<Arc<Tracer>>>,
    io: Arc<IoIntegration>,
    remote: RwLock<Option<Arc<dyn Remote>>>,
    cancel: CancellationToken,
    root_supervisor: SupervisorId,
    stats: SystemStats,
    background: Mutex<Vec<JoinHandle<()>>>,
}

/// The actor system. Cheap to clone; all clones share one runtime.
///
/// # Example
/// ```rust,no_run
/// use arbor_rt::prelude::*;
///
/// # struct Echo;
/// # impl Behavior for Echo {
/// #     fn name(&self) -> &str { "echo" }
/// #     fn receive(&mut self, _ctx: &mut Context, _msg: &Message) -> Result<(), BehaviorError> {
/// #         Ok(())
/// #     }
/// # }
/// #[tokio::main]
/// async fn main() -> Result<(), SystemError> {
///     let system = ActorSystem::new(SystemConfig::default())?;
///     system.start()?;
///
///     let echo = system.create_actor("echo", "worker", Box::new(Echo), ActorConfig::default())?;
///     system.send(ActorId::SYSTEM, echo, 1, Payload::from("hello")).await?;
///
///     system.stop().await?;
///     Ok(())
/// }
/// ```
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

impl Clone for ActorSystem {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ActorSystem {
    /// Build a system from configuration. The root supervisor
    /// (OneForOne, Restart) is created immediately; background tasks
    /// wait for [`ActorSystem::start`].
    pub fn new(config: SystemConfig) -> Result<Self, SystemError> {
        config.validate().map_err(SystemError::InvalidArgument)?;

        let ids = Arc::new(IdGenerator::new());
        let mailboxes: Arc<DashMap<ActorId, Arc<Mailbox>>> = Arc::new(DashMap::new());
        let affinity: Arc<DashMap<ActorId, u64>> = Arc::new(DashMap::new());
        let dead_letters = Arc::new(DeadLetterStore::new(
            DEFAULT_DEAD_LETTER_CAPACITY,
            config.enable_dead_letters,
        ));
        let dispatcher = Dispatcher::new(Arc::clone(&mailboxes), Arc::clone(&dead_letters));
        let scheduler = Arc::new(Scheduler::new(config.scheduler.clone()));
        let cancel = CancellationToken::new();
        let io = Arc::new(IoIntegration::new(
            Arc::clone(&mailboxes),
            Arc::clone(&scheduler),
            Arc::clone(&ids),
            cancel.child_token(),
            config.default_io_watch_options.clone(),
        ));

        let root_id = ids.next_supervisor();
        let root = Supervisor::new(
            root_id,
            "root",
            SupervisorType::OneForOne,
            SupervisorConfig::default(),
            None,
        );
        let mut supervisors = HashMap::new();
        supervisors.insert(root_id, Arc::new(Mutex::new(root)));

        let tracer = if config.enable_tracing {
            Some(Arc::new(Tracer::new(config.trace_buffer)))
        } else {
            None
        };
        if let Some(t) = &tracer {
            dispatcher.set_tracer(Some(Arc::clone(t)));
        }

        Ok(Self {
            inner: Arc::new(SystemInner {
                config,
                ids,
                state: RwLock::new(SystemState::Created),
                actors: RwLock::new(HashMap::new()),
                supervisors: RwLock::new(supervisors),
                groups: RwLock::new(HashMap::new()),
                mailboxes,
                affinity,
                registry: Registry::new(),
                dispatcher,
                scheduler,
                dead_letters,
                tracer: RwLock::new(tracer),
                io,
                remote: RwLock::new(None),
                cancel,
                root_supervisor: root_id,
                stats: SystemStats::new(),
                background: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SystemState {
        *self.inner.state.read()
    }

    /// The root supervisor id.
    pub fn root_supervisor(&self) -> SupervisorId {
        self.inner.root_supervisor
    }

    /// System configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    /// Start workers, heartbeat monitor, and GC task.
    pub fn start(&self) -> Result<(), SystemError> {
        {
            let mut state = self.inner.state.write();
            match *state {
                SystemState::Created => *state = SystemState::Running,
                SystemState::Running => {
                    return Err(SystemError::InvalidArgument("already running".into()))
                }
                SystemState::Stopped => return Err(SystemError::NotRunning),
            }
        }

        let weak = Arc::downgrade(&self.inner);
        let process: ProcessFn = Arc::new(move |actor| {
            if let Some(inner) = weak.upgrade() {
                inner.process_one(actor);
            }
        });
        self.inner
            .scheduler
            .start(self.inner.cancel.child_token(), process);

        let mut background = self.inner.background.lock();
        background.push(tokio::spawn(SystemInner::heartbeat_loop(
            Arc::downgrade(&self.inner),
            self.inner.cancel.child_token(),
            self.inner.config.heartbeat_interval,
        )));
        background.push(tokio::spawn(SystemInner::gc_loop(
            Arc::downgrade(&self.inner),
            self.inner.cancel.child_token(),
            self.inner.config.gc_interval,
        )));
        Ok(())
    }

    /// Stop all actors, the scheduler, and every background task.
    ///
    /// Actors receive their post-stop hooks and watchers their
    /// termination notices within `shutdown_timeout`; past the budget
    /// the error is reported and remaining tasks are cancelled anyway.
    pub async fn stop(&self) -> Result<(), SystemError> {
        {
            let mut state = self.inner.state.write();
            if *state != SystemState::Running {
                return Err(SystemError::NotRunning);
            }
            *state = SystemState::Stopped;
        }

        let budget = self.inner.config.shutdown_timeout;
        let result = tokio::time::timeout(budget, async {
            let ids: Vec<ActorId> = self.inner.actors.read().keys().copied().collect();
            for id in ids {
                let _ = self.inner.stop_actor_internal(id).await;
            }
        })
        .await;

        self.inner.scheduler.stop();
        self.inner.cancel.cancel();
        for handle in self.inner.background.lock().drain(..) {
            handle.abort();
        }

        match result {
            Ok(()) => Ok(()),
            Err(_) => Err(SystemError::ShutdownTimeout(budget)),
        }
    }

    // ------------------------------------------------------------------
    // Actor lifecycle
    // ------------------------------------------------------------------

    /// Create an actor under the root supervisor.
    pub fn create_actor(
        &self,
        name: impl Into<String>,
        actor_type: impl Into<String>,
        behavior: Box<dyn Behavior>,
        config: ActorConfig,
    ) -> Result<ActorId, SystemError> {
        self.create_actor_under(self.inner.root_supervisor, name, actor_type, behavior, config)
    }

    /// Create an actor under an explicit supervisor.
    pub fn create_actor_under(
        &self,
        supervisor: SupervisorId,
        name: impl Into<String>,
        actor_type: impl Into<String>,
        behavior: Box<dyn Behavior>,
        config: ActorConfig,
    ) -> Result<ActorId, SystemError> {
        if self.state() == SystemState::Stopped {
            return Err(SystemError::NotRunning);
        }
        config.validate().map_err(SystemError::InvalidArgument)?;

        let sup_arc = self
            .inner
            .supervisors
            .read()
            .get(&supervisor)
            .cloned()
            .ok_or(SystemError::SupervisorNotFound(supervisor))?;

        let max = self.inner.config.max_actors;
        if max > 0 && self.inner.actors.read().len() >= max {
            return Err(SystemError::ActorLimitExceeded {
                current: self.inner.actors.read().len(),
                max,
            });
        }

        let name = name.into();
        let id = self.inner.ids.next_actor();
        self.inner.registry.register(name.clone(), id)?;

        let (mode, capacity) = match config.mailbox_type {
            MailboxType::Standard => (MailboxMode::Fifo, self.inner.config.default_mailbox_size),
            MailboxType::Bounded | MailboxType::Stashing => {
                (MailboxMode::Fifo, config.mailbox_capacity)
            }
            MailboxType::Priority => (MailboxMode::Priority, config.mailbox_capacity),
            MailboxType::Unbounded => (MailboxMode::Fifo, usize::MAX),
        };
        let mailbox = Arc::new(
            Mailbox::new(
                self.inner.ids.next_mailbox(),
                id,
                capacity,
                mode,
                config.overflow_policy,
            )
            .with_back_pressure_wait(config.back_pressure_wait),
        );

        let affinity_mask = config.cpu_affinity_mask;
        let stashing = config.enable_stashing || config.mailbox_type == MailboxType::Stashing;
        let mut cell = ActorCell::new(
            id,
            name,
            actor_type,
            Arc::clone(&mailbox),
            supervisor,
            behavior,
            config,
        );
        if !stashing {
            cell.context.set_stash_limit(0);
        }

        if let Err(err) = cell.pre_start() {
            self.inner.registry.unregister(id);
            return Err(SystemError::SpawnFailed(err.to_string()));
        }

        self.inner.mailboxes.insert(id, mailbox);
        self.inner.affinity.insert(id, affinity_mask);
        self.inner
            .actors
            .write()
            .insert(id, Arc::new(Mutex::new(cell)));
        sup_arc.lock().add_child(id);
        self.inner.stats.record_created();

        self.inner.scheduler.schedule(id, affinity_mask);
        Ok(id)
    }

    /// Create a supervisor; `parent` defaults to none (a peer of root).
    pub fn create_supervisor(
        &self,
        name: impl Into<String>,
        supervisor_type: SupervisorType,
        config: SupervisorConfig,
        parent: Option<SupervisorId>,
    ) -> Result<SupervisorId, SystemError> {
        if self.state() == SystemState::Stopped {
            return Err(SystemError::NotRunning);
        }
        if let Some(parent_id) = parent {
            if !self.inner.supervisors.read().contains_key(&parent_id) {
                return Err(SystemError::SupervisorNotFound(parent_id));
            }
        }

        let id = self.inner.ids.next_supervisor();
        let supervisor = Supervisor::new(id, name, supervisor_type, config, parent);
        self.inner
            .supervisors
            .write()
            .insert(id, Arc::new(Mutex::new(supervisor)));
        Ok(id)
    }

    /// Stop an actor: post-stop hook, termination notices to watchers,
    /// then reclamation.
    pub async fn stop_actor(&self, id: ActorId) -> Result<(), SystemError> {
        self.inner.stop_actor_internal(id).await
    }

    // ------------------------------------------------------------------
    // Delivery
    // ------------------------------------------------------------------

    /// Send a message with Normal priority and the default TTL.
    pub async fn send(
        &self,
        sender: ActorId,
        receiver: ActorId,
        message_type: u32,
        payload: Payload,
    ) -> Result<MessageId, SystemError> {
        self.send_with_priority(sender, receiver, message_type, payload, Priority::Normal)
            .await
    }

    /// Send a message with an explicit priority.
    pub async fn send_with_priority(
        &self,
        sender: ActorId,
        receiver: ActorId,
        message_type: u32,
        payload: Payload,
        priority: Priority,
    ) -> Result<MessageId, SystemError> {
        self.inner.ensure_running()?;
        let msg = Message::new(self.inner.ids.next_message(), message_type, sender, receiver)
            .with_payload(payload)
            .with_priority(priority)
            .with_ttl(DEFAULT_MESSAGE_TTL);
        let id = msg.id;
        self.inner.deliver(msg).await?;
        Ok(id)
    }

    /// Send with an explicit correlation id, grouping the delivery with
    /// related trace events.
    pub async fn send_correlated(
        &self,
        sender: ActorId,
        receiver: ActorId,
        message_type: u32,
        payload: Payload,
        correlation_id: &str,
    ) -> Result<MessageId, SystemError> {
        self.inner.ensure_running()?;
        let msg = Message::new(self.inner.ids.next_message(), message_type, sender, receiver)
            .with_payload(payload)
            .with_correlation_id(correlation_id)
            .with_ttl(DEFAULT_MESSAGE_TTL);
        let id = msg.id;
        self.inner.deliver(msg).await?;
        Ok(id)
    }

    /// Dequeue and process one message for `actor` on the caller's
    /// thread, exactly as a worker would. Useful for deterministic
    /// tests and manual dispatch; a no-op when the mailbox is empty or
    /// the actor does not exist.
    pub fn process_now(&self, actor: ActorId) {
        self.inner.process_one(actor);
    }

    /// Send to a possibly-qualified name. `node:name` delegates to the
    /// attached remote transport; everything else resolves locally.
    pub async fn send_to_name(
        &self,
        sender: ActorId,
        qualified_name: &str,
        message_type: u32,
        payload: Payload,
    ) -> Result<(), SystemError> {
        self.inner.ensure_running()?;

        // The first ':' is the node delimiter; IPv6 literal nodes are
        // not supported by this wire contract.
        if let Some((node, name)) = qualified_name.split_once(':') {
            if let Some(remote) = self.inner.remote.read().clone() {
                return remote
                    .forward(node, name, sender, message_type, payload)
                    .await;
            }
        }

        let receiver = self
            .inner
            .registry
            .lookup(qualified_name)
            .ok_or_else(|| SystemError::NameNotFound(qualified_name.to_owned()))?;
        self.send(sender, receiver, message_type, payload).await?;
        Ok(())
    }

    /// Attach a remote transport for `node:name` sends.
    pub fn set_remote(&self, remote: Arc<dyn Remote>) {
        *self.inner.remote.write() = Some(remote);
    }

    /// Append a routing rule: messages of `message_type` go to `target`.
    pub fn add_route(&self, message_type: u32, target: ActorId) {
        self.inner.dispatcher.add_route(message_type, Route { target });
    }

    /// Append an interceptor to the dispatch pipeline.
    pub fn add_interceptor(&self, interceptor: impl Interceptor + 'static) {
        self.inner.dispatcher.add_interceptor(interceptor);
    }

    /// Append a transformer to the dispatch pipeline.
    pub fn add_transformer(&self, transformer: impl Transformer + 'static) {
        self.inner.dispatcher.add_transformer(transformer);
    }

    // ------------------------------------------------------------------
    // Watch API
    // ------------------------------------------------------------------

    /// Subscribe `watcher` to `target`'s termination notice.
    pub fn watch(&self, watcher: ActorId, target: ActorId) -> Result<(), SystemError> {
        let watcher_arc = self.inner.cell_of(watcher)?;
        let target_arc = self.inner.cell_of(target)?;

        {
            let mut cell = watcher_arc.lock();
            if !cell.config.enable_watching {
                return Err(SystemError::InvalidArgument(format!(
                    "watching disabled for actor {watcher}"
                )));
            }
            cell.context.add_watched(target);
        }
        target_arc.lock().context.add_watcher(watcher);
        Ok(())
    }

    /// Reverse a watch subscription.
    pub fn unwatch(&self, watcher: ActorId, target: ActorId) -> Result<(), SystemError> {
        let watcher_arc = self.inner.cell_of(watcher)?;
        let target_arc = self.inner.cell_of(target)?;

        watcher_arc.lock().context.remove_watched(target);
        target_arc.lock().context.remove_watcher(watcher);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Create a named group.
    pub fn create_group(
        &self,
        name: impl Into<String>,
        group_type: impl Into<String>,
        config: GroupConfig,
    ) -> Result<GroupId, SystemError> {
        let id = self.inner.ids.next_group();
        let name = name.into();
        self.inner.registry.register_group(name.clone(), id)?;
        self.inner
            .groups
            .write()
            .insert(id, Group::new(id, name, group_type, config));
        Ok(id)
    }

    /// Add an actor to a group.
    pub fn add_to_group(&self, group: GroupId, actor: ActorId) -> Result<(), SystemError> {
        self.inner.cell_of(actor)?;
        let mut groups = self.inner.groups.write();
        let entry = groups
            .get_mut(&group)
            .ok_or(SystemError::GroupNotFound(group))?;
        if entry.contains(actor) {
            return Ok(());
        }
        if !entry.add_member(actor) {
            return Err(SystemError::InvalidArgument(format!(
                "group {group} is full"
            )));
        }
        Ok(())
    }

    /// Designate a group leader; the leader must be a member.
    pub fn set_group_leader(&self, group: GroupId, actor: ActorId) -> Result<(), SystemError> {
        let mut groups = self.inner.groups.write();
        let entry = groups
            .get_mut(&group)
            .ok_or(SystemError::GroupNotFound(group))?;
        if !entry.contains(actor) {
            return Err(SystemError::ActorNotFound(actor));
        }
        entry.leader = Some(actor);
        Ok(())
    }

    /// Send to every member of a group. At-least-once, not atomic:
    /// delivery stops at the first error, so earlier members may have
    /// received the message while later ones have not.
    pub async fn broadcast(
        &self,
        group: GroupId,
        message_type: u32,
        payload: Payload,
    ) -> Result<usize, SystemError> {
        self.inner.ensure_running()?;
        let members = {
            let groups = self.inner.groups.read();
            groups
                .get(&group)
                .ok_or(SystemError::GroupNotFound(group))?
                .members
                .clone()
        };

        let mut delivered = 0;
        for member in members {
            self.send(ActorId::SYSTEM, member, message_type, payload.clone())
                .await?;
            delivered += 1;
        }
        Ok(delivered)
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Arm a named timer for `owner`: after `delay`, the message is
    /// delivered to the owner through the normal send path. Re-arming a
    /// name replaces the previous timer.
    pub fn schedule_once(
        &self,
        owner: ActorId,
        timer_name: impl Into<String>,
        delay: Duration,
        message_type: u32,
        payload: Payload,
    ) -> Result<(), SystemError> {
        let cell_arc = self.inner.cell_of(owner)?;
        let weak = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.child_token();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let Some(inner) = weak.upgrade() else { return };
            let msg = Message::new(inner.ids.next_message(), message_type, owner, owner)
                .with_payload(payload)
                .with_priority(Priority::Normal);
            if let Err(err) = inner.deliver(msg).await {
                debug!(owner = %owner, error = %err, "timer delivery failed");
            }
        });

        cell_arc.lock().context.register_timer(timer_name, handle);
        Ok(())
    }

    /// Cancel a named timer. Returns whether a timer was armed.
    pub fn cancel_timer(&self, owner: ActorId, timer_name: &str) -> Result<bool, SystemError> {
        let cell_arc = self.inner.cell_of(owner)?;
        let cancelled = cell_arc.lock().context.cancel_timer(timer_name);
        Ok(cancelled)
    }

    // ------------------------------------------------------------------
    // I/O integration
    // ------------------------------------------------------------------

    /// Attach the external readiness poller.
    pub fn attach_poller(&self, poller: Arc<dyn Poller>) {
        self.inner.io.attach_poller(poller);
    }

    /// Bind a connection's readiness events to an actor.
    pub fn watch_connection(
        &self,
        conn: u64,
        kinds: &[IoEventKind],
        target: ActorId,
        opts: Option<IoWatchOptions>,
    ) -> Result<(), SystemError> {
        self.inner.cell_of(target)?;
        self.inner.io.watch_connection(conn, kinds, target, opts)?;
        Ok(())
    }

    /// Remove a connection binding.
    pub fn unwatch_connection(&self, conn: u64) -> Result<(), SystemError> {
        self.inner.io.unwatch_connection(conn)?;
        Ok(())
    }

    /// Bridge filesystem events for `path` to an actor.
    pub fn watch_path(
        &self,
        watcher: &Arc<dyn FsWatcher>,
        path: &str,
        target: ActorId,
    ) -> Result<(), SystemError> {
        self.inner.cell_of(target)?;
        self.inner.io.watch_path(watcher, path, target)?;
        Ok(())
    }

    /// Windowed I/O event records for diagnostics.
    pub fn io_events(&self, window: IoLogQuery) -> Vec<IoEventRecord> {
        self.inner.io.events(window)
    }

    // ------------------------------------------------------------------
    // Tracing and inspection
    // ------------------------------------------------------------------

    /// Install a tracer with the given per-actor ring size.
    pub fn enable_tracing(&self, buffer_per_actor: usize) {
        let tracer = Arc::new(Tracer::new(buffer_per_actor));
        self.inner.dispatcher.set_tracer(Some(Arc::clone(&tracer)));
        *self.inner.tracer.write() = Some(tracer);
    }

    /// Remove the tracer.
    pub fn disable_tracing(&self) {
        self.inner.dispatcher.set_tracer(None);
        *self.inner.tracer.write() = None;
    }

    /// Newest `n` trace events involving `actor`, chronological.
    pub fn recent_messages(&self, actor: ActorId, n: usize) -> Vec<TraceEvent> {
        match self.inner.tracer.read().as_ref() {
            Some(tracer) => tracer.recent(actor, n),
            None => Vec::new(),
        }
    }

    /// Newest `n` trace events for a correlation id, chronological.
    pub fn correlation_events(&self, correlation_id: &str, n: usize) -> Vec<TraceEvent> {
        match self.inner.tracer.read().as_ref() {
            Some(tracer) => tracer.by_correlation(correlation_id, n),
            None => Vec::new(),
        }
    }

    /// Build the actor relationship graph.
    pub fn build_actor_graph(&self) -> ActorGraph {
        let mut graph = ActorGraph::new();

        let groups: Vec<Group> = self.inner.groups.read().values().cloned().collect();

        {
            let actors = self.inner.actors.read();
            for (id, cell_arc) in actors.iter() {
                let cell = cell_arc.lock();
                let group_ids: Vec<GroupId> = groups
                    .iter()
                    .filter(|g| g.contains(*id))
                    .map(|g| g.id)
                    .collect();

                graph.nodes.push(GraphNode {
                    id: *id,
                    name: cell.name.clone(),
                    state: cell.state,
                    mailbox_len: cell.mailbox.len(),
                    supervisor: cell.supervisor,
                    groups: group_ids,
                    stats: cell.stats.snapshot(),
                });

                for target in cell.context.watched() {
                    graph.edges.push(GraphEdge {
                        kind: EdgeKind::Watching,
                        from: id.as_u64(),
                        to: target.as_u64(),
                    });
                }
                for watcher in cell.context.watchers() {
                    graph.edges.push(GraphEdge {
                        kind: EdgeKind::Watched,
                        from: id.as_u64(),
                        to: watcher.as_u64(),
                    });
                }
            }
        }

        {
            let supervisors = self.inner.supervisors.read();
            for (sup_id, sup_arc) in supervisors.iter() {
                let sup = sup_arc.lock();
                for child in sup.children() {
                    graph.edges.push(GraphEdge {
                        kind: EdgeKind::Supervises,
                        from: sup_id.as_u64(),
                        to: child.as_u64(),
                    });
                }
            }
        }

        for group in &groups {
            for member in &group.members {
                graph.edges.push(GraphEdge {
                    kind: EdgeKind::GroupMember,
                    from: group.id.as_u64(),
                    to: member.as_u64(),
                });
            }
        }

        graph
    }

    /// Detect watch cycles via strongly connected components.
    pub fn detect_potential_deadlocks(&self) -> Vec<WatchCycleReport> {
        let (nodes, edges) = {
            let actors = self.inner.actors.read();
            let mut nodes = Vec::with_capacity(actors.len());
            let mut edges = Vec::new();
            for (id, cell_arc) in actors.iter() {
                let cell = cell_arc.lock();
                nodes.push((*id, cell.name.clone(), cell.state));
                for target in cell.context.watched() {
                    edges.push((*id, *target));
                }
            }
            (nodes, edges)
        };
        detect_watch_cycles(&nodes, &edges)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Resolve a registered name.
    pub fn lookup(&self, name: &str) -> Option<ActorId> {
        self.inner.registry.lookup(name)
    }

    /// Mailbox length for an actor.
    pub fn mailbox_length(&self, actor: ActorId) -> Result<usize, SystemError> {
        self.inner
            .mailboxes
            .get(&actor)
            .map(|mb| mb.len())
            .ok_or(SystemError::ActorNotFound(actor))
    }

    /// Mailbox statistics for an actor.
    pub fn mailbox_stats(&self, actor: ActorId) -> Result<MailboxStatsSnapshot, SystemError> {
        self.inner
            .mailboxes
            .get(&actor)
            .map(|mb| mb.stats())
            .ok_or(SystemError::ActorNotFound(actor))
    }

    /// Number of live actors.
    pub fn actor_count(&self) -> usize {
        self.inner.actors.read().len()
    }

    /// Lifetime dead-letter count.
    pub fn dead_letter_count(&self) -> u64 {
        self.inner.dead_letters.total()
    }

    /// System counters.
    pub fn statistics(&self) -> SystemStatisticsSnapshot {
        SystemStatisticsSnapshot {
            total_created: self.inner.stats.total_created(),
            total_stopped: self.inner.stats.total_stopped(),
            active_actors: self.inner.stats.active_actors(),
            total_restarts: self.inner.stats.total_restarts(),
            total_failures: self.inner.stats.total_failures(),
            total_messages: self.inner.dispatcher.total_messages(),
            dead_letters: self.inner.dead_letters.total(),
            registered_names: self.inner.registry.len(),
            scheduler: self.inner.scheduler.snapshot(),
        }
    }

    /// Full snapshot for the diagnostics plane.
    pub fn snapshot(&self) -> SystemSnapshot {
        let actors: Vec<ActorSummary> = {
            let map = self.inner.actors.read();
            map.values()
                .map(|cell_arc| {
                    let cell = cell_arc.lock();
                    ActorSummary {
                        id: cell.id,
                        name: cell.name.clone(),
                        actor_type: cell.actor_type.clone(),
                        state: cell.state,
                        mailbox_len: cell.mailbox.len(),
                        supervisor: cell.supervisor,
                        restart_count: cell.restart_count,
                        last_heartbeat: cell.last_heartbeat,
                        create_time: cell.create_time,
                        stats: cell.stats.snapshot(),
                    }
                })
                .collect()
        };

        let supervisors: Vec<SupervisorSummary> = {
            let map = self.inner.supervisors.read();
            map.values()
                .map(|sup_arc| {
                    let sup = sup_arc.lock();
                    SupervisorSummary {
                        id: sup.id,
                        name: sup.name.clone(),
                        supervisor_type: sup.supervisor_type,
                        strategy: sup.config.strategy,
                        children: sup.children().to_vec(),
                        parent: sup.parent,
                    }
                })
                .collect()
        };

        let groups: Vec<Group> = self.inner.groups.read().values().cloned().collect();

        SystemSnapshot {
            time: Utc::now(),
            state: self.state(),
            actors,
            supervisors,
            groups,
            scheduler_queue: self.inner.scheduler.snapshot(),
            statistics: self.statistics(),
        }
    }
}

impl SystemInner {
    fn ensure_running(&self) -> Result<(), SystemError> {
        if *self.state.read() != SystemState::Running {
            return Err(SystemError::NotRunning);
        }
        Ok(())
    }

    fn cell_of(&self, id: ActorId) -> Result<Arc<Mutex<ActorCell>>, SystemError> {
        self.actors
            .read()
            .get(&id)
            .cloned()
            .ok_or(SystemError::ActorNotFound(id))
    }

    /// Deliver through the dispatch pipeline; used by every send path,
    /// including termination notices during stop.
    async fn deliver(&self, msg: Message) -> Result<(), SystemError> {
        let affinity = Arc::clone(&self.affinity);
        self.dispatcher
            .deliver(msg, &self.scheduler, move |id| {
                affinity.get(&id).map(|entry| *entry).unwrap_or(0)
            })
            .await?;
        Ok(())
    }

    /// Scheduler process callback: dequeue one message and run the
    /// behavior. Unknown ids are a no-op. Behavior failures are funneled
    /// to the supervisor asynchronously, with the actor lock released.
    fn process_one(self: &Arc<Self>, actor: ActorId) {
        let Ok(cell_arc) = self.cell_of(actor) else {
            return;
        };

        let (mailbox, affinity_mask, failure) = {
            let mut cell = cell_arc.lock();
            let mailbox = Arc::clone(&cell.mailbox);
            let mask = cell.config.cpu_affinity_mask;

            let Some(msg) = mailbox.dequeue() else {
                return;
            };
            // Expired messages are dropped at dequeue time.
            if msg.is_expired() {
                debug!(actor = %actor, msg = %msg.id, "dropping expired message");
                (mailbox, mask, None)
            } else {
                match cell.process_message(msg) {
                    Ok(()) => (mailbox, mask, None),
                    Err(ActorError::NotAccepting(_)) => (mailbox, mask, None),
                    Err(ActorError::Behavior(err)) => (mailbox, mask, Some(err.to_string())),
                }
            }
        };

        if let Some(reason) = failure {
            self.stats.record_failure();
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.handle_failure(actor, reason).await;
            });
        }

        // Dequeue-driven rescheduling: keep the actor on a worker while
        // its mailbox has messages.
        if !mailbox.is_empty() {
            self.scheduler.schedule(actor, affinity_mask);
        }
    }

    /// Funnel a child failure into its supervisor, following Escalate
    /// edges upward.
    async fn handle_failure(self: Arc<Self>, child: ActorId, reason: String) {
        let Ok(cell_arc) = self.cell_of(child) else {
            return;
        };
        let mut current = cell_arc.lock().supervisor;

        loop {
            let Some(sup_arc) = self.supervisors.read().get(&current).cloned() else {
                warn!(child = %child, supervisor = %current, "failure with unknown supervisor");
                return;
            };
            let plan = sup_arc.lock().plan_for_failure(child, Utc::now());

            match plan {
                FailurePlan::Resume => return,
                FailurePlan::Escalate(parent) => {
                    debug!(child = %child, from = %current, to = %parent, "escalating failure");
                    current = parent;
                }
                FailurePlan::Act(actions) => {
                    for (target, action) in actions {
                        match action {
                            ChildAction::Restart => self.restart_actor(target, &reason).await,
                            ChildAction::Stop => {
                                if let Err(err) = self.stop_actor_internal(target).await {
                                    debug!(actor = %target, error = %err, "stop during supervision failed");
                                }
                            }
                        }
                    }
                    return;
                }
            }
        }
    }

    /// Restart a child, honoring its configured restart delay. Delayed
    /// restarts run asynchronously; the mailbox keeps accumulating in
    /// the meantime and is preserved across the restart.
    async fn restart_actor(self: &Arc<Self>, target: ActorId, reason: &str) {
        let Ok(cell_arc) = self.cell_of(target) else {
            return;
        };
        let delay = {
            let mut cell = cell_arc.lock();
            if cell.state.is_stopping_or_stopped() {
                return;
            }
            cell.state = ActorState::Restarting;
            cell.config.restart_delay
        };

        if delay.is_zero() {
            self.do_restart(target, reason);
            return;
        }

        let weak = Arc::downgrade(self);
        let cancel = self.cancel.child_token();
        let reason = reason.to_owned();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if let Some(inner) = weak.upgrade() {
                inner.do_restart(target, &reason);
            }
        });
    }

    fn do_restart(&self, target: ActorId, reason: &str) {
        let Ok(cell_arc) = self.cell_of(target) else {
            return;
        };
        let (result, affinity_mask, has_backlog) = {
            let mut cell = cell_arc.lock();
            let result = cell.restart(reason);
            (
                result,
                cell.config.cpu_affinity_mask,
                !cell.mailbox.is_empty(),
            )
        };

        match result {
            Ok(()) => {
                self.stats.record_restart();
                if has_backlog {
                    self.scheduler.schedule(target, affinity_mask);
                }
            }
            Err(err) => {
                error!(actor = %target, error = %err, "restart hook failed");
                if let Ok(cell_arc) = self.cell_of(target) {
                    cell_arc.lock().state = ActorState::Failed;
                }
            }
        }
    }

    /// Stop one actor. Idempotent: stopping a Stopping/Stopped actor is
    /// a no-op. Watcher notices go through the normal send path after
    /// the actor lock is released; the record is reclaimed last.
    async fn stop_actor_internal(self: &Arc<Self>, id: ActorId) -> Result<(), SystemError> {
        let cell_arc = self.cell_of(id)?;

        let (watchers, watched, supervisor) = {
            let mut cell = cell_arc.lock();
            if cell.state.is_stopping_or_stopped() {
                return Ok(());
            }
            if let Err(err) = cell.begin_stop() {
                warn!(actor = %id, error = %err, "post-stop hook failed");
            }
            cell.finish_stop();
            (
                cell.context.watchers().iter().copied().collect::<Vec<_>>(),
                cell.context.watched().iter().copied().collect::<Vec<_>>(),
                cell.supervisor,
            )
        };

        for watcher in &watchers {
            let msg = Message::new(self.ids.next_message(), SYSTEM_TERMINATED, id, *watcher)
                .with_payload(Payload::Terminated(id))
                .with_priority(Priority::System);
            if let Err(err) = self.deliver(msg).await {
                debug!(watcher = %watcher, error = %err, "terminated notice undeliverable");
            }
        }

        // Clean up watch bookkeeping on both sides.
        for target in watched {
            if let Ok(other) = self.cell_of(target) {
                other.lock().context.remove_watcher(id);
            }
        }
        for watcher in &watchers {
            if let Ok(other) = self.cell_of(*watcher) {
                other.lock().context.remove_watched(id);
            }
        }

        if let Some(sup_arc) = self.supervisors.read().get(&supervisor).cloned() {
            sup_arc.lock().remove_child(id);
        }
        if let Some(tracer) = self.tracer.read().as_ref() {
            tracer.forget_actor(id);
        }
        self.registry.unregister(id);
        self.mailboxes.remove(&id);
        self.affinity.remove(&id);
        self.actors.write().remove(&id);
        self.stats.record_stopped();
        Ok(())
    }

    /// Heartbeat monitor: actors silent for three intervals are treated
    /// as failed with reason "heartbeat timeout".
    async fn heartbeat_loop(
        weak: std::sync::Weak<SystemInner>,
        cancel: CancellationToken,
        interval: Duration,
    ) {
        let stale_after = match chrono::Duration::from_std(interval * 3) {
            Ok(d) => d,
            Err(_) => return,
        };
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            let Some(inner) = weak.upgrade() else { return };

            let cutoff = Utc::now() - stale_after;
            let stale: Vec<ActorId> = {
                let actors = inner.actors.read();
                actors
                    .iter()
                    .filter_map(|(id, cell_arc)| {
                        let cell = cell_arc.lock();
                        let eligible = matches!(
                            cell.state,
                            ActorState::Idle | ActorState::Busy | ActorState::Waiting
                        );
                        (eligible && cell.last_heartbeat < cutoff).then_some(*id)
                    })
                    .collect()
            };

            for id in stale {
                warn!(actor = %id, "heartbeat timeout");
                inner.stats.record_failure();
                Arc::clone(&inner)
                    .handle_failure(id, "heartbeat timeout".to_owned())
                    .await;
            }
        }
    }

    /// GC task: prune idle correlation rings and aged I/O event records.
    /// Errors are logged and never terminate the task.
    async fn gc_loop(
        weak: std::sync::Weak<SystemInner>,
        cancel: CancellationToken,
        interval: Duration,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            let Some(inner) = weak.upgrade() else { return };

            let Ok(age) = chrono::Duration::from_std(interval * 2) else {
                continue;
            };
            let cutoff = Utc::now() - age;

            if let Some(tracer) = inner.tracer.read().as_ref() {
                let pruned = tracer.prune_idle_correlations(cutoff);
                if pruned > 0 {
                    debug!(pruned, "gc pruned idle correlation rings");
                }
            }
            let pruned = inner.io.prune_events_before(cutoff);
            if pruned > 0 {
                debug!(pruned, "gc pruned io event records");
            }
        }
    }
}
