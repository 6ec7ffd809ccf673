//! System and actor configuration with sensible defaults.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::io::IoWatchOptions;
use crate::mailbox::{OverflowPolicy, DEFAULT_BACK_PRESSURE_WAIT};
use crate::scheduler::SchedulerConfig;
use crate::trace::DEFAULT_TRACE_BUFFER;
use crate::util::duration_serde;

/// Default cap on live actors.
pub const DEFAULT_MAX_ACTORS: usize = 10_000;

/// Default mailbox capacity.
pub const DEFAULT_MAILBOX_SIZE: usize = 1000;

/// Default heartbeat monitor interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default GC task interval.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(300);

/// Default graceful shutdown budget.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TTL applied by `send`.
pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(300);

/// Default restart delay for supervised restarts.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

/// Mailbox flavor selected per actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MailboxType {
    /// FIFO with the system default capacity.
    #[default]
    Standard,
    /// Max-priority heap.
    Priority,
    /// FIFO with the actor's own capacity.
    Bounded,
    /// FIFO without a practical bound.
    Unbounded,
    /// FIFO plus an enabled stash buffer.
    Stashing,
}

/// Per-actor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Mailbox flavor.
    pub mailbox_type: MailboxType,

    /// Mailbox capacity for Bounded/Priority/Stashing mailboxes.
    pub mailbox_capacity: usize,

    /// Overflow policy for the mailbox.
    pub overflow_policy: OverflowPolicy,

    /// Wait budget for the BackPressure overflow policy.
    #[serde(with = "duration_serde")]
    pub back_pressure_wait: Duration,

    /// Delay before a supervised restart; zero restarts synchronously.
    #[serde(with = "duration_serde")]
    pub restart_delay: Duration,

    /// Whether the actor may stash messages.
    pub enable_stashing: bool,

    /// Whether the actor may watch and be watched.
    pub enable_watching: bool,

    /// CPU affinity mask for scheduling; zero means any worker.
    pub cpu_affinity_mask: u64,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_type: MailboxType::Standard,
            mailbox_capacity: DEFAULT_MAILBOX_SIZE,
            overflow_policy: OverflowPolicy::DropOldest,
            back_pressure_wait: DEFAULT_BACK_PRESSURE_WAIT,
            restart_delay: DEFAULT_RESTART_DELAY,
            enable_stashing: true,
            enable_watching: true,
            cpu_affinity_mask: 0,
        }
    }
}

impl ActorConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.mailbox_capacity == 0 && self.mailbox_type != MailboxType::Unbounded {
            return Err("mailbox_capacity must be > 0".to_string());
        }
        Ok(())
    }
}

/// System-wide configuration.
///
/// # Examples
///
/// ```rust
/// use arbor_rt::system::SystemConfig;
/// use std::time::Duration;
///
/// let config = SystemConfig::builder()
///     .with_max_actors(100)
///     .with_heartbeat_interval(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert_eq!(config.max_actors, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Cap on live actors; `0` means unlimited.
    pub max_actors: usize,

    /// Mailbox capacity for Standard mailboxes.
    pub default_mailbox_size: usize,

    /// Heartbeat monitor interval; actors silent for three intervals
    /// are treated as failed.
    #[serde(with = "duration_serde")]
    pub heartbeat_interval: Duration,

    /// Periodic maintenance interval.
    #[serde(with = "duration_serde")]
    pub gc_interval: Duration,

    /// Graceful shutdown budget.
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,

    /// Whether `/metrics` exposition is served.
    pub enable_metrics: bool,

    /// Whether tracing starts enabled.
    pub enable_tracing: bool,

    /// Whether dead letters are retained.
    pub enable_dead_letters: bool,

    /// Per-actor trace ring size when tracing is enabled.
    pub trace_buffer: usize,

    /// Default options for watched connections.
    pub default_io_watch_options: IoWatchOptions,

    /// Worker pool configuration.
    pub scheduler: SchedulerConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_actors: DEFAULT_MAX_ACTORS,
            default_mailbox_size: DEFAULT_MAILBOX_SIZE,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            gc_interval: DEFAULT_GC_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            enable_metrics: true,
            enable_tracing: false,
            enable_dead_letters: true,
            trace_buffer: DEFAULT_TRACE_BUFFER,
            default_io_watch_options: IoWatchOptions::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Create a configuration builder.
    pub fn builder() -> SystemConfigBuilder {
        SystemConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_mailbox_size == 0 {
            return Err("default_mailbox_size must be > 0".to_string());
        }
        if self.heartbeat_interval.is_zero() {
            return Err("heartbeat_interval must be > 0".to_string());
        }
        if self.gc_interval.is_zero() {
            return Err("gc_interval must be > 0".to_string());
        }
        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be > 0".to_string());
        }
        if self.trace_buffer == 0 {
            return Err("trace_buffer must be > 0".to_string());
        }
        self.scheduler.validate()
    }
}

/// Builder for [`SystemConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct SystemConfigBuilder {
    config: SystemConfig,
}

impl SystemConfigBuilder {
    /// Set the cap on live actors (`0` = unlimited).
    pub fn with_max_actors(mut self, max: usize) -> Self {
        self.config.max_actors = max;
        self
    }

    /// Set the Standard mailbox capacity.
    pub fn with_default_mailbox_size(mut self, size: usize) -> Self {
        self.config.default_mailbox_size = size;
        self
    }

    /// Set the heartbeat monitor interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Set the GC interval.
    pub fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.config.gc_interval = interval;
        self
    }

    /// Set the graceful shutdown budget.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Enable or disable metrics exposition.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.config.enable_metrics = enabled;
        self
    }

    /// Start with tracing enabled.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Enable or disable dead-letter retention.
    pub fn with_dead_letters(mut self, enabled: bool) -> Self {
        self.config.enable_dead_letters = enabled;
        self
    }

    /// Set the per-actor trace ring size.
    pub fn with_trace_buffer(mut self, size: usize) -> Self {
        self.config.trace_buffer = size;
        self
    }

    /// Set the default I/O watch options.
    pub fn with_io_watch_options(mut self, opts: IoWatchOptions) -> Self {
        self.config.default_io_watch_options = opts;
        self
    }

    /// Set the scheduler configuration.
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.config.scheduler = scheduler;
        self
    }

    /// Build and validate.
    pub fn build(self) -> Result<SystemConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
