//! Scheduler configuration.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::serde_helpers::duration_millis_serde;

/// Default number of workers.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default per-worker queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default idle wait before a worker attempts to steal.
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(2);

/// Worker selection strategy.
///
/// Selection is least-loaded for every strategy except RoundRobin;
/// the strategies differ in how candidates are narrowed and whether
/// stealing runs, not in the queueing mechanics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SchedulingStrategy {
    /// Least-loaded selection.
    Fair,
    /// Least-loaded selection; priority ordering happens in mailboxes.
    Priority,
    /// Rotate through candidate workers.
    RoundRobin,
    /// Least-loaded selection plus idle-time stealing.
    #[default]
    WorkStealing,
    /// Least-loaded selection.
    LoadBased,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker tasks.
    pub worker_count: usize,

    /// Bounded capacity of each worker's queue.
    pub queue_capacity: usize,

    /// Worker selection strategy.
    pub strategy: SchedulingStrategy,

    /// Whether idle workers poll siblings for work.
    pub work_stealing_enabled: bool,

    /// How long a worker waits on its own queue before stealing.
    #[serde(with = "duration_millis_serde")]
    pub idle_wait: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            strategy: SchedulingStrategy::WorkStealing,
            work_stealing_enabled: true,
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be > 0".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be > 0".to_string());
        }
        Ok(())
    }
}
