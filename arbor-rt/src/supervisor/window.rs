//! Sliding restart window.
//!
//! Each supervised child keeps a list of restart timestamps. A restart
//! is allowed while fewer than `max_retries` entries fall inside the
//! trailing `retry_period`; hitting the cap means the child is stopped
//! instead of restarted.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
// (none)

/// Restart timestamps for one child.
#[derive(Debug, Clone, Default)]
pub struct RestartWindow {
    timestamps: Vec<DateTime<Utc>>,
}

impl RestartWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a restart at `now` is allowed.
    ///
    /// `max_retries == 0` or a zero `retry_period` disables the limit
    /// entirely. Otherwise entries older than `now - retry_period` are
    /// pruned and the remainder counted against `max_retries`.
    pub fn allows(&mut self, now: DateTime<Utc>, max_retries: u32, retry_period: Duration) -> bool {
        if max_retries == 0 || retry_period.is_zero() {
            return true;
        }

        let Ok(period) = chrono::Duration::from_std(retry_period) else {
            return true;
        };
        let cutoff = now - period;
        self.timestamps.retain(|t| *t > cutoff);

        (self.timestamps.len() as u32) < max_retries
    }

    /// Record a restart at `now`.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.timestamps.push(now);
    }

    /// Number of retained entries (pruning happens in [`Self::allows`]).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no restarts are recorded.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_retries_always_allows() {
        let mut w = RestartWindow::new();
        let now = Utc::now();
        for _ in 0..100 {
            assert!(w.allows(now, 0, Duration::from_secs(10)));
            w.record(now);
        }
    }

    #[test]
    fn test_zero_period_always_allows() {
        let mut w = RestartWindow::new();
        let now = Utc::now();
        w.record(now);
        w.record(now);
        assert!(w.allows(now, 1, Duration::ZERO));
    }

    #[test]
    fn test_cap_reached_within_window() {
        let mut w = RestartWindow::new();
        let now = Utc::now();

        assert!(w.allows(now, 3, Duration::from_secs(10)));
        w.record(now);
        assert!(w.allows(now, 3, Duration::from_secs(10)));
        w.record(now);
        assert!(w.allows(now, 3, Duration::from_secs(10)));
        w.record(now);

        // The (k+1)-th attempt inside the window is refused.
        assert!(!w.allows(now, 3, Duration::from_secs(10)));
    }

    #[test]
    fn test_old_entries_age_out() {
        let mut w = RestartWindow::new();
        let start = Utc::now();

        w.record(start);
        w.record(start);
        w.record(start);
        assert!(!w.allows(start, 3, Duration::from_secs(10)));

        // Past the retry period, the slate is clean again.
        let later = start + chrono::Duration::seconds(11);
        assert!(w.allows(later, 3, Duration::from_secs(10)));
        assert!(w.is_empty());
    }

    #[test]
    fn test_partial_aging() {
        let mut w = RestartWindow::new();
        let start = Utc::now();

        w.record(start);
        w.record(start + chrono::Duration::seconds(8));

        // Nine seconds in: the first entry (age 9s) is still inside a
        // 10s window, so two entries count.
        let at9 = start + chrono::Duration::seconds(9);
        assert!(!w.allows(at9, 2, Duration::from_secs(10)));

        // Eleven seconds in: the first entry has aged out.
        let at11 = start + chrono::Duration::seconds(11);
        assert!(w.allows(at11, 2, Duration::from_secs(10)));
        assert_eq!(w.len(), 1);
    }
}
