//! Text metrics exposition: one `<sanitized_name> <float>` per line.

// Layer 1: Standard library imports
use std::fmt::Write as _;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::system::ActorSystem;

/// Sanitize a metric name: only `[A-Za-z0-9_:]` survive, other
/// characters become `_`, a leading digit is prefixed with `_`, and
/// runs of underscores collapse to one.
pub fn sanitize_metric_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == ':' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }

    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    while out.contains("__") {
        out = out.replace("__", "_");
    }
    out
}

/// Render the full metrics page for a system.
pub fn render_metrics(system: &ActorSystem) -> String {
    let stats = system.statistics();
    let mut out = String::new();

    let mut metric = |name: &str, value: f64| {
        let _ = writeln!(out, "{} {}", sanitize_metric_name(name), value);
    };

    metric("arbor_actors_active", stats.active_actors as f64);
    metric("arbor_actors_created_total", stats.total_created as f64);
    metric("arbor_actors_stopped_total", stats.total_stopped as f64);
    metric("arbor_restarts_total", stats.total_restarts as f64);
    metric("arbor_failures_total", stats.total_failures as f64);
    metric("arbor_messages_total", stats.total_messages as f64);
    metric("arbor_dead_letters_total", stats.dead_letters as f64);
    metric("arbor_registered_names", stats.registered_names as f64);

    for worker in &stats.scheduler {
        metric(
            &format!("arbor_scheduler_worker_{}_queue_len", worker.index),
            worker.queue_len as f64,
        );
        metric(
            &format!("arbor_scheduler_worker_{}_completed_total", worker.index),
            worker.completed as f64,
        );
    }

    for actor in system.snapshot().actors {
        metric(
            &format!("arbor_mailbox_len_{}", actor.name),
            actor.mailbox_len as f64,
        );
    }

    out
}
