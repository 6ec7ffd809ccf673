//! Diagnostics HTTP plane: read-only JSON endpoints over system
//! snapshots, plus text metrics exposition.

pub mod http;
pub mod metrics;

pub use http::{router, serve};
pub use metrics::{render_metrics, sanitize_metric_name};
