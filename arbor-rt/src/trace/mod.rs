//! Diagnostics plane: message tracing with correlation, the actor
//! relationship graph, and deadlock detection over watch edges.

pub mod deadlock;
pub mod graph;
pub mod tracer;

pub use deadlock::{detect_watch_cycles, WatchCycleReport};
pub use graph::{ActorGraph, EdgeKind, GraphEdge, GraphNode};
pub use tracer::{TraceEvent, Tracer, DEFAULT_TRACE_BUFFER};
