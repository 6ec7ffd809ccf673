//! Actor relationship graph types.
//!
//! The system assembles the graph from its arena maps; these types are
//! the JSON-ready product.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::Serialize;

// Layer 3: Internal module imports
use crate::actor::{ActorState, ActorStatsSnapshot};
use crate::util::{ActorId, GroupId, SupervisorId};

/// Directed edge kinds in the actor graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Supervisor → child.
    Supervises,
    /// Watcher → watch target.
    Watching,
    /// Watch target → watcher (reverse label).
    Watched,
    /// Group → member.
    GroupMember,
}

/// One node per actor.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    /// Actor id.
    pub id: ActorId,
    /// Registered name.
    pub name: String,
    /// Lifecycle state.
    pub state: ActorState,
    /// Mailbox length at snapshot time.
    pub mailbox_len: usize,
    /// Supervising supervisor.
    pub supervisor: SupervisorId,
    /// Groups the actor belongs to.
    pub groups: Vec<GroupId>,
    /// Processing counters.
    pub stats: ActorStatsSnapshot,
}

/// A directed edge. The id spaces of `from`/`to` follow the kind:
/// `Supervises` edges originate at a supervisor id, `GroupMember` edges
/// at a group id, watch edges connect actor ids.
#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    /// Edge kind.
    pub kind: EdgeKind,
    /// Source id (see kind for the id space).
    pub from: u64,
    /// Destination id.
    pub to: u64,
}

/// The assembled graph.
#[derive(Debug, Clone, Serialize)]
pub struct ActorGraph {
    /// Snapshot time.
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    /// One node per actor.
    pub nodes: Vec<GraphNode>,
    /// Directed edges.
    pub edges: Vec<GraphEdge>,
}

impl ActorGraph {
    /// Create an empty graph stamped now.
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Edges of one kind.
    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }
}

impl Default for ActorGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_serialization_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&EdgeKind::GroupMember).unwrap(),
            "\"group-member\""
        );
        assert_eq!(
            serde_json::to_string(&EdgeKind::Supervises).unwrap(),
            "\"supervises\""
        );
        assert_eq!(
            serde_json::to_string(&EdgeKind::Watching).unwrap(),
            "\"watching\""
        );
        assert_eq!(
            serde_json::to_string(&EdgeKind::Watched).unwrap(),
            "\"watched\""
        );
    }

    #[test]
    fn test_graph_serializes_generated_at() {
        let graph = ActorGraph::new();
        let json = serde_json::to_string(&graph).unwrap();
        assert!(json.contains("generatedAt"));
        assert!(json.contains("\"nodes\":[]"));
    }

    #[test]
    fn test_edges_of_filters_by_kind() {
        let mut graph = ActorGraph::new();
        graph.edges.push(GraphEdge {
            kind: EdgeKind::Watching,
            from: 1,
            to: 2,
        });
        graph.edges.push(GraphEdge {
            kind: EdgeKind::Supervises,
            from: 1,
            to: 2,
        });

        assert_eq!(graph.edges_of(EdgeKind::Watching).count(), 1);
        assert_eq!(graph.edges_of(EdgeKind::GroupMember).count(), 0);
    }
}
