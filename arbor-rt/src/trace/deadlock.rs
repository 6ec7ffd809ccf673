//! Deadlock detection over watch edges.
//!
//! A watch cycle (`A` watches `B` watches ... watches `A`) means every
//! member is waiting on another member's termination notice. Tarjan's
//! strongly-connected-components algorithm finds all such cycles in
//! O(V+E); the implementation is iterative so deep graphs cannot
//! overflow the stack.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use serde::Serialize;

// Layer 3: Internal module imports
use crate::actor::ActorState;
use crate::util::ActorId;

/// One detected watch cycle.
#[derive(Debug, Clone, Serialize)]
pub struct WatchCycleReport {
    /// Report kind; always `"watch-cycle"`.
    pub kind: &'static str,
    /// Member actor ids.
    #[serde(rename = "actorIds")]
    pub actor_ids: Vec<ActorId>,
    /// Member actor names.
    #[serde(rename = "actorNames")]
    pub actor_names: Vec<String>,
    /// Member lifecycle states.
    pub states: Vec<ActorState>,
    /// Cycle size.
    pub size: usize,
}

/// Node input: id, name, state.
pub type WatchNode = (ActorId, String, ActorState);

/// Detect watch cycles.
///
/// Reports every strongly connected component of size ≥ 2, plus any
/// single node with a self-edge. Edges pointing at ids absent from
/// `nodes` are ignored.
pub fn detect_watch_cycles(
    nodes: &[WatchNode],
    edges: &[(ActorId, ActorId)],
) -> Vec<WatchCycleReport> {
    let n = nodes.len();
    if n == 0 {
        return Vec::new();
    }

    let index_of: HashMap<ActorId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, (id, _, _))| (*id, i))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut self_loop = vec![false; n];
    for (from, to) in edges {
        let (Some(&f), Some(&t)) = (index_of.get(from), index_of.get(to)) else {
            continue;
        };
        if f == t {
            self_loop[f] = true;
        }
        adjacency[f].push(t);
    }

    let sccs = tarjan_sccs(&adjacency);

    let mut reports = Vec::new();
    for scc in sccs {
        let is_cycle = scc.len() >= 2 || (scc.len() == 1 && self_loop[scc[0]]);
        if !is_cycle {
            continue;
        }
        let mut members = scc;
        members.sort_unstable();
        reports.push(WatchCycleReport {
            kind: "watch-cycle",
            actor_ids: members.iter().map(|&i| nodes[i].0).collect(),
            actor_names: members.iter().map(|&i| nodes[i].1.clone()).collect(),
            states: members.iter().map(|&i| nodes[i].2).collect(),
            size: members.len(),
        });
    }
    reports
}

/// Iterative Tarjan: returns all strongly connected components.
fn tarjan_sccs(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut sccs = Vec::new();

    // (vertex, next edge offset) frames replace recursion.
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            if frame.1 == 0 {
                index[v] = Some(next_index);
                lowlink[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }

            if frame.1 < adjacency[v].len() {
                let w = adjacency[v][frame.1];
                frame.1 += 1;
                if index[w].is_none() {
                    frames.push((w, 0));
                } else if on_stack[w] {
                    if let Some(w_index) = index[w] {
                        lowlink[v] = lowlink[v].min(w_index);
                    }
                }
                continue;
            }

            // All edges of v explored: maybe emit an SCC, then fold the
            // lowlink into the parent frame.
            if Some(lowlink[v]) == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                sccs.push(component);
            }

            frames.pop();
            if let Some(parent) = frames.last_mut() {
                let p = parent.0;
                lowlink[p] = lowlink[p].min(lowlink[v]);
            }
        }
    }
    sccs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64) -> WatchNode {
        (
            ActorId::from_raw(id),
            format!("actor-{id}"),
            ActorState::Idle,
        )
    }

    fn ids(report: &WatchCycleReport) -> Vec<u64> {
        report.actor_ids.iter().map(|a| a.as_u64()).collect()
    }

    #[test]
    fn test_two_cycle() {
        let nodes = vec![node(1), node(2)];
        let edges = vec![
            (ActorId::from_raw(1), ActorId::from_raw(2)),
            (ActorId::from_raw(2), ActorId::from_raw(1)),
        ];

        let reports = detect_watch_cycles(&nodes, &edges);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].size, 2);
        assert_eq!(reports[0].kind, "watch-cycle");
        assert_eq!(ids(&reports[0]), vec![1, 2]);
    }

    #[test]
    fn test_chain_is_not_a_cycle() {
        let nodes = vec![node(1), node(2), node(3)];
        let edges = vec![
            (ActorId::from_raw(1), ActorId::from_raw(2)),
            (ActorId::from_raw(2), ActorId::from_raw(3)),
        ];

        assert!(detect_watch_cycles(&nodes, &edges).is_empty());
    }

    #[test]
    fn test_self_loop_is_reported() {
        let nodes = vec![node(1), node(2)];
        let edges = vec![(ActorId::from_raw(1), ActorId::from_raw(1))];

        let reports = detect_watch_cycles(&nodes, &edges);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].size, 1);
        assert_eq!(ids(&reports[0]), vec![1]);
    }

    #[test]
    fn test_k_cycle_contains_all_members() {
        // 1 → 2 → 3 → 4 → 5 → 1
        let nodes: Vec<WatchNode> = (1..=5).map(node).collect();
        let edges: Vec<(ActorId, ActorId)> = (1..=5u64)
            .map(|i| {
                (
                    ActorId::from_raw(i),
                    ActorId::from_raw(if i == 5 { 1 } else { i + 1 }),
                )
            })
            .collect();

        let reports = detect_watch_cycles(&nodes, &edges);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].size, 5);
        assert_eq!(ids(&reports[0]), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_two_separate_cycles() {
        let nodes: Vec<WatchNode> = (1..=4).map(node).collect();
        let edges = vec![
            (ActorId::from_raw(1), ActorId::from_raw(2)),
            (ActorId::from_raw(2), ActorId::from_raw(1)),
            (ActorId::from_raw(3), ActorId::from_raw(4)),
            (ActorId::from_raw(4), ActorId::from_raw(3)),
        ];

        let mut reports = detect_watch_cycles(&nodes, &edges);
        reports.sort_by_key(|r| r.actor_ids[0]);
        assert_eq!(reports.len(), 2);
        assert_eq!(ids(&reports[0]), vec![1, 2]);
        assert_eq!(ids(&reports[1]), vec![3, 4]);
    }

    #[test]
    fn test_cycle_with_tail() {
        // 1 → 2 → 3 → 2 : only {2, 3} cycles.
        let nodes = vec![node(1), node(2), node(3)];
        let edges = vec![
            (ActorId::from_raw(1), ActorId::from_raw(2)),
            (ActorId::from_raw(2), ActorId::from_raw(3)),
            (ActorId::from_raw(3), ActorId::from_raw(2)),
        ];

        let reports = detect_watch_cycles(&nodes, &edges);
        assert_eq!(reports.len(), 1);
        assert_eq!(ids(&reports[0]), vec![2, 3]);
    }

    #[test]
    fn test_edges_to_unknown_nodes_ignored() {
        let nodes = vec![node(1)];
        let edges = vec![
            (ActorId::from_raw(1), ActorId::from_raw(99)),
            (ActorId::from_raw(99), ActorId::from_raw(1)),
        ];

        assert!(detect_watch_cycles(&nodes, &edges).is_empty());
    }

    #[test]
    fn test_empty_graph() {
        assert!(detect_watch_cycles(&[], &[]).is_empty());
    }

    #[test]
    fn test_large_chain_does_not_overflow() {
        // A deep chain ending in a 2-cycle exercises the iterative DFS.
        let count = 10_000u64;
        let nodes: Vec<WatchNode> = (1..=count).map(node).collect();
        let mut edges: Vec<(ActorId, ActorId)> = (1..count)
            .map(|i| (ActorId::from_raw(i), ActorId::from_raw(i + 1)))
            .collect();
        edges.push((ActorId::from_raw(count), ActorId::from_raw(count - 1)));

        let reports = detect_watch_cycles(&nodes, &edges);
        assert_eq!(reports.len(), 1);
        assert_eq!(ids(&reports[0]), vec![count - 1, count]);
    }
}
