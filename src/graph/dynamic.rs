use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::graph::GraphState;
use crate::model::{Edge, EdgeId, Node, NodeId};

/// A single queued modification, keyed by the time step it applies at.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Operation {
    PushNode(NodeId),
    PushEdge(EdgeId, NodeId, NodeId),
    RemoveNode(NodeId),
    RemoveEdge(EdgeId),
}

/// The sequence of keyframes of a dynamic graph.
///
/// Modifications are queued with `add_*` / `remove_*`, each stamped with a
/// 0-based integer time step, then materialized into keyframes by
/// [`build`](Self::build). A layout engine later writes positions into the
/// keyframes and the interpolator reads them back out.
#[derive(Clone, Debug, Default)]
pub struct DynamicGraph {
    last_node_id: u64,
    last_edge_id: u64,
    states: Vec<GraphState>,
    modifications: Vec<Vec<Operation>>,
}

impl DynamicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a node creation at `time` and returns its id. At `time == 0`
    /// the node is part of the initial keyframe.
    pub fn add_node(&mut self, time: usize) -> NodeId {
        let id = NodeId(self.last_node_id);
        self.last_node_id += 1;
        self.push_operation(time, Operation::PushNode(id));
        id
    }

    /// Queues an edge creation between `one` and `two` at `time`.
    pub fn add_edge(&mut self, time: usize, one: NodeId, two: NodeId) -> EdgeId {
        let id = EdgeId(self.last_edge_id);
        self.last_edge_id += 1;
        self.push_operation(time, Operation::PushEdge(id, one, two));
        id
    }

    /// Queues removal of a node at `time`.
    pub fn remove_node(&mut self, time: usize, id: NodeId) {
        self.push_operation(time, Operation::RemoveNode(id));
    }

    /// Queues removal of an edge at `time`.
    pub fn remove_edge(&mut self, time: usize, id: EdgeId) {
        self.push_operation(time, Operation::RemoveEdge(id));
    }

    /// Materializes the keyframe sequence from the queued modifications.
    ///
    /// Each step starts from a copy of the previous keyframe and applies
    /// its operations in insertion order. Afterwards every element is
    /// tagged with `is_new` / `is_old` and the modification log is
    /// cleared. Fails with `InvalidGraph` if an operation violates a
    /// keyframe invariant (dangling edge, removal of an absent element).
    pub fn build(&mut self) -> Result<()> {
        self.states.clear();
        self.states.reserve(self.modifications.len());
        for step in &self.modifications {
            let mut state = self.states.last().cloned().unwrap_or_default();
            for operation in step {
                Self::apply(&mut state, operation)?;
            }
            self.states.push(state);
        }
        self.set_flags();
        self.modifications.clear();
        debug!(states = self.states.len(), "dynamic graph built");
        Ok(())
    }

    /// Adopts an already-materialized keyframe sequence, dropping any
    /// queued modifications. The id counters are recomputed from the
    /// highest ids observed so later `add_*` calls stay collision-free.
    pub fn build_from(&mut self, states: Vec<GraphState>) {
        self.modifications.clear();
        self.states = states;
        self.set_flags();
        self.recalculate_ids();
    }

    /// Drops all keyframes and queued modifications.
    pub fn clear(&mut self) {
        self.states.clear();
        self.modifications.clear();
    }

    pub fn states(&self) -> &[GraphState] {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut [GraphState] {
        &mut self.states
    }

    /// Number of node ids handed out. Ids created and removed within the
    /// same step never appear in any keyframe but still count here.
    pub fn node_count(&self) -> u64 {
        self.last_node_id
    }

    /// Number of edge ids handed out; same caveat as
    /// [`node_count`](Self::node_count).
    pub fn edge_count(&self) -> u64 {
        self.last_edge_id
    }

    fn push_operation(&mut self, time: usize, operation: Operation) {
        if time >= self.modifications.len() {
            self.modifications.resize(time + 1, Vec::new());
        }
        self.modifications[time].push(operation);
    }

    fn apply(state: &mut GraphState, operation: &Operation) -> Result<()> {
        match *operation {
            Operation::PushNode(id) => {
                state.push_node(Node::new(id));
                Ok(())
            }
            Operation::PushEdge(id, one, two) => {
                state.push_edge(Edge::new(id, one, two)).map(|_| ())
            }
            Operation::RemoveNode(id) => state.remove_node(id),
            Operation::RemoveEdge(id) => state.remove_edge(id),
        }
    }

    fn set_flags(&mut self) {
        let len = self.states.len();
        let node_sets: Vec<HashSet<NodeId>> = self
            .states
            .iter()
            .map(|state| state.nodes().iter().map(|node| node.id).collect())
            .collect();
        let edge_sets: Vec<HashSet<EdgeId>> = self
            .states
            .iter()
            .map(|state| state.edges().iter().map(|edge| edge.id).collect())
            .collect();
        for (i, state) in self.states.iter_mut().enumerate() {
            for node in state.nodes_mut() {
                node.is_old = i + 1 < len && !node_sets[i + 1].contains(&node.id);
                node.is_new = i > 0 && !node_sets[i - 1].contains(&node.id);
            }
            for edge in state.edges_mut() {
                edge.is_old = i + 1 < len && !edge_sets[i + 1].contains(&edge.id);
                edge.is_new = i > 0 && !edge_sets[i - 1].contains(&edge.id);
            }
        }
    }

    fn recalculate_ids(&mut self) {
        for state in &self.states {
            for node in state.nodes() {
                self.last_node_id = self.last_node_id.max(node.id.0 + 1);
            }
            for edge in state.edges() {
                self.last_edge_id = self.last_edge_id.max(edge.id.0 + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    #[test]
    fn empty_build_is_fine() {
        let mut dgraph = DynamicGraph::new();
        dgraph.build().unwrap();
        assert!(dgraph.states().is_empty());
    }

    #[test]
    fn ids_are_monotonic() {
        let mut dgraph = DynamicGraph::new();
        let a = dgraph.add_node(0);
        let b = dgraph.add_node(5);
        assert_ne!(a, b);
        let e = dgraph.add_edge(6, a, b);
        let f = dgraph.add_edge(6, a, b);
        assert_ne!(e, f);
        assert_eq!(dgraph.node_count(), 2);
        assert_eq!(dgraph.edge_count(), 2);
    }

    #[test]
    fn counters_include_same_step_ghosts() {
        let mut dgraph = DynamicGraph::new();
        let a = dgraph.add_node(0);
        let ghost = dgraph.add_node(1);
        dgraph.remove_node(1, ghost);
        dgraph.build().unwrap();
        assert!(dgraph.states()[1].node_exists(a));
        assert!(!dgraph.states()[1].node_exists(ghost));
        // the ghost never shows up in a keyframe but was counted
        assert_eq!(dgraph.node_count(), 2);
    }

    #[test]
    fn double_remove_fails() {
        let mut dgraph = DynamicGraph::new();
        let a = dgraph.add_node(0);
        dgraph.remove_node(1, a);
        dgraph.remove_node(2, a);
        assert!(matches!(
            dgraph.build(),
            Err(GraphError::InvalidGraph("node not available"))
        ));
    }

    #[test]
    fn clear_resets_everything() {
        let mut dgraph = DynamicGraph::new();
        dgraph.add_node(3);
        dgraph.clear();
        dgraph.build().unwrap();
        assert!(dgraph.states().is_empty());
    }

    #[test]
    fn build_from_recomputes_counters() {
        let mut source = DynamicGraph::new();
        let a = source.add_node(0);
        let b = source.add_node(1);
        source.add_edge(2, a, b);
        source.build().unwrap();

        let mut other = DynamicGraph::new();
        other.add_node(100);
        other.build_from(source.states().to_vec());
        assert_eq!(other.states().len(), 3);
        assert_eq!(other.node_count(), 2);
        assert_eq!(other.edge_count(), 1);
        let c = other.add_node(0);
        assert_eq!(c, NodeId(2));
    }
}
