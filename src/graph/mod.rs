pub mod dynamic;
pub mod live_set;
pub mod partition;

use std::collections::{HashMap, HashSet};

use crate::error::{GraphError, Result};
use crate::model::{Edge, EdgeId, GraphEdge, GraphNode, Node, NodeId};

/// A single keyframe of the animation.
pub type GraphState = Graph<Node, Edge>;

/// Map of neighbor node id to the id of the connecting edge.
pub type NodeEdges = HashMap<NodeId, EdgeId>;

/// A static graph: ordered node and edge sequences, id-to-index maps for
/// O(1) lookup, and a symmetric adjacency index.
///
/// Generic over the node and edge types so the same container backs both
/// keyframes ([`GraphState`]) and the partition graphs used by the
/// foresighted layout.
#[derive(Clone, Debug)]
pub struct Graph<N, E> {
    nodes: Vec<N>,
    edges: Vec<E>,
    node_map: HashMap<NodeId, usize>,
    edge_map: HashMap<EdgeId, usize>,
    adjacency: HashMap<NodeId, NodeEdges>,
}

impl<N, E> Default for Graph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_map: HashMap::new(),
            edge_map: HashMap::new(),
            adjacency: HashMap::new(),
        }
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Mutable access to the node sequence. Callers may update positions
    /// and flags but must not add or remove elements here; use the graph
    /// methods so the index maps stay consistent.
    pub fn nodes_mut(&mut self) -> &mut [N] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[E] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [E] {
        &mut self.edges
    }

    pub fn node_exists(&self, id: NodeId) -> bool {
        self.node_map.contains_key(&id)
    }

    pub fn edge_exists(&self, id: EdgeId) -> bool {
        self.edge_map.contains_key(&id)
    }

    /// Index of a node within [`nodes`](Self::nodes).
    pub fn node_index(&self, id: NodeId) -> Result<usize> {
        self.node_map
            .get(&id)
            .copied()
            .ok_or(GraphError::OutOfRange("node id not found"))
    }

    /// Index of an edge within [`edges`](Self::edges).
    pub fn edge_index(&self, id: EdgeId) -> Result<usize> {
        self.edge_map
            .get(&id)
            .copied()
            .ok_or(GraphError::OutOfRange("edge id not found"))
    }

    pub fn node_at(&self, id: NodeId) -> Result<&N> {
        Ok(&self.nodes[self.node_index(id)?])
    }

    pub fn node_at_mut(&mut self, id: NodeId) -> Result<&mut N> {
        let index = self.node_index(id)?;
        Ok(&mut self.nodes[index])
    }

    pub fn edge_at(&self, id: EdgeId) -> Result<&E> {
        Ok(&self.edges[self.edge_index(id)?])
    }

    pub fn edge_at_mut(&mut self, id: EdgeId) -> Result<&mut E> {
        let index = self.edge_index(id)?;
        Ok(&mut self.edges[index])
    }

    /// All edges incident to a node, keyed by the neighbor's id.
    pub fn edges_at_node(&self, id: NodeId) -> Result<&NodeEdges> {
        self.adjacency
            .get(&id)
            .ok_or(GraphError::OutOfRange("node id not found"))
    }

    /// Whether an edge connects `one` and `two`. Symmetric in its
    /// arguments. Fails if either node does not exist.
    pub fn edge_between(&self, one: NodeId, two: NodeId) -> Result<bool> {
        if !self.node_exists(two) {
            return Err(GraphError::OutOfRange("node id not found"));
        }
        Ok(self.edges_at_node(one)?.contains_key(&two))
    }

    fn rebuild_node_map(nodes: &[N], map: &mut HashMap<NodeId, usize>)
    where
        N: GraphNode,
    {
        map.clear();
        for (index, node) in nodes.iter().enumerate() {
            map.insert(node.id(), index);
        }
    }

    fn rebuild_edge_map(edges: &[E], map: &mut HashMap<EdgeId, usize>)
    where
        E: GraphEdge,
    {
        map.clear();
        for (index, edge) in edges.iter().enumerate() {
            map.insert(edge.id(), index);
        }
    }
}

impl<N: GraphNode, E: GraphEdge> Graph<N, E> {
    /// Adds a node. Idempotent on the id: pushing an id that already
    /// exists returns the existing node untouched.
    pub fn push_node(&mut self, node: N) -> &mut N {
        let id = node.id();
        if let Some(&index) = self.node_map.get(&id) {
            return &mut self.nodes[index];
        }
        let index = self.nodes.len();
        self.node_map.insert(id, index);
        self.adjacency.entry(id).or_default();
        self.nodes.push(node);
        &mut self.nodes[index]
    }

    /// Adds an edge, updating the adjacency index in both directions.
    /// Idempotent on the id. Fails if either endpoint is absent.
    pub fn push_edge(&mut self, edge: E) -> Result<&mut E> {
        let id = edge.id();
        if let Some(&index) = self.edge_map.get(&id) {
            return Ok(&mut self.edges[index]);
        }
        let (one, two) = (edge.one_id(), edge.two_id());
        if !self.adjacency.contains_key(&one) || !self.adjacency.contains_key(&two) {
            return Err(GraphError::InvalidGraph("node not available"));
        }
        if let Some(entry) = self.adjacency.get_mut(&one) {
            entry.insert(two, id);
        }
        if let Some(entry) = self.adjacency.get_mut(&two) {
            entry.insert(one, id);
        }
        let index = self.edges.len();
        self.edge_map.insert(id, index);
        self.edges.push(edge);
        Ok(&mut self.edges[index])
    }

    /// Removes every edge the predicate matches. The id-to-index map is
    /// rebuilt from the remaining sequence afterwards.
    pub fn remove_edges_if<F: FnMut(&E) -> bool>(&mut self, mut pred: F) {
        let adjacency = &mut self.adjacency;
        self.edges.retain(|edge| {
            if pred(edge) {
                if let Some(entry) = adjacency.get_mut(&edge.one_id()) {
                    entry.remove(&edge.two_id());
                }
                if let Some(entry) = adjacency.get_mut(&edge.two_id()) {
                    entry.remove(&edge.one_id());
                }
                false
            } else {
                true
            }
        });
        Self::rebuild_edge_map(&self.edges, &mut self.edge_map);
    }

    /// Removes every node the predicate matches, cascading to all edges
    /// incident to a removed node first.
    pub fn remove_nodes_if<F: FnMut(&N) -> bool>(&mut self, mut pred: F) {
        let doomed: HashSet<NodeId> = self
            .nodes
            .iter()
            .filter(|node| pred(*node))
            .map(|node| node.id())
            .collect();
        if doomed.is_empty() {
            return;
        }
        self.remove_edges_if(|edge| {
            doomed.contains(&edge.one_id()) || doomed.contains(&edge.two_id())
        });
        for id in &doomed {
            self.adjacency.remove(id);
        }
        self.nodes.retain(|node| !doomed.contains(&node.id()));
        Self::rebuild_node_map(&self.nodes, &mut self.node_map);
    }

    /// Removes a single edge. Fails if it does not exist.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        if !self.edge_exists(id) {
            return Err(GraphError::InvalidGraph("edge not available"));
        }
        self.remove_edges_if(|edge| edge.id() == id);
        Ok(())
    }

    /// Removes a single node and all edges incident to it. Fails if it
    /// does not exist.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if !self.node_exists(id) {
            return Err(GraphError::InvalidGraph("node not available"));
        }
        self.remove_nodes_if(|node| node.id() == id);
        Ok(())
    }

    /// Removes all edges, leaving the nodes in place.
    pub fn clear_edges(&mut self) {
        self.edges.clear();
        self.edge_map.clear();
        for entry in self.adjacency.values_mut() {
            entry.clear();
        }
    }

    /// Removes all nodes and, with them, the adjacency index.
    pub fn clear_nodes(&mut self) {
        self.nodes.clear();
        self.node_map.clear();
        self.adjacency.clear();
    }
}
