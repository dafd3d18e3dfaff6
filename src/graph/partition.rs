use std::collections::HashMap;

use crate::error::Result;
use crate::graph::live_set::LiveSet;
use crate::graph::Graph;
use crate::model::{Coord, EdgeId, GraphEdge, GraphNode, NodeId};

/// Graph whose nodes and edges carry live-time information. Used by the
/// foresighted layout to represent the GAP and RGAP partitionings.
pub type PartitionGraph = Graph<PartitionNode, PartitionEdge>;

/// A partition of supergraph nodes with pairwise-disjoint live-sets. The
/// partition is identified by the id of its first member and owns the
/// union of the members' live-sets.
#[derive(Clone, Debug)]
pub struct PartitionNode {
    pub id: NodeId,
    pub pos: Coord,
    pub live: LiveSet,
}

impl PartitionNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            pos: Coord::default(),
            live: LiveSet::new(),
        }
    }

    pub fn add_live(&mut self, live: &LiveSet) {
        self.live.join(live);
    }
}

/// A partition of supergraph edges between the same pair of partition
/// nodes, analogous to [`PartitionNode`].
#[derive(Clone, Debug)]
pub struct PartitionEdge {
    pub id: EdgeId,
    pub one: NodeId,
    pub two: NodeId,
    pub live: LiveSet,
}

impl PartitionEdge {
    pub fn new(id: EdgeId, one: NodeId, two: NodeId) -> Self {
        Self {
            id,
            one,
            two,
            live: LiveSet::new(),
        }
    }

    pub fn add_live(&mut self, live: &LiveSet) {
        self.live.join(live);
    }
}

impl GraphNode for PartitionNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn pos(&self) -> Coord {
        self.pos
    }

    fn pos_mut(&mut self) -> &mut Coord {
        &mut self.pos
    }
}

impl GraphEdge for PartitionEdge {
    fn id(&self) -> EdgeId {
        self.id
    }

    fn one_id(&self) -> NodeId {
        self.one
    }

    fn two_id(&self) -> NodeId {
        self.two
    }
}

/// A partition graph plus alias tables mapping merged ids onto their
/// partition representatives.
///
/// Lookups consult the alias table first and fall back to the underlying
/// graph. Aliases are many-to-one and a single hop deep; only
/// representatives own state.
#[derive(Clone, Debug, Default)]
pub struct MappedGraph {
    graph: PartitionGraph,
    node_aliases: HashMap<NodeId, NodeId>,
    edge_aliases: HashMap<EdgeId, EdgeId>,
}

impl MappedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &PartitionGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut PartitionGraph {
        &mut self.graph
    }

    /// Makes `alias` resolve to the partition represented by `target`.
    pub fn map_node(&mut self, alias: NodeId, target: NodeId) {
        self.node_aliases.insert(alias, target);
    }

    pub fn map_edge(&mut self, alias: EdgeId, target: EdgeId) {
        self.edge_aliases.insert(alias, target);
    }

    pub fn node_at(&self, id: NodeId) -> Result<&PartitionNode> {
        let target = self.node_aliases.get(&id).copied().unwrap_or(id);
        self.graph.node_at(target)
    }

    pub fn node_at_mut(&mut self, id: NodeId) -> Result<&mut PartitionNode> {
        let target = self.node_aliases.get(&id).copied().unwrap_or(id);
        self.graph.node_at_mut(target)
    }

    pub fn edge_at(&self, id: EdgeId) -> Result<&PartitionEdge> {
        let target = self.edge_aliases.get(&id).copied().unwrap_or(id);
        self.graph.edge_at(target)
    }

    pub fn edge_at_mut(&mut self, id: EdgeId) -> Result<&mut PartitionEdge> {
        let target = self.edge_aliases.get(&id).copied().unwrap_or(id);
        self.graph.edge_at_mut(target)
    }

    pub fn clear_nodes(&mut self) {
        self.graph.clear_nodes();
        self.node_aliases.clear();
    }

    pub fn clear_edges(&mut self) {
        self.graph.clear_edges();
        self.edge_aliases.clear();
    }
}
