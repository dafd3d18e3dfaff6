use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::dynamic::DynamicGraph;
use crate::graph::live_set::LiveSet;
use crate::graph::partition::{MappedGraph, PartitionEdge, PartitionNode};
use crate::graph::GraphState;
use crate::layout::fruchterman::FruchtermanReingold;
use crate::layout::{Cooling, StaticLayout};
use crate::model::{Coord, EdgeId, NodeId};

pub(crate) const CALCULATION_HEIGHT: f32 = 1.0;

/// Foresighted layout with tolerance, the default engine of the crate.
pub type DefaultLayout = ForesightedLayout<FruchtermanReingold>;

/// Foresighted Layout with Tolerance.
///
/// Lays out the reduced graph animation partitioning (RGAP) of the whole
/// keyframe sequence once with the injected static layout, so every
/// keyframe inherits mental-map-preserving positions, then lets each
/// keyframe relax individually as long as it stays within `tolerance` of
/// its neighbors.
pub struct ForesightedLayout<S> {
    static_layout: S,
    tolerance: f32,
    canvas_width: f32,
    canvas_height: f32,
    center: Coord,
    relative_distance: bool,
    cooling: Cooling,
}

impl<S: StaticLayout + Default> ForesightedLayout<S> {
    /// Engine over a default-constructed static layout with a unit canvas
    /// centered at the origin.
    pub fn new(tolerance: f32) -> Self {
        Self::with_layout(S::default(), tolerance)
    }
}

impl<S: StaticLayout> ForesightedLayout<S> {
    pub fn with_layout(static_layout: S, tolerance: f32) -> Self {
        Self {
            static_layout,
            tolerance,
            canvas_width: 1.0,
            canvas_height: 1.0,
            center: Coord::default(),
            relative_distance: true,
            cooling: Cooling::new(250, 0.4, |t| t * 0.977),
        }
    }

    /// Canvas dimensions and center. Every node ends up within
    /// `[cx - w/2, cx + w/2] x [cy - h/2, cy + h/2]`.
    pub fn set_canvas(&mut self, width: f32, height: f32, center: Coord) {
        self.canvas_width = width;
        self.canvas_height = height;
        self.center = center;
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// Whether the mental-map distance is averaged over the shared nodes
    /// (relative, the default) or taken as the raw sum (absolute).
    pub fn use_relative_distance(&mut self, relative: bool) {
        self.relative_distance = relative;
    }

    /// Cooling schedule of the tolerance refinement pass.
    pub fn set_cooling(&mut self, cooling: Cooling) {
        self.cooling = cooling;
    }

    pub fn static_layout(&self) -> &S {
        &self.static_layout
    }

    pub fn static_layout_mut(&mut self) -> &mut S {
        &mut self.static_layout
    }

    /// Runs the algorithm, writing a position into every node of every
    /// keyframe.
    pub fn apply(&self, dgraph: &mut DynamicGraph) -> Result<()> {
        if dgraph.states().is_empty() {
            return Ok(());
        }
        let (width, height) = self.calculation_canvas();
        self.base_layout(dgraph.states_mut(), width, height)?;
        if self.tolerance != 0.0 {
            self.tolerance_pass(dgraph.states_mut(), width, height, self.tolerance);
        }
        self.finish(dgraph.states_mut(), width, height);
        Ok(())
    }

    /// All force computations run on a canvas of height 1 with the target
    /// aspect ratio; positions are rescaled at the end.
    pub(crate) fn calculation_canvas(&self) -> (f32, f32) {
        let height = CALCULATION_HEIGHT;
        let width = height * self.canvas_width / self.canvas_height;
        (width, height)
    }

    pub(crate) fn finish(&self, states: &mut [GraphState], width: f32, height: f32) {
        for state in states {
            rescale(state, width, height, self.canvas_width, self.canvas_height);
            translate(state, self.center);
        }
    }

    pub(crate) fn tolerance_value(&self) -> f32 {
        self.tolerance
    }

    pub(crate) fn cooling(&self) -> &Cooling {
        &self.cooling
    }

    /// Supergraph -> GAP -> RGAP -> static layout -> backpropagation.
    pub(crate) fn base_layout(
        &self,
        states: &mut [GraphState],
        width: f32,
        height: f32,
    ) -> Result<()> {
        let nodes_live = node_live_times(states);
        let edges_live = edge_live_times(states);

        let supergraph = supergraph(states)?;
        let gap = build_gap(&supergraph, &nodes_live, &edges_live)?;
        let mut rgap = reduce_gap(&gap)?;
        debug!(
            supergraph_nodes = supergraph.nodes().len(),
            supergraph_edges = supergraph.edges().len(),
            partitions = rgap.graph().nodes().len(),
            partition_edges = rgap.graph().edges().len(),
            "partitioning computed"
        );

        self.static_layout.apply(rgap.graph_mut(), width, height);

        // every keyframe node takes the position of its partition
        for state in states {
            for node in state.nodes_mut() {
                node.pos = rgap.node_at(node.id)?.pos;
            }
        }
        Ok(())
    }

    /// The absolute drift bound. With relative distances the caller's
    /// tolerance is used as-is; otherwise it is scaled by the relative
    /// unit and the largest keyframe so that differently sized graphs
    /// accept comparable values.
    pub(crate) fn tolerance_abs(
        &self,
        states: &[GraphState],
        width: f32,
        height: f32,
        tolerance: f32,
    ) -> f32 {
        if self.relative_distance {
            tolerance
        } else {
            tolerance * self.static_layout.relative_unit(width, height) * max_nodes(states) as f32
        }
    }

    /// Euclidean mental-map distance between two keyframes: summed over
    /// the nodes present in both, averaged when relative distances are on.
    pub(crate) fn distance(&self, one: &GraphState, two: &GraphState) -> f32 {
        let mut result = 0.0;
        let mut count = 0u32;
        for node in one.nodes() {
            if let Ok(other) = two.node_at(node.id) {
                result += node.pos.distance(other.pos);
                count += 1;
            }
        }
        if self.relative_distance {
            result / count as f32
        } else {
            result
        }
    }

    /// Sequential tolerance refinement: each keyframe is relaxed one
    /// static-layout iteration at a time and the step is kept only while
    /// the keyframe stays within the drift bound of both neighbors.
    fn tolerance_pass(&self, states: &mut [GraphState], width: f32, height: f32, tolerance: f32) {
        let tolerance = self.tolerance_abs(states, width, height, tolerance);
        let mut temperature = self.cooling.start_temperature;
        for _ in 0..self.cooling.iterations {
            for s in 0..states.len() {
                let mut copy = states[s].clone();
                self.static_layout
                    .iteration(&mut copy, width, height, temperature);
                let left_ok = s == 0 || self.distance(&copy, &states[s - 1]) < tolerance;
                let right_ok =
                    s + 1 >= states.len() || self.distance(&copy, &states[s + 1]) < tolerance;
                if left_ok && right_ok {
                    states[s] = copy;
                }
            }
            temperature = self.cooling.anneal(temperature);
        }
    }
}

pub(crate) fn rescale(
    state: &mut GraphState,
    src_width: f32,
    src_height: f32,
    dst_width: f32,
    dst_height: f32,
) {
    let w_coeff = dst_width / src_width;
    let h_coeff = dst_height / src_height;
    for node in state.nodes_mut() {
        node.pos.x *= w_coeff;
        node.pos.y *= h_coeff;
    }
}

pub(crate) fn translate(state: &mut GraphState, center: Coord) {
    for node in state.nodes_mut() {
        node.pos.x += center.x;
        node.pos.y += center.y;
    }
}

pub(crate) fn max_nodes(states: &[GraphState]) -> usize {
    states
        .iter()
        .map(|state| state.nodes().len())
        .max()
        .unwrap_or(0)
}

fn node_live_times(states: &[GraphState]) -> HashMap<NodeId, LiveSet> {
    let mut result: HashMap<NodeId, LiveSet> = HashMap::new();
    for (t, state) in states.iter().enumerate() {
        for node in state.nodes() {
            result.entry(node.id).or_default().add(t as u32);
        }
    }
    result
}

fn edge_live_times(states: &[GraphState]) -> HashMap<EdgeId, LiveSet> {
    let mut result: HashMap<EdgeId, LiveSet> = HashMap::new();
    for (t, state) in states.iter().enumerate() {
        for edge in state.edges() {
            result.entry(edge.id).or_default().add(t as u32);
        }
    }
    result
}

/// Union of all keyframes' nodes and edges, each id appearing once.
fn supergraph(states: &[GraphState]) -> Result<GraphState> {
    let mut result = GraphState::new();
    for state in states {
        for node in state.nodes() {
            result.push_node(node.clone());
        }
        for edge in state.edges() {
            result.push_edge(edge.clone())?;
        }
    }
    Ok(result)
}

/// Graph animation partitioning: greedily merges supergraph nodes with
/// pairwise-disjoint live-sets into partitions, then maps every
/// supergraph edge onto the partition edge between its endpoints'
/// representatives.
fn build_gap(
    supergraph: &GraphState,
    nodes_live: &HashMap<NodeId, LiveSet>,
    edges_live: &HashMap<EdgeId, LiveSet>,
) -> Result<MappedGraph> {
    let mut gap = MappedGraph::new();
    for node in supergraph.nodes() {
        let live = nodes_live
            .get(&node.id)
            .ok_or(GraphError::OutOfRange("node id not found"))?;
        let found = gap
            .graph()
            .nodes()
            .iter()
            .position(|partition| partition.live.intersection(live).is_empty());
        match found {
            Some(index) => {
                let partition = &mut gap.graph_mut().nodes_mut()[index];
                partition.add_live(live);
                let target = partition.id;
                gap.map_node(node.id, target);
            }
            None => {
                gap.graph_mut()
                    .push_node(PartitionNode::new(node.id))
                    .add_live(live);
            }
        }
    }
    for edge in supergraph.edges() {
        let one = gap.node_at(edge.one)?.id;
        let two = gap.node_at(edge.two)?.id;
        let live = edges_live
            .get(&edge.id)
            .ok_or(GraphError::OutOfRange("edge id not found"))?;
        gap.graph_mut()
            .push_edge(PartitionEdge::new(edge.id, one, two))?
            .add_live(live);
    }
    Ok(gap)
}

/// Reduced GAP: partition edges between the same pair of partition nodes
/// whose live-sets are disjoint are merged into a single representative.
fn reduce_gap(gap: &MappedGraph) -> Result<MappedGraph> {
    let mut rgap = gap.clone();
    rgap.clear_edges();
    let mut removed: HashSet<EdgeId> = HashSet::new();
    let same_pair = |a: &PartitionEdge, b: &PartitionEdge| {
        (a.one == b.one && a.two == b.two) || (a.one == b.two && a.two == b.one)
    };
    let edges = gap.graph().edges();
    for (i, edge) in edges.iter().enumerate() {
        if removed.contains(&edge.id) {
            continue;
        }
        rgap.graph_mut()
            .push_edge(PartitionEdge::new(edge.id, edge.one, edge.two))?
            .add_live(&edge.live);
        for later in &edges[i + 1..] {
            if removed.contains(&later.id) || !same_pair(edge, later) {
                continue;
            }
            let representative = rgap.edge_at_mut(edge.id)?;
            if representative.live.intersection(&later.live).is_empty() {
                representative.add_live(&later.live);
                rgap.map_edge(later.id, edge.id);
                removed.insert(later.id);
            }
        }
    }
    Ok(rgap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_states() -> Vec<GraphState> {
        // node 0 lives in states 0..2, node 1 in 1..3, node 2 only in 0
        let mut dgraph = DynamicGraph::new();
        let a = dgraph.add_node(0);
        let c = dgraph.add_node(0);
        dgraph.remove_node(1, c);
        let b = dgraph.add_node(1);
        dgraph.add_edge(1, a, b);
        dgraph.remove_node(2, a);
        dgraph.build().unwrap();
        dgraph.states().to_vec()
    }

    #[test]
    fn live_times_cover_presence() {
        let states = chain_states();
        let live = node_live_times(&states);
        assert_eq!(live[&NodeId(0)].values(), &[0, 1]);
        assert_eq!(live[&NodeId(1)].values(), &[0]);
        assert_eq!(live[&NodeId(2)].values(), &[1, 2]);
    }

    #[test]
    fn supergraph_unions_ids() {
        let states = chain_states();
        let supergraph = supergraph(&states).unwrap();
        assert_eq!(supergraph.nodes().len(), 3);
        assert_eq!(supergraph.edges().len(), 1);
    }

    #[test]
    fn gap_merges_disjoint_nodes() {
        let states = chain_states();
        let nodes_live = node_live_times(&states);
        let edges_live = edge_live_times(&states);
        let supergraph = supergraph(&states).unwrap();
        let gap = build_gap(&supergraph, &nodes_live, &edges_live).unwrap();
        // node 1 (state 0 only) and node 2 (states 1..3) are disjoint and
        // share a partition; node 0 overlaps both
        assert_eq!(gap.graph().nodes().len(), 2);
        let rep_one = gap.node_at(NodeId(1)).unwrap().id;
        let rep_two = gap.node_at(NodeId(2)).unwrap().id;
        assert_eq!(rep_one, rep_two);
        assert_ne!(gap.node_at(NodeId(0)).unwrap().id, rep_one);
    }

    #[test]
    fn rgap_merges_parallel_disjoint_edges() {
        // two edges between the same pair, alive at different times
        let mut dgraph = DynamicGraph::new();
        let a = dgraph.add_node(0);
        let b = dgraph.add_node(0);
        let e0 = dgraph.add_edge(0, a, b);
        dgraph.remove_edge(1, e0);
        let e1 = dgraph.add_edge(2, a, b);
        dgraph.build().unwrap();

        let states = dgraph.states().to_vec();
        let nodes_live = node_live_times(&states);
        let edges_live = edge_live_times(&states);
        let supergraph = supergraph(&states).unwrap();
        let gap = build_gap(&supergraph, &nodes_live, &edges_live).unwrap();
        assert_eq!(gap.graph().edges().len(), 2);
        let rgap = reduce_gap(&gap).unwrap();
        assert_eq!(rgap.graph().edges().len(), 1);
        assert_eq!(rgap.edge_at(e1).unwrap().id, e0);
        assert_eq!(rgap.edge_at(e0).unwrap().live.values(), &[0, 2]);
    }

    #[test]
    fn shared_nodes_share_positions_without_tolerance() {
        let mut dgraph = DynamicGraph::new();
        let a = dgraph.add_node(0);
        let b = dgraph.add_node(0);
        dgraph.add_edge(0, a, b);
        let c = dgraph.add_node(1);
        dgraph.add_edge(1, b, c);
        dgraph.build().unwrap();

        let layout = DefaultLayout::new(0.0);
        layout.apply(&mut dgraph).unwrap();
        let first = dgraph.states()[0].node_at(a).unwrap().pos;
        let second = dgraph.states()[1].node_at(a).unwrap().pos;
        assert_eq!(first, second);
    }

    #[test]
    fn distance_averages_shared_nodes() {
        let mut one = GraphState::new();
        let mut two = GraphState::new();
        for id in 0..2 {
            one.push_node(crate::model::Node::new(NodeId(id)));
            two.push_node(crate::model::Node::new(NodeId(id)));
        }
        two.node_at_mut(NodeId(0)).unwrap().pos = Coord::new(3.0, 4.0);
        let layout = DefaultLayout::new(0.0);
        // (5.0 + 0.0) / 2 shared nodes
        assert_eq!(layout.distance(&one, &two), 2.5);
    }
}
