use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::graph::Graph;
use crate::layout::grid::OptimizationGrid;
use crate::layout::{Cooling, StaticLayout};
use crate::model::{Coord, GraphEdge, GraphNode};

const SMALL_OFFSET: f32 = 0.001;
const UNIT_COEFF: f32 = 0.68;
const PLACEMENT_RADIUS: f32 = 0.333;

/// Force-directed static layout after Fruchterman and Reingold.
///
/// A full [`apply`](StaticLayout::apply) first places the nodes on a
/// circle, then runs two annealed passes: a hot one that untangles the
/// graph and a cold one that settles it. Repulsion is by default limited
/// to pairs within a `2k` radius via [`OptimizationGrid`]; switching to
/// global repulsion disables the grid.
pub struct FruchtermanReingold {
    k_coeff: f32,
    border_force: f32,
    global_repulsion: bool,
    first_cooling: Cooling,
    second_cooling: Cooling,
}

impl Default for FruchtermanReingold {
    fn default() -> Self {
        Self {
            k_coeff: 0.6,
            border_force: 0.6,
            global_repulsion: false,
            first_cooling: Cooling::new(500, 0.8, |t| t * 0.9893),
            second_cooling: Cooling::new(500, 0.05, |t| t * 0.993),
        }
    }
}

impl FruchtermanReingold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficient for the parameter `k` representing the preferred edge
    /// length. Default 0.6.
    pub fn set_k_coeff(&mut self, coeff: f32) {
        self.k_coeff = coeff;
    }

    /// Strength of the canvas border repulsion relative to node-node
    /// repulsion. Default 0.6.
    pub fn set_border_force(&mut self, coeff: f32) {
        self.border_force = coeff;
    }

    /// Computes repulsion between all pairs instead of only pairs within
    /// the `2k` radius. Off by default; turning it on usually wants a
    /// stronger border force as well.
    pub fn use_global_repulsion(&mut self, value: bool) {
        self.global_repulsion = value;
    }

    pub fn set_first_cooling(&mut self, cooling: Cooling) {
        self.first_cooling = cooling;
    }

    pub fn set_second_cooling(&mut self, cooling: Cooling) {
        self.second_cooling = cooling;
    }

    fn initial_placement<N: GraphNode, E: GraphEdge>(
        graph: &mut Graph<N, E>,
        width: f32,
        height: f32,
    ) {
        let radius = width.min(height) * PLACEMENT_RADIUS;
        let angle = std::f32::consts::TAU / graph.nodes().len() as f32;
        for (i, node) in graph.nodes_mut().iter_mut().enumerate() {
            let pos = node.pos_mut();
            pos.x = (i as f32 * angle).cos() * radius;
            pos.y = (i as f32 * angle).sin() * radius;
        }
    }

    fn pass<N: GraphNode, E: GraphEdge>(
        &self,
        graph: &mut Graph<N, E>,
        width: f32,
        height: f32,
        cooling: &Cooling,
    ) {
        let mut temperature = cooling.start_temperature;
        for _ in 0..cooling.iterations {
            self.iteration(graph, width, height, temperature);
            temperature = cooling.anneal(temperature);
        }
    }

    /// Net border repulsion along one axis for a node at `coord` between
    /// borders at `-size/2` and `size/2`.
    fn border_displacement(&self, k: f32, size: f32, coord: f32) -> f32 {
        let displace = |border: f32| {
            (k * k * self.border_force) / ((border - coord).abs() + (size * SMALL_OFFSET).abs())
        };
        displace(-size * 0.5) - displace(size * 0.5)
    }

    fn repulsive_forces<N: GraphNode, E: GraphEdge>(
        &self,
        graph: &Graph<N, E>,
        width: f32,
        height: f32,
        k: f32,
        temperature: f32,
        disp: &mut [Coord],
    ) {
        // Coincident nodes get a random-angle nudge; the fixed seed keeps
        // the layout reproducible across runs and threads.
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let nodes = graph.nodes();
        let pair = |i: usize, j: usize, rng: &mut ChaCha8Rng, disp: &mut [Coord]| {
            let diff_x = nodes[j].pos().x - nodes[i].pos().x;
            let diff_y = nodes[j].pos().y - nodes[i].pos().y;
            let dist = (diff_x * diff_x + diff_y * diff_y).sqrt();
            if dist == 0.0 {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let r = temperature * 0.5;
                disp[i].x -= angle.cos() * r;
                disp[i].y -= angle.sin() * r;
                disp[j].x += angle.cos() * r;
                disp[j].y += angle.sin() * r;
            } else if self.global_repulsion || dist < k * 2.0 {
                let force = (1.0 / dist) * (k * k / dist);
                disp[i].x -= diff_x * force;
                disp[i].y -= diff_y * force;
                disp[j].x += diff_x * force;
                disp[j].y += diff_y * force;
            }
        };
        if self.global_repulsion {
            for i in 0..nodes.len() {
                for j in 0..i {
                    pair(i, j, &mut rng, disp);
                }
            }
        } else {
            let mut grid = OptimizationGrid::new(width, height, k);
            for (i, node) in nodes.iter().enumerate() {
                grid.add(node.pos(), i as u32);
            }
            for i in 0..nodes.len() {
                grid.for_each_around(nodes[i].pos(), |j| {
                    let j = j as usize;
                    if j < i {
                        pair(i, j, &mut rng, disp);
                    }
                });
            }
        }
    }

    fn attractive_forces<N: GraphNode, E: GraphEdge>(
        &self,
        graph: &Graph<N, E>,
        k: f32,
        disp: &mut [Coord],
    ) {
        for edge in graph.edges() {
            let (Ok(one), Ok(two)) = (
                graph.node_index(edge.one_id()),
                graph.node_index(edge.two_id()),
            ) else {
                continue;
            };
            let nodes = graph.nodes();
            let diff_x = nodes[two].pos().x - nodes[one].pos().x;
            let diff_y = nodes[two].pos().y - nodes[one].pos().y;
            let dist = (diff_x * diff_x + diff_y * diff_y).sqrt();
            if dist != 0.0 {
                let force = (1.0 / dist) * (dist * dist / k);
                disp[one].x += diff_x * force;
                disp[one].y += diff_y * force;
                disp[two].x -= diff_x * force;
                disp[two].y -= diff_y * force;
            }
        }
    }

    fn displacement<N: GraphNode, E: GraphEdge>(
        graph: &mut Graph<N, E>,
        width: f32,
        height: f32,
        temperature: f32,
        disp: &[Coord],
    ) {
        for (node, d) in graph.nodes_mut().iter_mut().zip(disp) {
            let len = (d.x * d.x + d.y * d.y).sqrt();
            let pos = node.pos_mut();
            if len != 0.0 {
                let scale = len.min(temperature) / len;
                pos.x += scale * d.x;
                pos.y += scale * d.y;
            }
            pos.x = pos.x.clamp(-width * 0.5, width * 0.5);
            pos.y = pos.y.clamp(-height * 0.5, height * 0.5);
        }
    }
}

impl StaticLayout for FruchtermanReingold {
    fn apply<N: GraphNode, E: GraphEdge>(&self, graph: &mut Graph<N, E>, width: f32, height: f32) {
        if graph.nodes().is_empty() {
            return;
        }
        Self::initial_placement(graph, width, height);
        self.pass(graph, width, height, &self.first_cooling);
        self.pass(graph, width, height, &self.second_cooling);
    }

    fn iteration<N: GraphNode, E: GraphEdge>(
        &self,
        graph: &mut Graph<N, E>,
        width: f32,
        height: f32,
        temperature: f32,
    ) {
        let count = graph.nodes().len();
        if count == 0 {
            return;
        }
        let area = width * height;
        let k = self.k_coeff * (area / count as f32).sqrt();
        let temperature = temperature * self.relative_unit(width, height);

        let mut disp = vec![Coord::default(); count];
        for (node, d) in graph.nodes().iter().zip(disp.iter_mut()) {
            d.x = self.border_displacement(k, width, node.pos().x);
            d.y = self.border_displacement(k, height, node.pos().y);
        }
        self.repulsive_forces(graph, width, height, k, temperature, &mut disp);
        self.attractive_forces(graph, k, &mut disp);
        Self::displacement(graph, width, height, temperature, &disp);
    }

    fn relative_unit(&self, width: f32, height: f32) -> f32 {
        (width * width + height * height).sqrt() * UNIT_COEFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphState;
    use crate::model::{Edge, EdgeId, Node, NodeId};

    fn ring(count: u64) -> GraphState {
        let mut graph = GraphState::new();
        for id in 0..count {
            graph.push_node(Node::new(NodeId(id)));
        }
        for id in 0..count {
            graph
                .push_edge(Edge::new(EdgeId(id), NodeId(id), NodeId((id + 1) % count)))
                .unwrap();
        }
        graph
    }

    fn max_abs(graph: &GraphState) -> (f32, f32) {
        graph.nodes().iter().fold((0.0f32, 0.0f32), |(x, y), n| {
            (x.max(n.pos.x.abs()), y.max(n.pos.y.abs()))
        })
    }

    #[test]
    fn empty_graph_is_untouched() {
        let mut graph = GraphState::new();
        FruchtermanReingold::new().apply(&mut graph, 1.0, 1.0);
        assert!(graph.nodes().is_empty());
    }

    #[test]
    fn layout_respects_canvas_bounds() {
        let mut graph = ring(12);
        FruchtermanReingold::new().apply(&mut graph, 2.0, 1.0);
        let (x, y) = max_abs(&graph);
        assert!(x <= 1.0, "x overflow: {x}");
        assert!(y <= 0.5, "y overflow: {y}");
    }

    #[test]
    fn layout_is_deterministic() {
        let layout = FruchtermanReingold::new();
        let mut one = ring(8);
        let mut two = ring(8);
        layout.apply(&mut one, 1.0, 1.0);
        layout.apply(&mut two, 1.0, 1.0);
        for (a, b) in one.nodes().iter().zip(two.nodes()) {
            assert_eq!(a.pos, b.pos);
        }
    }

    #[test]
    fn coincident_nodes_separate() {
        let mut graph = GraphState::new();
        graph.push_node(Node::new(NodeId(0)));
        graph.push_node(Node::new(NodeId(1)));
        // both start at the origin
        let layout = FruchtermanReingold::new();
        layout.iteration(&mut graph, 1.0, 1.0, 0.5);
        let a = graph.nodes()[0].pos;
        let b = graph.nodes()[1].pos;
        assert!(a.distance(b) > 0.0);
    }

    #[test]
    fn connected_pair_attracts() {
        let mut graph = GraphState::new();
        graph.push_node(Node::new(NodeId(0)));
        graph.push_node(Node::new(NodeId(1)));
        graph
            .push_edge(Edge::new(EdgeId(0), NodeId(0), NodeId(1)))
            .unwrap();
        graph.node_at_mut(NodeId(0)).unwrap().pos = Coord::new(-0.45, 0.0);
        graph.node_at_mut(NodeId(1)).unwrap().pos = Coord::new(0.45, 0.0);
        let before = graph.nodes()[0].pos.distance(graph.nodes()[1].pos);
        let layout = FruchtermanReingold::new();
        layout.iteration(&mut graph, 1.0, 1.0, 0.1);
        let after = graph.nodes()[0].pos.distance(graph.nodes()[1].pos);
        assert!(after < before, "{after} >= {before}");
    }
}
