use kinema::{DynamicGraph, NodeId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic stand-in for an external random-graph generator: a
/// dynamic graph that grows over `steps` keyframes, occasionally wiring
/// new edges to earlier nodes and retiring old ones.
pub fn sample_dynamic_graph(steps: usize, seed: u64) -> DynamicGraph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut dgraph = DynamicGraph::new();
    let mut alive: Vec<NodeId> = Vec::new();

    for step in 0..steps {
        let id = dgraph.add_node(step);
        if let Some(&anchor) = pick(&mut rng, &alive) {
            dgraph.add_edge(step, anchor, id);
        }
        alive.push(id);
        if alive.len() > 4 && rng.gen_bool(0.3) {
            let index = rng.gen_range(0..alive.len() - 2);
            let doomed = alive.remove(index);
            dgraph.remove_node(step, doomed);
        }
    }
    dgraph.build().expect("sample graph builds");
    dgraph
}

fn pick<'a, T>(rng: &mut ChaCha8Rng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.gen_range(0..items.len()))
    }
}
