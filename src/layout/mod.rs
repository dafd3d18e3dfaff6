pub mod foresighted;
pub mod foresighted_parallel;
pub mod fruchterman;
pub mod grid;
pub mod parallel;

use std::fmt;
use std::sync::Arc;

use crate::graph::Graph;
use crate::model::{GraphEdge, GraphNode};

/// A cooling schedule: how many iterations to run, the starting
/// temperature, and the annealing function applied after each iteration.
#[derive(Clone)]
pub struct Cooling {
    pub iterations: u32,
    pub start_temperature: f32,
    anneal: Arc<dyn Fn(f32) -> f32 + Send + Sync>,
}

impl Cooling {
    pub fn new(
        iterations: u32,
        start_temperature: f32,
        anneal: impl Fn(f32) -> f32 + Send + Sync + 'static,
    ) -> Self {
        Self {
            iterations,
            start_temperature,
            anneal: Arc::new(anneal),
        }
    }

    /// The temperature for the next iteration.
    pub fn anneal(&self, temperature: f32) -> f32 {
        (self.anneal)(temperature)
    }
}

impl fmt::Debug for Cooling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cooling")
            .field("iterations", &self.iterations)
            .field("start_temperature", &self.start_temperature)
            .finish_non_exhaustive()
    }
}

/// A static layout algorithm, as consumed by the foresighted engine.
///
/// [`apply`](Self::apply) lays out a whole graph from scratch;
/// [`iteration`](Self::iteration) runs a single relaxation step at a given
/// temperature and is what the tolerance refinement drives directly. Both
/// place every node within `[-w/2, w/2] x [-h/2, h/2]`.
pub trait StaticLayout {
    fn apply<N: GraphNode, E: GraphEdge>(&self, graph: &mut Graph<N, E>, width: f32, height: f32);

    fn iteration<N: GraphNode, E: GraphEdge>(
        &self,
        graph: &mut Graph<N, E>,
        width: f32,
        height: f32,
        temperature: f32,
    );

    /// The unit temperature values are expressed in, relative to the
    /// canvas diagonal.
    fn relative_unit(&self, width: f32, height: f32) -> f32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooling_anneals() {
        let cooling = Cooling::new(10, 1.0, |t| t * 0.5);
        assert_eq!(cooling.anneal(1.0), 0.5);
        assert_eq!(cooling.anneal(0.5), 0.25);
    }
}
