pub mod error;
pub mod graph;
pub mod interpolate;
pub mod layout;
pub mod model;
pub mod parse;

pub use crate::error::{GraphError, Result};
pub use crate::graph::dynamic::DynamicGraph;
pub use crate::graph::{Graph, GraphState};
pub use crate::interpolate::{Interpolator, Phase};
pub use crate::layout::foresighted::{DefaultLayout, ForesightedLayout};
pub use crate::layout::foresighted_parallel::{DefaultLayoutParallel, ParallelForesightedLayout};
pub use crate::layout::fruchterman::FruchtermanReingold;
pub use crate::layout::parallel::{Barrier, WorkerPool};
pub use crate::layout::{Cooling, StaticLayout};
pub use crate::model::{Coord, Edge, EdgeId, GraphEdge, GraphNode, Node, NodeId};
