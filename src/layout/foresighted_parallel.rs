use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::graph::dynamic::DynamicGraph;
use crate::graph::GraphState;
use crate::layout::foresighted::ForesightedLayout;
use crate::layout::fruchterman::FruchtermanReingold;
use crate::layout::parallel::{StridedMut, WorkerPool};
use crate::layout::{Cooling, StaticLayout};
use crate::model::Coord;

/// Parallel foresighted layout over the default static layout.
pub type DefaultLayoutParallel = ParallelForesightedLayout<FruchtermanReingold>;

/// [`ForesightedLayout`] with the tolerance refinement spread over a fixed
/// worker pool. Produces the same layouts as the sequential engine, just
/// faster when a tolerance is set.
///
/// Keyframe indices are assigned to workers interleaved (worker `i` owns
/// `i, i + N, ...`) so that incrementally growing dynamic graphs - tiny
/// early keyframes, large late ones - balance naturally. Each refinement
/// round relaxes every worker's keyframes in parallel, then the calling
/// thread alone decides which relaxations to accept, exactly as the
/// sequential pass would.
pub struct ParallelForesightedLayout<S> {
    inner: ForesightedLayout<S>,
    pool: WorkerPool,
}

impl<S: StaticLayout + Default + Sync> ParallelForesightedLayout<S> {
    /// Engine over a default-constructed static layout.
    ///
    /// # Panics
    ///
    /// Panics if `threads` is zero.
    pub fn new(threads: usize, tolerance: f32) -> Self {
        Self::with_layout(S::default(), threads, tolerance)
    }
}

impl<S: StaticLayout + Sync> ParallelForesightedLayout<S> {
    /// # Panics
    ///
    /// Panics if `threads` is zero.
    pub fn with_layout(static_layout: S, threads: usize, tolerance: f32) -> Self {
        Self {
            inner: ForesightedLayout::with_layout(static_layout, tolerance),
            pool: WorkerPool::new(threads),
        }
    }

    /// Replaces the worker pool with one of `count` threads.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn set_threads(&mut self, count: usize) {
        self.pool = WorkerPool::new(count);
    }

    pub fn threads(&self) -> usize {
        self.pool.count()
    }

    pub fn set_canvas(&mut self, width: f32, height: f32, center: Coord) {
        self.inner.set_canvas(width, height, center);
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.inner.set_tolerance(tolerance);
    }

    pub fn use_relative_distance(&mut self, relative: bool) {
        self.inner.use_relative_distance(relative);
    }

    pub fn set_cooling(&mut self, cooling: Cooling) {
        self.inner.set_cooling(cooling);
    }

    pub fn static_layout(&self) -> &S {
        self.inner.static_layout()
    }

    pub fn static_layout_mut(&mut self) -> &mut S {
        self.inner.static_layout_mut()
    }

    /// Runs the algorithm, writing a position into every node of every
    /// keyframe.
    pub fn apply(&mut self, dgraph: &mut DynamicGraph) -> Result<()> {
        if dgraph.states().is_empty() {
            return Ok(());
        }
        let (width, height) = self.inner.calculation_canvas();
        self.inner.base_layout(dgraph.states_mut(), width, height)?;
        let tolerance = self.inner.tolerance_value();
        if tolerance != 0.0 {
            self.tolerance_pass(dgraph.states_mut(), width, height, tolerance);
        }
        self.inner.finish(dgraph.states_mut(), width, height);
        Ok(())
    }

    /// Parallel tolerance refinement.
    ///
    /// Every round has two halves separated by the pool's barrier. First
    /// each worker, on its own interleaved keyframe indices, reconciles
    /// the previous round's accept decisions (accepted copies become the
    /// state, rejected copies are reset from the state) and runs one
    /// static-layout iteration on its copies. Then the calling thread
    /// scans all keyframes in order and accepts a copy only if it stays
    /// within the drift bound of its already-decided left neighbor and
    /// its not-yet-updated right neighbor - the same decisions the
    /// sequential pass makes.
    fn tolerance_pass(
        &mut self,
        states: &mut [GraphState],
        width: f32,
        height: f32,
        tolerance: f32,
    ) {
        let tolerance = self.inner.tolerance_abs(states, width, height, tolerance);
        let cooling = self.inner.cooling().clone();
        let mut temperature = cooling.start_temperature;
        let mut copies: Vec<GraphState> = states.to_vec();
        let mut apply: Vec<bool> = vec![false; states.len()];
        let workers = self.pool.count();
        debug!(
            states = states.len(),
            workers,
            rounds = cooling.iterations,
            "parallel tolerance pass"
        );

        for _ in 0..cooling.iterations {
            {
                let state_views = StridedMut::split(states, workers);
                let copy_views = StridedMut::split(&mut copies, workers);
                let jobs: Vec<Mutex<Option<_>>> = state_views
                    .into_iter()
                    .zip(copy_views)
                    .map(|views| Mutex::new(Some(views)))
                    .collect();
                let apply = &apply;
                let layout = self.inner.static_layout();
                self.pool.for_each(|thread| {
                    let Some((mut state_view, mut copy_view)) = jobs[thread].lock().take() else {
                        return;
                    };
                    for ((index, state), (_, copy)) in
                        state_view.iter_mut().zip(copy_view.iter_mut())
                    {
                        if apply[index] {
                            state.clone_from(copy);
                        } else {
                            copy.clone_from(state);
                        }
                        layout.iteration(copy, width, height, temperature);
                    }
                });
            }
            // sequential accept scan; apply[s - 1] already carries this
            // round's decision when keyframe s is judged
            for s in 0..states.len() {
                let left = if s == 0 {
                    true
                } else {
                    let neighbor = if apply[s - 1] {
                        &copies[s - 1]
                    } else {
                        &states[s - 1]
                    };
                    self.inner.distance(&copies[s], neighbor) < tolerance
                };
                let right = s + 1 >= states.len()
                    || self.inner.distance(&copies[s], &states[s + 1]) < tolerance;
                apply[s] = left && right;
            }
            temperature = cooling.anneal(temperature);
        }
        // materialize the final round's decisions
        for (s, state) in states.iter_mut().enumerate() {
            if apply[s] {
                state.clone_from(&copies[s]);
            }
        }
    }
}
