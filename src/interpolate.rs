use crate::error::{GraphError, Result};
use crate::graph::dynamic::DynamicGraph;
use crate::graph::GraphState;

/// A building block of the transition between two keyframes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing changes.
    Idle,
    /// New elements fade in (alpha 0 -> 1).
    Appear,
    /// Old elements fade out (alpha 1 -> 0).
    Disappear,
    /// Positions interpolate from the current keyframe to the next.
    Morph,
    /// Appear, disappear and morph fused into one phase.
    Simultaneous,
}

/// Animation flags accumulated while walking the phase schedule up to a
/// point in time within one transition.
#[derive(Clone, Copy, Debug, Default)]
struct FrameState {
    interpolation: f32,
    alpha: f32,
    adding: bool,
    added: bool,
    deleting: bool,
    deleted: bool,
}

/// Turns a laid-out keyframe sequence into a continuous animation.
///
/// A transition between adjacent keyframes is described by an ordered
/// phase schedule; [`frame`](Self::frame) samples the animation at an
/// arbitrary time and produces a keyframe with interpolated positions and
/// fade alphas.
#[derive(Clone, Debug)]
pub struct Interpolator {
    phases: Vec<Phase>,
    idle_time: f32,
    appear_time: f32,
    disappear_time: f32,
    morph_time: f32,
    simultaneous_time: f32,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::phased()
    }
}

impl Interpolator {
    /// The stock phased schedule: idle, disappear, morph, appear.
    pub fn phased() -> Self {
        Self {
            phases: vec![Phase::Idle, Phase::Disappear, Phase::Morph, Phase::Appear],
            idle_time: 0.5,
            appear_time: 0.25,
            disappear_time: 0.25,
            morph_time: 1.0,
            simultaneous_time: 1.5,
        }
    }

    /// The stock simultaneous schedule: idle, simultaneous.
    pub fn simultaneous() -> Self {
        let mut interpolator = Self::phased();
        interpolator.phases = vec![Phase::Idle, Phase::Simultaneous];
        interpolator
    }

    /// An interpolator with a custom schedule; see
    /// [`set_phases`](Self::set_phases) for the validity rules.
    pub fn with_phases(phases: Vec<Phase>) -> Result<Self> {
        let mut interpolator = Self::phased();
        interpolator.set_phases(phases)?;
        Ok(interpolator)
    }

    /// Replaces the phase schedule.
    ///
    /// Either all three of appear, disappear and morph occur exactly once
    /// and simultaneous does not, or simultaneous occurs exactly once and
    /// none of the other three do. Idle may appear any number of times.
    /// On failure the previous schedule is retained.
    pub fn set_phases(&mut self, phases: Vec<Phase>) -> Result<()> {
        let count = |phase: Phase| phases.iter().filter(|&&p| p == phase).count();
        let appears = count(Phase::Appear);
        let disappears = count(Phase::Disappear);
        let morphs = count(Phase::Morph);
        let simultaneous = count(Phase::Simultaneous);
        if appears > 1 || disappears > 1 || morphs > 1 || simultaneous > 1 {
            return Err(GraphError::InvalidPhases(
                "a phase other than idle is present multiple times",
            ));
        }
        let any_of_three = appears > 0 || disappears > 0 || morphs > 0;
        let all_three = appears == 1 && disappears == 1 && morphs == 1;
        if (simultaneous == 0 && !all_three) || (simultaneous == 1 && any_of_three) {
            return Err(GraphError::InvalidPhases(
                "expected appear, disappear and morph exactly once, or simultaneous alone",
            ));
        }
        self.phases = phases;
        Ok(())
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Duration of a phase type in seconds. Defaults: idle 0.5, appear
    /// 0.25, disappear 0.25, morph 1.0, simultaneous 1.5.
    pub fn duration(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Idle => self.idle_time,
            Phase::Appear => self.appear_time,
            Phase::Disappear => self.disappear_time,
            Phase::Morph => self.morph_time,
            Phase::Simultaneous => self.simultaneous_time,
        }
    }

    pub fn set_duration(&mut self, phase: Phase, value: f32) {
        match phase {
            Phase::Idle => self.idle_time = value,
            Phase::Appear => self.appear_time = value,
            Phase::Disappear => self.disappear_time = value,
            Phase::Morph => self.morph_time = value,
            Phase::Simultaneous => self.simultaneous_time = value,
        }
    }

    /// Length of one transition: the sum of the scheduled phases'
    /// durations.
    pub fn transition_duration(&self) -> f32 {
        self.phases.iter().map(|&p| self.duration(p)).sum()
    }

    /// Length of the whole animation:
    /// `(state_count - 1) * transition_duration`.
    pub fn length(&self, dgraph: &DynamicGraph) -> f32 {
        dgraph.states().len().saturating_sub(1) as f32 * self.transition_duration()
    }

    /// Samples the animation at `time`, producing the keyframe to draw.
    ///
    /// The result holds the outgoing elements of the surrounding earlier
    /// keyframe, the stable elements, and the incoming elements of the
    /// later keyframe, with positions interpolated by the morph progress
    /// and alphas set from the appear/disappear progress.
    ///
    /// Fails with `OutOfRange` if `time` is negative or past
    /// [`length`](Self::length).
    pub fn frame(&self, dgraph: &DynamicGraph, time: f32) -> Result<GraphState> {
        if time < 0.0 {
            return Err(GraphError::OutOfRange("time before animation start"));
        }
        if time > self.length(dgraph) {
            return Err(GraphError::OutOfRange("time past animation end"));
        }
        if dgraph.states().is_empty() {
            return Ok(GraphState::new());
        }
        let transition = self.transition_duration();
        let last = dgraph.states().len() - 1;
        let index_one = ((time / transition).floor() as usize).min(last);
        let index_two = ((time / transition).ceil() as usize).min(last);
        let local = time - index_one as f32 * transition;

        let animation = self.animation_at(local)?;

        let mut current = dgraph.states()[index_one].clone();
        let next = &dgraph.states()[index_two];

        for node in current.nodes_mut() {
            node.is_new = false;
        }
        for edge in current.edges_mut() {
            edge.is_new = false;
        }
        for node in next.nodes() {
            if node.is_new {
                let mut node = node.clone();
                node.is_old = false;
                current.push_node(node);
            }
        }
        for edge in next.edges() {
            if edge.is_new {
                let mut edge = edge.clone();
                edge.is_old = false;
                current.push_edge(edge)?;
            }
        }

        for node in current.nodes_mut() {
            if let Ok(target) = next.node_at(node.id) {
                node.pos.x = lerp(node.pos.x, target.pos.x, animation.interpolation);
                node.pos.y = lerp(node.pos.y, target.pos.y, animation.interpolation);
            }
            apply_alpha(node.is_new, node.is_old, &mut node.alpha, &animation);
        }
        for edge in current.edges_mut() {
            apply_alpha(edge.is_new, edge.is_old, &mut edge.alpha, &animation);
        }
        Ok(current)
    }

    /// Walks the schedule: phases fully before `local` run to completion,
    /// the phase containing `local` runs partially.
    fn animation_at(&self, local: f32) -> Result<FrameState> {
        let mut animation = FrameState::default();
        let mut remaining = local;
        for &phase in &self.phases {
            let duration = self.duration(phase);
            if remaining < duration {
                self.perform_phase(phase, remaining, &mut animation);
                return Ok(animation);
            }
            self.perform_phase(phase, duration, &mut animation);
            remaining -= duration;
        }
        if remaining <= 0.0 {
            // local == transition_duration, all phases completed
            return Ok(animation);
        }
        Err(GraphError::OutOfRange("time overflows the phase schedule"))
    }

    fn perform_phase(&self, phase: Phase, time: f32, animation: &mut FrameState) {
        let duration = self.duration(phase);
        match phase {
            Phase::Idle => {}
            Phase::Appear => {
                animation.adding = time < duration;
                animation.alpha = time / duration;
                if time >= duration {
                    animation.added = true;
                }
            }
            Phase::Disappear => {
                animation.deleting = time < duration;
                animation.alpha = time / duration;
                if time >= duration {
                    animation.deleted = true;
                }
            }
            Phase::Morph => {
                animation.interpolation = time / duration;
            }
            Phase::Simultaneous => {
                animation.adding = time < duration;
                animation.deleting = time < duration;
                animation.alpha = time / duration;
                animation.interpolation = time / duration;
                if time >= duration {
                    animation.added = true;
                    animation.deleted = true;
                }
            }
        }
    }
}

fn lerp(a: f32, b: f32, value: f32) -> f32 {
    a + value * (b - a)
}

fn apply_alpha(is_new: bool, is_old: bool, alpha: &mut f32, animation: &FrameState) {
    if !is_new && !is_old {
        return;
    }
    if is_new && !animation.added {
        *alpha = 0.0;
    }
    if is_old && animation.deleted {
        *alpha = 0.0;
    }
    let appearing = is_new && animation.adding && !animation.added;
    let disappearing = is_old && animation.deleting;
    if appearing || disappearing {
        let ape = if appearing { 1.0 } else { 0.0 };
        let dis = if disappearing { 1.0 } else { 0.0 };
        *alpha = ((1.0 - ape) + animation.alpha * ape) * (1.0 - animation.alpha * dis);
    }
}
