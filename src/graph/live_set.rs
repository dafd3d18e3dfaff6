use std::cmp::Ordering;

/// The set of keyframe indices in which a node or an edge exists.
///
/// Stored as a sorted sequence; callers add time points in non-decreasing
/// order, which the merge-based set operations rely on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveSet {
    values: Vec<u32>,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, time: u32) {
        debug_assert!(self.values.last().map_or(true, |&last| last <= time));
        if self.values.last() != Some(&time) {
            self.values.push(time);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn intersection(&self, other: &LiveSet) -> LiveSet {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.values.len() && j < other.values.len() {
            match self.values[i].cmp(&other.values[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    result.push(self.values[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        LiveSet { values: result }
    }

    pub fn union(&self, other: &LiveSet) -> LiveSet {
        let mut result = Vec::with_capacity(self.values.len() + other.values.len());
        let (mut i, mut j) = (0, 0);
        while i < self.values.len() && j < other.values.len() {
            match self.values[i].cmp(&other.values[j]) {
                Ordering::Less => {
                    result.push(self.values[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    result.push(other.values[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    result.push(self.values[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        result.extend_from_slice(&self.values[i..]);
        result.extend_from_slice(&other.values[j..]);
        LiveSet { values: result }
    }

    /// In-place union with another set.
    pub fn join(&mut self, other: &LiveSet) {
        *self = self.union(other);
    }
}
