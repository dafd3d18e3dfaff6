use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A modification would leave a keyframe inconsistent: an edge whose
    /// endpoint is missing, or removal of an element that does not exist.
    #[error("invalid graph: {0}")]
    InvalidGraph(&'static str),
    /// Lookup of an id that is not present, or an interpolation time
    /// outside the animation.
    #[error("out of range: {0}")]
    OutOfRange(&'static str),
    /// The interpolator received a phase sequence that is neither a valid
    /// phased nor a valid simultaneous schedule.
    #[error("invalid phases: {0}")]
    InvalidPhases(&'static str),
    /// The keyframe text format was violated.
    #[error("parse error: {0}")]
    Parse(String),
}
