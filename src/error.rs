use crate::core::value::Name;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    /// The algorithm yielded a step the driver cannot accept; a defect in the exercise.
    #[error("protocol violation at step {index}: {reason}")]
    ProtocolViolation { index: i64, reason: String },

    #[error("no entry named `{0}`")]
    NotFound(Name),

    #[error("cannot delete index {index} of a sequence of length {len}")]
    NonContiguous { index: usize, len: usize },

    #[error("driver is {actual}, expected {expected}")]
    InvalidPhase {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown exercise `{0}`")]
    UnknownExercise(String),

    #[error("invalid answer pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("malformed persisted state: {0}")]
    State(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraceError {
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }
}

pub type TraceResult<T> = Result<T, TraceError>;
