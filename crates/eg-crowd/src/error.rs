use eg_core::AgentId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CrowdError {
    #[error("crowd configuration error: {0}")]
    Config(String),

    #[error("agent {agent} has non-positive speed {speed}")]
    BadSpeed { agent: AgentId, speed: f32 },

    #[error("{what} length {got} does not match agent count {expected}")]
    LengthMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },
}

pub type CrowdResult<T> = Result<T, CrowdError>;
