use eg_core::{AgentId, CellCoord, EgError, Tick};
use eg_crowd::CrowdError;
use eg_grid::LayoutError;
use eg_hazard::HazardError;
use eg_route::RouteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("agent {agent} cannot start at {coord}: {reason}")]
    InvalidPosition {
        agent:  AgentId,
        coord:  CellCoord,
        reason: &'static str,
    },

    #[error("invariant violated at {tick}: {detail}")]
    Invariant { tick: Tick, detail: String },

    #[error(transparent)]
    Core(#[from] EgError),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("hazard error: {0}")]
    Hazard(#[from] HazardError),

    #[error("routing error: {0}")]
    Route(#[from] RouteError),

    #[error("crowd error: {0}")]
    Crowd(#[from] CrowdError),
}

pub type SimResult<T> = Result<T, SimError>;
