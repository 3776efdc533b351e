//! Framework error type.
//!
//! Sub-crates define their own error enums (`LayoutError`, `RouteError`,
//! `SimError`, …) and wrap `EgError` where they need the shared variants.

use thiserror::Error;

use crate::{AgentId, CellId};

/// The base error type shared by the `eg-*` crates.
#[derive(Debug, Error)]
pub enum EgError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("cell {0} is outside the grid")]
    CellOutOfBounds(CellId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for the `eg-*` crates.
pub type EgResult<T> = Result<T, EgError>;
