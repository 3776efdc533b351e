//! Routing error type.

use thiserror::Error;

use eg_core::{CellCoord, CellId};

/// Errors produced by `eg-route`.
///
/// `NoRoute` is recoverable: the agent is marked blocked and asks again on a
/// later tick.  The other variants indicate a caller bug.
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("no passable route from {from} to any exit")]
    NoRoute { from: CellCoord },

    #[error("route requested from non-walkable cell {0}")]
    NotWalkable(CellCoord),

    #[error("{0} lies outside the grid")]
    OutOfBounds(CellId),
}

pub type RouteResult<T> = Result<T, RouteError>;
