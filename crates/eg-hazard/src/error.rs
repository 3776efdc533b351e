use eg_core::{CellCoord, CellId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HazardError {
    #[error("fire seed cell {0} is outside the grid")]
    SeedOutOfBounds(CellId),

    #[error("fire seed at {0} is on a wall")]
    SeedOnWall(CellCoord),

    #[error("hazard configuration error: {0}")]
    Config(String),
}

pub type HazardResult<T> = Result<T, HazardError>;
