//! Layout construction errors.

use thiserror::Error;

use eg_core::CellCoord;

use crate::CellKind;

/// Fatal, construction-time problems with a building layout.  A layout that
/// produces one of these never reaches the simulation.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("layout has zero floors, rows or columns")]
    Empty,

    #[error("{0} lies outside the grid")]
    OutOfBounds(CellCoord),

    #[error("{coord} declared as {requested:?} but already declared as {existing:?}")]
    Conflicting {
        coord:     CellCoord,
        existing:  CellKind,
        requested: CellKind,
    },

    #[error("floor {floor} plan line {line} is {got} columns wide, expected {expected}")]
    PlanWidth {
        floor:    u16,
        line:     usize,
        got:      usize,
        expected: usize,
    },

    #[error("floor {floor} plan has {got} rows, expected {expected}")]
    PlanHeight {
        floor:    u16,
        got:      usize,
        expected: usize,
    },

    #[error("unknown plan glyph {glyph:?} at {coord}")]
    UnknownGlyph { glyph: char, coord: CellCoord },

    #[error("stair link {from} -> {to} must join Stair cells on adjacent floors")]
    BadStairLink { from: CellCoord, to: CellCoord },

    #[error("fire resistance {value} at {coord} is outside [0, 1]")]
    BadResistance { coord: CellCoord, value: f32 },

    #[error("layout declares no exit")]
    NoExit,

    #[error("{count} walkable cell(s) cannot reach any exit, first at {first}")]
    Unreachable { first: CellCoord, count: usize },
}

pub type LayoutResult<T> = Result<T, LayoutError>;
