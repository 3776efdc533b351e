//! Cell kinds and traversal cost units.

/// Traversal costs are fixed-point integers so priority queues order them
/// totally and identically on every platform.  One orthogonal step = 1,000.
pub const COST_SCALE: u32 = 1_000;

/// Cost of an orthogonal step within a floor.
pub const ORTHOGONAL_COST: u32 = COST_SCALE;

/// Cost of a diagonal step within a floor (√2, rounded down so the octile
/// heuristic stays admissible).
pub const DIAGONAL_COST: u32 = 1_414;

/// What occupies a cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellKind {
    /// Free floor space.
    Open,
    /// Impassable.  Never occupied, never on a route.
    #[default]
    Wall,
    /// Staircase landing; may carry links to landings on adjacent floors.
    Stair,
    /// Building exit.  Entering one ends the occupant's evacuation.
    Exit,
}

impl CellKind {
    #[inline]
    pub fn is_walkable(self) -> bool {
        !matches!(self, CellKind::Wall)
    }

    /// Single-character plan glyph, the inverse of the ASCII plan parser.
    pub fn glyph(self) -> char {
        match self {
            CellKind::Open  => '.',
            CellKind::Wall  => '#',
            CellKind::Stair => 'S',
            CellKind::Exit  => 'E',
        }
    }
}

/// Which planar neighbors a cell has.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connectivity {
    /// North, east, south, west.
    Four,
    /// The four orthogonal neighbors plus diagonals.  Diagonal steps may not
    /// cut a wall corner.
    #[default]
    Eight,
}

/// Planar offsets in neighbor order: N, E, S, W, NE, SE, SW, NW.
pub(crate) const OFFSETS: [(i32, i32); 8] = [
    (-1, 0), (0, 1), (1, 0), (0, -1),
    (-1, 1), (1, 1), (1, -1), (-1, -1),
];
