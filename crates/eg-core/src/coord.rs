//! Human-facing cell coordinates.

use std::fmt;

/// A cell position within the building: floor index, then row and column on
/// that floor's plan.
///
/// Ordering is lexicographic `(floor, row, col)`, which is also the order of
/// the corresponding dense [`CellId`](crate::CellId)s.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellCoord {
    pub floor: u16,
    pub row:   u16,
    pub col:   u16,
}

impl CellCoord {
    #[inline]
    pub fn new(floor: u16, row: u16, col: u16) -> Self {
        Self { floor, row, col }
    }

    /// Planar Chebyshev distance, ignoring floors.
    #[inline]
    pub fn chebyshev(self, other: CellCoord) -> u16 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// Planar Manhattan distance, ignoring floors.
    #[inline]
    pub fn manhattan(self, other: CellCoord) -> u32 {
        self.row.abs_diff(other.row) as u32 + self.col.abs_diff(other.col) as u32
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}({}, {})", self.floor, self.row, self.col)
    }
}
