//! Per-cell occupant counts.

use eg_core::CellId;

/// Number of occupants standing on each cell, indexed by `CellId`.
///
/// Mutated only by the crowd resolver and initial placement.  Exit cells
/// never retain occupants: an occupant stepping onto an exit escapes and is
/// released in the same tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Occupancy {
    counts: Vec<u32>,
}

impl Occupancy {
    pub fn new(cell_count: usize) -> Self {
        Self { counts: vec![0; cell_count] }
    }

    #[inline]
    pub fn count(&self, cell: CellId) -> u32 {
        self.counts[cell.index()]
    }

    #[inline]
    pub fn is_occupied(&self, cell: CellId) -> bool {
        self.counts[cell.index()] > 0
    }

    #[inline]
    pub fn enter(&mut self, cell: CellId) {
        self.counts[cell.index()] += 1;
    }

    #[inline]
    pub fn leave(&mut self, cell: CellId) {
        let c = &mut self.counts[cell.index()];
        *c = c.saturating_sub(1);
    }

    /// Total occupants on the grid.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// All counts, indexed by `CellId`.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}
