//! Fluent construction of a [`GridMap`].
//!
//! Plans can be written as ASCII art, drawn with geometric primitives, or
//! both.  Drawing methods never fail on the spot; the first problem is
//! remembered and reported by [`GridMapBuilder::build`], which also rejects
//! layouts where some walkable cell cannot reach an exit.
//!
//! # Example
//!
//! ```
//! use eg_core::CellCoord;
//! use eg_grid::GridMapBuilder;
//!
//! let mut b = GridMapBuilder::new(1, 3, 5);
//! b.floor_from_ascii(0, "
//!     ######
//!     ....E
//!     ######
//! ");
//! let map = b.build().unwrap();
//! assert_eq!(map.exits().len(), 1);
//! let start = map.cell_at(CellCoord::new(0, 1, 0)).unwrap();
//! assert_eq!(map.exit_distance(start), Some(4_000));
//! ```

use eg_core::{CellCoord, CellId};
use tracing::{debug, info};

use crate::{CellKind, Connectivity, GridMap, LayoutError, LayoutResult, COST_SCALE};

/// Default stair crossing cost: three orthogonal steps.
const DEFAULT_STAIR_COST: f32 = 3.0;

/// Incremental builder for [`GridMap`].
///
/// Every cell starts as an undeclared `Wall`.  Two write modes exist:
///
/// - **paint** (`paint`, `fill_floor`, `wall_line`, `door`, `room_outline`,
///   `circle_obstacle`) overwrites whatever is there, like drawing on a plan.
/// - **declare** (`declare`, `floor_from_ascii`) is strict: declaring a cell
///   twice with different kinds is a [`LayoutError::Conflicting`].
pub struct GridMapBuilder {
    floors: u16,
    rows:   u16,
    cols:   u16,

    connectivity: Connectivity,
    stair_cost:   u32,

    kinds:      Vec<CellKind>,
    declared:   Vec<bool>,
    resistance: Vec<f32>,

    stair_links: Vec<(CellCoord, CellCoord)>,

    /// First error encountered while drawing; reported by `build`.
    error: Option<LayoutError>,
}

impl GridMapBuilder {
    /// Create a builder for `floors` floors of `rows × cols` cells each.
    pub fn new(floors: u16, rows: u16, cols: u16) -> Self {
        let n = floors as usize * rows as usize * cols as usize;
        Self {
            floors,
            rows,
            cols,
            connectivity: Connectivity::default(),
            stair_cost:   (DEFAULT_STAIR_COST * COST_SCALE as f32) as u32,
            kinds:        vec![CellKind::Wall; n],
            declared:     vec![false; n],
            resistance:   vec![0.0; n],
            stair_links:  Vec::new(),
            error:        None,
        }
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Cost of one stair crossing, in orthogonal-step units.
    pub fn with_stair_cost(mut self, cost: f32) -> Self {
        self.stair_cost = (cost.max(0.0) * COST_SCALE as f32).round() as u32;
        self
    }

    // ── Cell writes ───────────────────────────────────────────────────────

    fn index(&mut self, coord: CellCoord) -> Option<usize> {
        if coord.floor >= self.floors || coord.row >= self.rows || coord.col >= self.cols {
            self.fail(LayoutError::OutOfBounds(coord));
            return None;
        }
        Some(
            coord.floor as usize * self.rows as usize * self.cols as usize
                + coord.row as usize * self.cols as usize
                + coord.col as usize,
        )
    }

    fn fail(&mut self, err: LayoutError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Overwrite one cell.
    pub fn paint(&mut self, coord: CellCoord, kind: CellKind) -> &mut Self {
        if let Some(i) = self.index(coord) {
            self.kinds[i] = kind;
            self.declared[i] = true;
        }
        self
    }

    /// Declare one cell.  Re-declaring with a different kind is an error.
    pub fn declare(&mut self, coord: CellCoord, kind: CellKind) -> &mut Self {
        if let Some(i) = self.index(coord) {
            if self.declared[i] && self.kinds[i] != kind {
                let existing = self.kinds[i];
                self.fail(LayoutError::Conflicting { coord, existing, requested: kind });
            } else {
                self.kinds[i] = kind;
                self.declared[i] = true;
            }
        }
        self
    }

    /// Paint every cell of `floor` as `kind`.
    pub fn fill_floor(&mut self, floor: u16, kind: CellKind) -> &mut Self {
        for row in 0..self.rows {
            for col in 0..self.cols {
                self.paint(CellCoord::new(floor, row, col), kind);
            }
        }
        self
    }

    /// Set the fire resistance of one cell (`0` ordinary, `1` fireproof).
    pub fn fire_resistance(&mut self, coord: CellCoord, value: f32) -> &mut Self {
        if !(0.0..=1.0).contains(&value) {
            self.fail(LayoutError::BadResistance { coord, value });
            return self;
        }
        if let Some(i) = self.index(coord) {
            self.resistance[i] = value;
        }
        self
    }

    /// Declare a floor from an ASCII plan.
    ///
    /// Blank lines and surrounding whitespace are ignored, so indented raw
    /// strings work.  Glyphs: `#` wall, `.` open, `S` stair, `E` exit, `%`
    /// fireproof open floor.
    pub fn floor_from_ascii(&mut self, floor: u16, plan: &str) -> &mut Self {
        let lines: Vec<&str> = plan
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() != self.rows as usize {
            self.fail(LayoutError::PlanHeight {
                floor,
                got:      lines.len(),
                expected: self.rows as usize,
            });
            return self;
        }
        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != self.cols as usize {
                self.fail(LayoutError::PlanWidth {
                    floor,
                    line:     row,
                    got:      width,
                    expected: self.cols as usize,
                });
                return self;
            }
            for (col, glyph) in line.chars().enumerate() {
                let coord = CellCoord::new(floor, row as u16, col as u16);
                let kind = match glyph {
                    '#' => CellKind::Wall,
                    '.' | '%' => CellKind::Open,
                    'S' => CellKind::Stair,
                    'E' => CellKind::Exit,
                    _ => {
                        self.fail(LayoutError::UnknownGlyph { glyph, coord });
                        return self;
                    }
                };
                self.declare(coord, kind);
                if glyph == '%' {
                    self.fire_resistance(coord, 1.0);
                }
            }
        }
        self
    }

    // ── Geometric primitives ──────────────────────────────────────────────

    /// Paint a straight wall from `from` to `to` (`(row, col)` pairs) using
    /// Bresenham's line algorithm.
    pub fn wall_line(&mut self, floor: u16, from: (u16, u16), to: (u16, u16)) -> &mut Self {
        for (row, col) in bresenham(from, to) {
            self.paint(CellCoord::new(floor, row, col), CellKind::Wall);
        }
        self
    }

    /// Carve an opening along the line from `from` to `to`.
    pub fn door(&mut self, floor: u16, from: (u16, u16), to: (u16, u16)) -> &mut Self {
        for (row, col) in bresenham(from, to) {
            self.paint(CellCoord::new(floor, row, col), CellKind::Open);
        }
        self
    }

    /// Paint the four walls of the axis-aligned rectangle with corners
    /// `top_left` and `bottom_right` (inclusive).
    pub fn room_outline(
        &mut self,
        floor:        u16,
        top_left:     (u16, u16),
        bottom_right: (u16, u16),
    ) -> &mut Self {
        let (r0, c0) = top_left;
        let (r1, c1) = bottom_right;
        self.wall_line(floor, (r0, c0), (r0, c1))
            .wall_line(floor, (r0, c1), (r1, c1))
            .wall_line(floor, (r1, c1), (r1, c0))
            .wall_line(floor, (r1, c0), (r0, c0))
    }

    /// Paint a filled disc of walls (pillars, furniture islands).
    pub fn circle_obstacle(&mut self, floor: u16, center: (u16, u16), radius: u16) -> &mut Self {
        let (cr, cc) = (center.0 as i32, center.1 as i32);
        let r = radius as i32;
        for row in (cr - r).max(0)..=(cr + r).min(self.rows as i32 - 1) {
            for col in (cc - r).max(0)..=(cc + r).min(self.cols as i32 - 1) {
                let (dr, dc) = (row - cr, col - cc);
                if dr * dr + dc * dc <= r * r {
                    self.paint(CellCoord::new(floor, row as u16, col as u16), CellKind::Wall);
                }
            }
        }
        self
    }

    /// Link two stair landings on adjacent floors.  Both ends must be
    /// `Stair` cells by the time [`build`](Self::build) runs.
    pub fn stair_link(&mut self, a: CellCoord, b: CellCoord) -> &mut Self {
        self.stair_links.push((a, b));
        self
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Validate the plan and produce an immutable [`GridMap`].
    ///
    /// # Errors
    ///
    /// Any drawing error recorded earlier, a bad stair link, a layout with
    /// no exit, or walkable cells with no path to an exit.
    pub fn build(self) -> LayoutResult<GridMap> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.floors == 0 || self.rows == 0 || self.cols == 0 {
            return Err(LayoutError::Empty);
        }

        let area = self.rows as usize * self.cols as usize;
        let id_of = |c: CellCoord| -> Option<CellId> {
            (c.floor < self.floors && c.row < self.rows && c.col < self.cols).then(|| {
                CellId((c.floor as usize * area + c.row as usize * self.cols as usize
                    + c.col as usize) as u32)
            })
        };

        let mut links = Vec::with_capacity(self.stair_links.len());
        for &(from, to) in &self.stair_links {
            let ok_floors = from.floor.abs_diff(to.floor) == 1;
            match (id_of(from), id_of(to)) {
                (Some(a), Some(b))
                    if ok_floors
                        && self.kinds[a.index()] == CellKind::Stair
                        && self.kinds[b.index()] == CellKind::Stair =>
                {
                    links.push((a, b));
                }
                _ => return Err(LayoutError::BadStairLink { from, to }),
            }
        }

        let map = GridMap::assemble(
            self.floors,
            self.rows,
            self.cols,
            self.connectivity,
            self.stair_cost,
            self.kinds,
            self.resistance,
            &links,
        );

        if map.exits().is_empty() {
            return Err(LayoutError::NoExit);
        }

        let unreachable: Vec<CellId> = map
            .walkable_cells()
            .filter(|&c| map.exit_distance(c).is_none())
            .collect();
        if let Some(&first) = unreachable.first() {
            return Err(LayoutError::Unreachable {
                first: map.coord(first),
                count: unreachable.len(),
            });
        }

        let walkable = map.walkable_cells().count();
        info!(
            floors = map.floors(),
            rows = map.rows(),
            cols = map.cols(),
            walkable,
            exits = map.exits().len(),
            stair_links = links.len(),
            "grid map built"
        );
        debug!(
            max_exit_distance = map.walkable_cells().filter_map(|c| map.exit_distance(c)).max(),
            "exit distance field computed"
        );
        Ok(map)
    }
}

/// Integer points on the segment `from → to`, endpoints included.
fn bresenham(from: (u16, u16), to: (u16, u16)) -> Vec<(u16, u16)> {
    let (mut r, mut c) = (from.0 as i32, from.1 as i32);
    let (r1, c1) = (to.0 as i32, to.1 as i32);
    let dr = (r1 - r).abs();
    let dc = (c1 - c).abs();
    let sr = if r < r1 { 1 } else { -1 };
    let sc = if c < c1 { 1 } else { -1 };
    let mut err = dr - dc;
    let mut points = Vec::with_capacity((dr.max(dc) + 1) as usize);
    loop {
        points.push((r as u16, c as u16));
        if r == r1 && c == c1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dc {
            err -= dc;
            r += sr;
        }
        if e2 < dr {
            err += dr;
            c += sc;
        }
    }
    points
}
