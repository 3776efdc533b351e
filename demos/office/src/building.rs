//! The two-floor office used by the demo.
//!
//! Each floor is 40 × 50 cells.  Two rooms line the north wall with doors
//! onto an open-plan area; a staircase sits in the south-east corner and the
//! only exit is a double door in the ground floor's west wall.

use eg_core::{CellCoord, CellId};
use eg_grid::{CellKind, GridMap, GridMapBuilder, LayoutError, LayoutResult};

pub const FLOORS: u16 = 2;
pub const ROWS:   u16 = 40;
pub const COLS:   u16 = 50;

const STAIR: (u16, u16) = (34, 45);

/// Build the office.  Returns the map and the centre of room 1 on the
/// ground floor, where the fire starts.
pub fn build_office() -> LayoutResult<(GridMap, CellId)> {
    let mut b = GridMapBuilder::new(FLOORS, ROWS, COLS).with_stair_cost(4.0);

    for floor in 0..FLOORS {
        b.fill_floor(floor, CellKind::Open)
            .room_outline(floor, (0, 0), (ROWS - 1, COLS - 1))
            // Room 1, north-west.
            .wall_line(floor, (15, 0), (15, 20))
            .wall_line(floor, (0, 20), (15, 20))
            .door(floor, (15, 8), (15, 10))
            // Room 2, north-east.
            .wall_line(floor, (15, 30), (15, COLS - 1))
            .wall_line(floor, (0, 30), (15, 30))
            .door(floor, (15, 38), (15, 40))
            // Pillars in the open-plan area.
            .circle_obstacle(floor, (27, 15), 2)
            .circle_obstacle(floor, (27, 35), 2)
            .paint(CellCoord::new(floor, STAIR.0, STAIR.1), CellKind::Stair);
    }
    b.stair_link(
        CellCoord::new(0, STAIR.0, STAIR.1),
        CellCoord::new(1, STAIR.0, STAIR.1),
    );
    b.paint(CellCoord::new(0, 22, 0), CellKind::Exit)
        .paint(CellCoord::new(0, 23, 0), CellKind::Exit);

    let map = b.build()?;
    let ignition = CellCoord::new(0, 7, 10);
    let fire = map.cell_at(ignition).ok_or(LayoutError::OutOfBounds(ignition))?;
    Ok((map, fire))
}
