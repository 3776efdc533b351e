//! Unit tests for eg-grid.
//!
//! All layouts are hand-drawn ASCII plans.

#[cfg(test)]
mod helpers {
    use eg_core::{CellCoord, CellId};
    use crate::{GridMap, GridMapBuilder};

    /// Two floors joined by one staircase.  Exit on floor 0 only.
    ///
    /// ```text
    /// floor 0        floor 1
    /// #######        #######
    /// E....S#        #.....#
    /// #.....#        #....S#
    /// #######        #######
    /// ```
    pub fn two_floor() -> GridMap {
        let mut b = GridMapBuilder::new(2, 4, 7);
        b.floor_from_ascii(0, "
            #######
            E....S#
            #.....#
            #######
        ");
        b.floor_from_ascii(1, "
            #######
            #.....#
            #....S#
            #######
        ");
        b.stair_link(CellCoord::new(0, 1, 5), CellCoord::new(1, 2, 5));
        b.build().unwrap()
    }

    pub fn at(map: &GridMap, floor: u16, row: u16, col: u16) -> CellId {
        map.cell_at(CellCoord::new(floor, row, col)).unwrap()
    }
}

// ── Builder & validation ──────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use eg_core::CellCoord;
    use crate::{CellKind, GridMapBuilder, LayoutError};

    #[test]
    fn ascii_plan_round_trips_kinds() {
        let map = super::helpers::two_floor();
        assert_eq!(map.floors(), 2);
        assert_eq!(map.cell_count(), 2 * 4 * 7);
        let exit = super::helpers::at(&map, 0, 1, 0);
        assert_eq!(map.kind(exit), CellKind::Exit);
        assert_eq!(map.exits(), &[exit]);
        let stair = super::helpers::at(&map, 1, 2, 5);
        assert_eq!(map.kind(stair), CellKind::Stair);
    }

    #[test]
    fn glyphs_render_plan_back() {
        let map = super::helpers::two_floor();
        let render = |floor: u16| -> Vec<String> {
            (0..map.rows())
                .map(|row| {
                    (0..map.cols())
                        .map(|col| {
                            let cell = map.cell_at(CellCoord::new(floor, row, col)).unwrap();
                            map.kind(cell).glyph()
                        })
                        .collect()
                })
                .collect()
        };
        assert_eq!(render(0), ["#######", "E....S#", "#.....#", "#######"]);
        assert_eq!(render(1), ["#######", "#.....#", "#....S#", "#######"]);
    }

    #[test]
    fn empty_layout_rejected() {
        assert_eq!(GridMapBuilder::new(0, 3, 3).build().err(), Some(LayoutError::Empty));
    }

    #[test]
    fn no_exit_rejected() {
        let mut b = GridMapBuilder::new(1, 1, 3);
        b.floor_from_ascii(0, "...");
        assert_eq!(b.build().err(), Some(LayoutError::NoExit));
    }

    #[test]
    fn disconnected_region_rejected() {
        let mut b = GridMapBuilder::new(1, 3, 5);
        b.floor_from_ascii(0, "
            #####
            E.#..
            #####
        ");
        match b.build() {
            Err(LayoutError::Unreachable { first, count }) => {
                assert_eq!(first, CellCoord::new(0, 1, 3));
                assert_eq!(count, 2);
            }
            other => panic!("expected Unreachable, got {:?}", other.err()),
        }
    }

    #[test]
    fn upper_floor_without_stairs_rejected() {
        let mut b = GridMapBuilder::new(2, 1, 3);
        b.floor_from_ascii(0, "E..");
        b.floor_from_ascii(1, "...");
        assert!(matches!(b.build(), Err(LayoutError::Unreachable { count: 3, .. })));
    }

    #[test]
    fn conflicting_declaration_rejected() {
        let mut b = GridMapBuilder::new(1, 1, 3);
        b.floor_from_ascii(0, "E..");
        b.declare(CellCoord::new(0, 0, 1), CellKind::Wall);
        assert!(matches!(b.build(), Err(LayoutError::Conflicting { .. })));
    }

    #[test]
    fn redeclaring_same_kind_is_fine() {
        let mut b = GridMapBuilder::new(1, 1, 3);
        b.floor_from_ascii(0, "E..");
        b.declare(CellCoord::new(0, 0, 1), CellKind::Open);
        assert!(b.build().is_ok());
    }

    #[test]
    fn bad_plan_shape_rejected() {
        let mut b = GridMapBuilder::new(1, 2, 3);
        b.floor_from_ascii(0, "E..\n....");
        assert!(matches!(b.build(), Err(LayoutError::PlanWidth { line: 1, got: 4, .. })));

        let mut b = GridMapBuilder::new(1, 2, 3);
        b.floor_from_ascii(0, "E..");
        assert!(matches!(b.build(), Err(LayoutError::PlanHeight { got: 1, .. })));

        let mut b = GridMapBuilder::new(1, 1, 3);
        b.floor_from_ascii(0, "E.x");
        assert!(matches!(b.build(), Err(LayoutError::UnknownGlyph { glyph: 'x', .. })));
    }

    #[test]
    fn stair_link_must_join_stairs_on_adjacent_floors() {
        let mut b = GridMapBuilder::new(2, 1, 3);
        b.floor_from_ascii(0, "E.S");
        b.floor_from_ascii(1, "..S");
        b.stair_link(CellCoord::new(0, 0, 1), CellCoord::new(1, 0, 2));
        assert!(matches!(b.build(), Err(LayoutError::BadStairLink { .. })));
    }

    #[test]
    fn out_of_bounds_paint_reported() {
        let mut b = GridMapBuilder::new(1, 1, 3);
        b.floor_from_ascii(0, "E..");
        b.paint(CellCoord::new(0, 5, 0), CellKind::Open);
        assert_eq!(
            b.build().err(),
            Some(LayoutError::OutOfBounds(CellCoord::new(0, 5, 0)))
        );
    }

    #[test]
    fn fireproof_glyph_sets_resistance() {
        let mut b = GridMapBuilder::new(1, 1, 3);
        b.floor_from_ascii(0, "E%.");
        let map = b.build().unwrap();
        let cell = map.cell_at(CellCoord::new(0, 0, 1)).unwrap();
        assert_eq!(map.kind(cell), CellKind::Open);
        assert_eq!(map.fire_resistance(cell), 1.0);
    }

    #[test]
    fn geometric_primitives_draw_rooms() {
        let mut b = GridMapBuilder::new(1, 7, 9);
        b.fill_floor(0, CellKind::Open)
            .room_outline(0, (0, 0), (6, 8))
            .door(0, (3, 0), (3, 0))
            .paint(CellCoord::new(0, 3, 0), CellKind::Exit)
            .circle_obstacle(0, (3, 5), 1);
        let map = b.build().unwrap();
        let wall = |r, c| map.kind(map.cell_at(CellCoord::new(0, r, c)).unwrap());
        assert_eq!(wall(0, 4), CellKind::Wall);
        assert_eq!(wall(6, 8), CellKind::Wall);
        assert_eq!(wall(3, 5), CellKind::Wall, "pillar centre");
        assert_eq!(wall(2, 5), CellKind::Wall, "pillar edge");
        assert_eq!(wall(2, 4), CellKind::Open, "outside the disc");
        assert_eq!(wall(3, 0), CellKind::Exit);
    }
}

// ── Adjacency ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod adjacency {
    use eg_core::CellCoord;
    use crate::{Connectivity, GridMapBuilder, DIAGONAL_COST, ORTHOGONAL_COST};
    use super::helpers::{at, two_floor};

    #[test]
    fn neighbors_are_walkable_only() {
        let map = two_floor();
        for cell in map.walkable_cells() {
            for (next, _) in map.neighbors(cell) {
                assert!(map.is_walkable(next), "{} -> {}", map.coord(cell), map.coord(next));
            }
        }
        let wall = at(&map, 0, 0, 0);
        assert_eq!(map.degree(wall), 0);
    }

    #[test]
    fn neighbor_order_is_fixed() {
        let map = two_floor();
        let c = at(&map, 0, 1, 2);
        let order: Vec<CellCoord> = map.neighbors(c).map(|(n, _)| map.coord(n)).collect();
        assert_eq!(
            order,
            vec![
                CellCoord::new(0, 1, 3), // E
                CellCoord::new(0, 2, 2), // S
                CellCoord::new(0, 1, 1), // W
                CellCoord::new(0, 2, 3), // SE
                CellCoord::new(0, 2, 1), // SW
            ]
        );
    }

    #[test]
    fn diagonal_costs_more_and_cannot_cut_corners() {
        let mut b = GridMapBuilder::new(1, 3, 3);
        b.floor_from_ascii(0, "
            E..
            .#.
            ...
        ");
        let map = b.build().unwrap();
        let corner = map.cell_at(CellCoord::new(0, 0, 0)).unwrap();
        let costs: Vec<u32> = map.neighbors(corner).map(|(_, c)| c).collect();
        assert_eq!(costs, vec![ORTHOGONAL_COST, ORTHOGONAL_COST], "diagonal blocked by pillar");

        let open = map.cell_at(CellCoord::new(0, 2, 2)).unwrap();
        assert!(map.neighbors(open).all(|(_, c)| c == ORTHOGONAL_COST || c == DIAGONAL_COST));
    }

    #[test]
    fn four_connectivity_has_no_diagonals() {
        let mut b = GridMapBuilder::new(1, 3, 3).with_connectivity(Connectivity::Four);
        b.floor_from_ascii(0, "
            E..
            ...
            ...
        ");
        let map = b.build().unwrap();
        let centre = map.cell_at(CellCoord::new(0, 1, 1)).unwrap();
        assert_eq!(map.degree(centre), 4);
    }

    #[test]
    fn stair_link_is_bidirectional_with_stair_cost() {
        let map = two_floor();
        let lower = at(&map, 0, 1, 5);
        let upper = at(&map, 1, 2, 5);
        assert!(map.neighbors(lower).any(|(n, c)| n == upper && c == map.stair_cost()));
        assert!(map.neighbors(upper).any(|(n, c)| n == lower && c == map.stair_cost()));
        // Stair links are listed after planar neighbors.
        assert_eq!(map.neighbors(upper).last().map(|(n, _)| n), Some(lower));
    }

    #[test]
    fn step_cost_of_adjacent_cells_only() {
        let map = two_floor();
        let c = at(&map, 0, 1, 2);
        assert_eq!(map.step_cost(c, at(&map, 0, 1, 3)), Some(ORTHOGONAL_COST));
        assert_eq!(map.step_cost(c, at(&map, 0, 2, 3)), Some(DIAGONAL_COST));
        assert_eq!(map.step_cost(c, at(&map, 0, 1, 4)), None);
        assert_eq!(map.step_cost(c, c), None);
        let (lower, upper) = (at(&map, 0, 1, 5), at(&map, 1, 2, 5));
        assert_eq!(map.step_cost(lower, upper), Some(map.stair_cost()));
    }

    #[test]
    fn moore_neighborhood_clips_to_grid() {
        let map = two_floor();
        assert_eq!(map.moore_neighborhood(at(&map, 0, 0, 0)).count(), 3);
        assert_eq!(map.moore_neighborhood(at(&map, 0, 1, 1)).count(), 8);
        assert!(map
            .moore_neighborhood(at(&map, 1, 0, 0))
            .all(|c| map.coord(c).floor == 1));
    }
}

// ── Distances ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod distances {
    use eg_core::CellId;
    use crate::{GridMapBuilder, ORTHOGONAL_COST};
    use super::helpers::{at, two_floor};

    #[test]
    fn every_walkable_cell_has_finite_exit_distance() {
        let map = two_floor();
        for cell in map.walkable_cells() {
            assert!(map.exit_distance(cell).is_some(), "{}", map.coord(cell));
        }
        assert_eq!(map.exit_distance(at(&map, 0, 0, 0)), None);
    }

    #[test]
    fn exit_distance_counts_stairs() {
        let map = two_floor();
        assert_eq!(map.exit_distance(at(&map, 0, 1, 0)), Some(0));
        assert_eq!(map.exit_distance(at(&map, 0, 1, 5)), Some(5 * ORTHOGONAL_COST));
        assert_eq!(
            map.exit_distance(at(&map, 1, 2, 5)),
            Some(5 * ORTHOGONAL_COST + map.stair_cost())
        );
    }

    #[test]
    fn heuristic_never_overestimates_exit_distance() {
        let map = two_floor();
        let exit = map.exits()[0];
        for cell in map.walkable_cells() {
            let h = map.distance_heuristic(cell, exit);
            let d = map.exit_distance(cell).unwrap();
            assert!(h <= d, "{}: h={h} d={d}", map.coord(cell));
        }
    }

    #[test]
    fn custom_stair_cost() {
        let mut b = GridMapBuilder::new(2, 1, 2).with_stair_cost(10.0);
        b.floor_from_ascii(0, "ES");
        b.floor_from_ascii(1, ".S");
        b.stair_link(
            eg_core::CellCoord::new(0, 0, 1),
            eg_core::CellCoord::new(1, 0, 1),
        );
        let map = b.build().unwrap();
        assert_eq!(map.stair_cost(), 10_000);
        let upper = map.cell_at(eg_core::CellCoord::new(1, 0, 0)).unwrap();
        assert_eq!(map.exit_distance(upper), Some(12_000));
    }

    #[test]
    fn try_coord_checks_bounds() {
        let map = two_floor();
        assert!(map.try_coord(CellId(0)).is_ok());
        assert!(map.try_coord(CellId(10_000)).is_err());
    }
}
