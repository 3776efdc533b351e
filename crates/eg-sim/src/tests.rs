//! Integration tests for eg-sim.

use std::collections::HashSet;

use eg_core::{AgentId, CellCoord, CellId, EgError, SimConfig, Tick};
use eg_crowd::{AgentStatus, AgentStore, AgentStoreBuilder};
use eg_grid::{Connectivity, GridMap, GridMapBuilder};
use eg_hazard::{FireSeed, HazardConfig, HazardError};
use eg_route::{HazardAStar, Pathfinder};

use crate::{
    EvacuationSummary, NoopObserver, SimBuilder, SimError, SimObserver, TickSnapshot, TickStats,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn test_config(max_ticks: u64) -> SimConfig {
    SimConfig {
        tick_duration_ms:        1_000,
        max_ticks,
        seed:                    42,
        num_threads:             Some(1),
        snapshot_interval_ticks: 1,
    }
}

fn store(n: usize) -> AgentStore {
    AgentStoreBuilder::new(n, 42).build().unwrap()
}

/// One-floor, 4-connected map from an ASCII plan.
fn plan(rows: u16, cols: u16, ascii: &str) -> GridMap {
    let mut b = GridMapBuilder::new(1, rows, cols).with_connectivity(Connectivity::Four);
    b.floor_from_ascii(0, ascii);
    b.build().unwrap()
}

/// `E` followed by ten open cells.
fn corridor() -> GridMap {
    plan(1, 11, "E..........")
}

/// Exit in the top-left corner, reachable along the top row or around the
/// bottom of the centre wall.
fn loop_room() -> GridMap {
    plan(3, 7, "
        E......
        .#####.
        .......
    ")
}

/// Offices upstairs, exit downstairs, one stair between them.
fn two_floor() -> GridMap {
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

fn at(map: &GridMap, floor: u16, row: u16, col: u16) -> CellId {
    map.cell_at(CellCoord::new(floor, row, col)).unwrap()
}

/// Fire that neither grows, spreads, nor smokes.
fn static_fire() -> HazardConfig {
    HazardConfig {
        growth_rate:       0.0,
        spread_rate:       0.0,
        smoke_source_rate: 0.0,
        ..HazardConfig::default()
    }
}

/// Observer that records every callback.
#[derive(Default)]
struct Recorder {
    starts:    Vec<Tick>,
    ends:      Vec<TickStats>,
    snapshots: Vec<TickSnapshot>,
    summaries: Vec<EvacuationSummary>,
}

impl SimObserver for Recorder {
    fn on_tick_start(&mut self, tick: Tick) {
        self.starts.push(tick);
    }
    fn on_tick_end(&mut self, _tick: Tick, stats: &TickStats) {
        self.ends.push(*stats);
    }
    fn on_snapshot(&mut self, snapshot: &TickSnapshot) {
        self.snapshots.push(snapshot.clone());
    }
    fn on_sim_end(&mut self, summary: &EvacuationSummary) {
        self.summaries.push(summary.clone());
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_with_scattered_positions() {
        let map = two_floor();
        let sim = SimBuilder::new(test_config(10), map, store(5), HazardAStar::default())
            .build()
            .unwrap();
        let cells: HashSet<CellId> = sim.agents().cell.iter().copied().collect();
        assert_eq!(cells.len(), 5, "scattered occupants must not share cells");
        for &c in &sim.agents().cell {
            assert!(sim.grid().is_walkable(c));
            assert!(!sim.grid().is_exit(c));
            assert_eq!(sim.occupancy().count(c), 1);
        }
        assert_eq!(sim.current_tick(), Tick::ZERO);
    }

    #[test]
    fn scatter_is_seeded() {
        let a = SimBuilder::new(test_config(10), two_floor(), store(6), HazardAStar::default())
            .build()
            .unwrap();
        let b = SimBuilder::new(test_config(10), two_floor(), store(6), HazardAStar::default())
            .build()
            .unwrap();
        assert_eq!(a.agents().cell, b.agents().cell);
    }

    #[test]
    fn too_many_occupants_for_scatter() {
        let result = SimBuilder::new(test_config(10), corridor(), store(11), HazardAStar::default())
            .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn position_count_mismatch_errors() {
        let map = corridor();
        let positions = vec![at(&map, 0, 0, 1)];
        let result = SimBuilder::new(test_config(10), map, store(2), HazardAStar::default())
            .initial_positions(positions)
            .build();
        assert!(matches!(
            result,
            Err(SimError::AgentCountMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn wall_position_rejected() {
        let map = two_floor();
        let wall = at(&map, 0, 0, 0);
        let result = SimBuilder::new(test_config(10), map, store(1), HazardAStar::default())
            .initial_positions(vec![wall])
            .build();
        assert!(matches!(
            result,
            Err(SimError::InvalidPosition { reason: "not walkable", .. })
        ));
    }

    #[test]
    fn exit_position_rejected() {
        let map = corridor();
        let exit = at(&map, 0, 0, 0);
        let result = SimBuilder::new(test_config(10), map, store(1), HazardAStar::default())
            .initial_positions(vec![exit])
            .build();
        assert!(matches!(
            result,
            Err(SimError::InvalidPosition { reason: "cell is an exit", .. })
        ));
    }

    #[test]
    fn shared_position_rejected() {
        let map = corridor();
        let c = at(&map, 0, 0, 3);
        let result = SimBuilder::new(test_config(10), map, store(2), HazardAStar::default())
            .initial_positions(vec![c, c])
            .build();
        match result {
            Err(SimError::InvalidPosition { agent, reason, .. }) => {
                assert_eq!(agent, AgentId(1));
                assert_eq!(reason, "cell already taken");
            }
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("shared start cell accepted"),
        }
    }

    #[test]
    fn out_of_range_position_rejected() {
        let result = SimBuilder::new(test_config(10), corridor(), store(1), HazardAStar::default())
            .initial_positions(vec![CellId(999)])
            .build();
        assert!(matches!(
            result,
            Err(SimError::Core(EgError::CellOutOfBounds(CellId(999))))
        ));
    }

    #[test]
    fn invalid_sim_config_rejected() {
        let cfg = SimConfig { tick_duration_ms: 0, ..test_config(10) };
        let result = SimBuilder::new(cfg, corridor(), store(1), HazardAStar::default()).build();
        assert!(matches!(result, Err(SimError::Core(EgError::Config(_)))));
    }

    #[test]
    fn fire_seed_on_wall_rejected() {
        let map = two_floor();
        let wall = at(&map, 1, 0, 0);
        let result = SimBuilder::new(test_config(10), map, store(1), HazardAStar::default())
            .fire_seeds(vec![FireSeed::new(wall, Tick(0), 0.5)])
            .build();
        assert!(matches!(result, Err(SimError::Hazard(HazardError::SeedOnWall(_)))));
    }

    #[test]
    fn unknown_agent_lookup_fails() {
        let sim = SimBuilder::new(test_config(10), corridor(), store(2), HazardAStar::default())
            .build()
            .unwrap();
        assert!(sim.agent(AgentId(1)).is_ok());
        assert!(matches!(
            sim.agent(AgentId(2)),
            Err(SimError::Core(EgError::AgentNotFound(AgentId(2))))
        ));
    }
}

// ── Corridor queue ────────────────────────────────────────────────────────────

#[cfg(test)]
mod queue_tests {
    use super::*;

    fn queued() -> crate::Sim<HazardAStar> {
        let map = corridor();
        let positions = (1..=10).map(|c| at(&map, 0, 0, c)).collect();
        SimBuilder::new(test_config(100), map, store(10), HazardAStar::default())
            .initial_positions(positions)
            .build()
            .unwrap()
    }

    #[test]
    fn one_escape_per_tick() {
        init_tracing();
        let mut sim = queued();
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();

        assert!(rec.ends.iter().all(|s| s.escaped <= 1));
        assert_eq!(rec.ends.len(), 10);
        assert_eq!(summary.escaped, 10);
        assert_eq!(summary.ticks, 10);
        assert!(summary.is_complete());
    }

    #[test]
    fn evacuation_times_follow_queue_order() {
        let mut sim = queued();
        let summary = sim.run(&mut NoopObserver).unwrap();
        for i in 0..10 {
            assert_eq!(sim.agents().escaped_at[i], Some(Tick(i as u64)));
        }
        assert_eq!(summary.max_evacuation_ticks, Some(10));
        assert_eq!(summary.average_evacuation_ticks, Some(5.5));
        assert_eq!(summary.average_evacuation_secs, Some(5.5));
    }

    #[test]
    fn queue_visible_in_snapshots() {
        let mut sim = queued();
        let first = sim.step().unwrap();
        assert_eq!(first.tick, Tick(0));
        assert_eq!(first.count_with(AgentStatus::Escaped), 1);
        // Everyone behind the leader shuffled one cell forward.
        for i in 1..10u32 {
            let a = first.agent(AgentId(i)).unwrap();
            assert_eq!(a.status, AgentStatus::Moving);
            assert_eq!(a.coord, CellCoord::new(0, 0, i as u16));
        }
        let occupied: Vec<CellId> = first.occupied_cells().collect();
        assert_eq!(occupied.len(), 9);
    }

    #[test]
    fn unobstructed_routes_match_exit_distance() {
        let sim = queued();
        let astar = HazardAStar::default();
        for &cell in &sim.agents().cell {
            let route = astar.route(sim.grid(), sim.hazard(), cell).unwrap();
            assert_eq!(Some(route.total_cost()), sim.grid().exit_distance(cell));
        }
    }
}

// ── Hazard interaction ────────────────────────────────────────────────────────

#[cfg(test)]
mod hazard_tests {
    use super::*;

    #[test]
    fn fire_on_route_forces_detour() {
        let map = loop_room();
        let start = at(&map, 0, 0, 6);
        let fire = at(&map, 0, 0, 3);
        let mut sim = SimBuilder::new(test_config(100), map, store(1), HazardAStar::default())
            .hazard_config(static_fire())
            .fire_seeds(vec![FireSeed::new(fire, Tick(2), 0.9)])
            .initial_positions(vec![start])
            .build()
            .unwrap();

        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();

        assert_eq!(rec.ends[2].routes_invalidated, 1);
        assert_eq!(rec.ends[2].routes_requested, 1);
        assert!(rec.snapshots.iter().all(|s| s.agents[0].cell != fire));
        assert_eq!(summary.escaped, 1);
        // Two steps along the top, two back, then ten around the loop.
        assert_eq!(sim.agents().escaped_at[0], Some(Tick(13)));
    }

    #[test]
    fn sealed_off_occupant_stays_blocked() {
        let map = plan(1, 7, "E......");
        let fire = at(&map, 0, 0, 3);
        let start = at(&map, 0, 0, 6);
        let mut sim = SimBuilder::new(test_config(20), map, store(1), HazardAStar::default())
            .hazard_config(static_fire())
            .fire_seeds(vec![FireSeed::new(fire, Tick(0), 0.9)])
            .initial_positions(vec![start])
            .build()
            .unwrap();

        let summary = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(summary.ticks, 20);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.remaining, 1);
        assert_eq!(summary.escaped, 0);
        assert_eq!(summary.average_evacuation_ticks, None);
        assert!(!summary.is_complete());
        assert_eq!(sim.agents().cell[0], start);
    }

    #[test]
    fn staircase_descent_accounts_for_everyone() {
        init_tracing();
        let map = two_floor();
        let positions = vec![
            at(&map, 1, 1, 1),
            at(&map, 1, 1, 2),
            at(&map, 1, 1, 3),
            at(&map, 1, 1, 4),
            at(&map, 1, 1, 5),
            at(&map, 1, 2, 1),
        ];
        let fire = at(&map, 0, 2, 1);
        let mut sim = SimBuilder::new(test_config(200), map, store(6), HazardAStar::default())
            .hazard_config(static_fire())
            .fire_seeds(vec![FireSeed::new(fire, Tick(0), 0.8)])
            .initial_positions(positions)
            .build()
            .unwrap();

        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();

        for snap in &rec.snapshots {
            let s = &snap.stats;
            assert_eq!(
                s.moving + s.blocked + s.needs_route + s.escaped_total + s.incapacitated_total,
                6,
                "occupant dropped at {}",
                snap.tick
            );
        }
        assert_eq!(summary.total, 6);
        assert_eq!(summary.escaped, 6);
        assert!(summary.is_complete());
        // Someone stood on the lower floor before leaving.
        assert!(rec
            .snapshots
            .iter()
            .flat_map(|s| s.agents.iter())
            .any(|a| a.coord.floor == 0 && a.status == AgentStatus::Moving));
    }

    /// Ground floor with the exit, upper floor reached by one staircase.
    fn stairwell_building() -> GridMap {
        let mut b = GridMapBuilder::new(2, 8, 12);
        b.floor_from_ascii(0, "
            ############
            E..........#
            #..........#
            #.........S#
            #..........#
            #..........#
            #..........#
            ############
        ");
        b.floor_from_ascii(1, "
            ############
            #..........#
            #..........#
            #.........S#
            #..........#
            #..........#
            #..........#
            ############
        ");
        b.stair_link(CellCoord::new(0, 3, 10), CellCoord::new(1, 3, 10));
        b.build().unwrap()
    }

    #[test]
    fn fire_by_the_stairs_drops_nobody() {
        init_tracing();
        let map = stairwell_building();
        let mut positions: Vec<CellId> = (1..=2)
            .flat_map(|row| (1..=10).map(move |col| (row, col)))
            .map(|(row, col)| at(&map, 0, row, col))
            .collect();
        positions.extend((1..=5).map(|col| at(&map, 1, 1, col)));
        let fire = at(&map, 0, 3, 9);
        let mut sim = SimBuilder::new(test_config(300), map, store(25), HazardAStar::default())
            .fire_seeds(vec![FireSeed::new(fire, Tick(0), 0.7)])
            .initial_positions(positions)
            .build()
            .unwrap();

        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();

        for snap in &rec.snapshots {
            assert_eq!(snap.agents.len(), 25);
            let s = &snap.stats;
            assert_eq!(
                s.moving + s.blocked + s.needs_route + s.escaped_total + s.incapacitated_total,
                25,
                "occupant dropped at {}",
                snap.tick
            );
        }
        assert_eq!(summary.escaped + summary.incapacitated + summary.remaining, 25);
        assert!(summary.escaped > 0);

        let agents = sim.agents();
        for i in 20..25 {
            match agents.status[i] {
                AgentStatus::Escaped => assert!(agents.escaped_at[i].is_some()),
                AgentStatus::Incapacitated => assert!(agents.incapacitated_at[i].is_some()),
                _ => assert!(sim.grid().is_walkable(agents.cell[i])),
            }
        }
    }

    #[test]
    fn spreading_fire_keeps_cells_exclusive() {
        let map = two_floor();
        let fire = at(&map, 1, 1, 1);
        let mut sim = SimBuilder::new(test_config(150), map, store(12), HazardAStar::default())
            .fire_seeds(vec![FireSeed::new(fire, Tick(0), 0.5)])
            .build()
            .unwrap();

        while !sim.is_finished() {
            let snap = sim.step().unwrap();
            let mut seen = HashSet::new();
            for cell in snap.occupied_cells() {
                assert!(seen.insert(cell), "two occupants on {cell} at {}", snap.tick);
            }
            let s = snap.stats;
            assert_eq!(s.moving + s.blocked + s.needs_route + s.escaped_total
                + s.incapacitated_total, 12);
        }
        let summary = sim.summary();
        assert_eq!(summary.escaped + summary.incapacitated + summary.remaining, 12);
    }
}

// ── Snapshots and determinism ─────────────────────────────────────────────────

#[cfg(test)]
mod snapshot_tests {
    use super::*;

    fn smoky_office(threads: Option<usize>) -> crate::Sim<HazardAStar> {
        let map = two_floor();
        let fire = at(&map, 1, 2, 2);
        let agents = AgentStoreBuilder::new(10, 7).speed_jitter(0.3).build().unwrap();
        let cfg = SimConfig { num_threads: threads, ..test_config(120) };
        SimBuilder::new(cfg, map, agents, HazardAStar::default())
            .fire_seeds(vec![FireSeed::new(fire, Tick(1), 0.6)])
            .build()
            .unwrap()
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut sim = smoky_office(Some(1));
        sim.run_ticks(3, &mut NoopObserver).unwrap();
        let a = sim.snapshot();
        let b = sim.snapshot();
        assert_eq!(a, b);
        assert_eq!(a.tick, Tick(2));
        assert_eq!(sim.current_tick(), Tick(3));
        assert_eq!(a.elapsed_secs, 3.0);
    }

    #[test]
    fn identical_inputs_identical_runs() {
        let a: Vec<TickSnapshot> =
            smoky_office(Some(1)).snapshots().collect::<Result<_, _>>().unwrap();
        let b: Vec<TickSnapshot> =
            smoky_office(Some(1)).snapshots().collect::<Result<_, _>>().unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn thread_count_does_not_change_outcome() {
        let a: Vec<TickSnapshot> =
            smoky_office(Some(1)).snapshots().collect::<Result<_, _>>().unwrap();
        let b: Vec<TickSnapshot> =
            smoky_office(Some(4)).snapshots().collect::<Result<_, _>>().unwrap();
        let c: Vec<TickSnapshot> =
            smoky_office(None).snapshots().collect::<Result<_, _>>().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn snapshot_carries_hazard_fields() {
        let mut sim = smoky_office(Some(1));
        let snap = sim.step().unwrap();
        assert_eq!(snap.intensity.len(), sim.grid().cell_count());
        assert_eq!(snap.smoke.len(), sim.grid().cell_count());
        assert_eq!(snap.hazard_version, sim.hazard().version());
        assert_eq!(snap.agents.len(), 10);
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;

    #[test]
    fn callbacks_follow_the_tick_loop() {
        let map = corridor();
        let positions = (1..=10).map(|c| at(&map, 0, 0, c)).collect();
        let cfg = SimConfig { snapshot_interval_ticks: 4, ..test_config(100) };
        let mut sim = SimBuilder::new(cfg, map, store(10), HazardAStar::default())
            .initial_positions(positions)
            .build()
            .unwrap();

        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.starts, (0..10).map(Tick).collect::<Vec<_>>());
        assert_eq!(rec.ends.len(), 10);
        let snapshot_ticks: Vec<Tick> = rec.snapshots.iter().map(|s| s.tick).collect();
        assert_eq!(snapshot_ticks, vec![Tick(0), Tick(4), Tick(8), Tick(9)]);
        assert_eq!(rec.summaries.len(), 1);
        assert_eq!(rec.summaries[0].escaped, 10);
    }

    #[test]
    fn run_stops_at_tick_budget() {
        let map = corridor();
        let positions = vec![at(&map, 0, 0, 10)];
        let mut sim = SimBuilder::new(test_config(3), map, store(1), HazardAStar::default())
            .initial_positions(positions)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.remaining, 1);
        assert_eq!(rec.snapshots.last().map(|s| s.tick), Some(Tick(2)));
        assert!(sim.is_finished());
    }

    #[test]
    fn run_ticks_snapshots_last_tick() {
        let map = corridor();
        let positions = vec![at(&map, 0, 0, 10)];
        let cfg = SimConfig { snapshot_interval_ticks: 100, ..test_config(100) };
        let mut sim = SimBuilder::new(cfg, map, store(1), HazardAStar::default())
            .initial_positions(positions)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(3, &mut rec).unwrap();
        assert_eq!(rec.starts.len(), 3);
        // Tick 0 hits the interval, tick 2 is the last one run.
        let ticks: Vec<Tick> = rec.snapshots.iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![Tick(0), Tick(2)]);
        assert_eq!(sim.current_tick(), Tick(3));
    }
}
