//! office: two-floor office evacuation demo for the rust_egress simulator.
//!
//! Forty occupants (twenty per floor) leave a burning office through a single
//! ground-floor exit.  Per-tick counters go to `output/office/tick_stats.csv`,
//! occupant positions to `output/office/agent_snapshots.csv`, and the
//! evacuation summary is printed as JSON.
//!
//! Set `RUST_LOG=debug` to see per-tick engine logging.

mod building;

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use csv::Writer;
use tracing_subscriber::EnvFilter;

use eg_core::{CellId, SimConfig, SimRng, Tick};
use eg_crowd::{AgentStoreBuilder, CrowdConfig};
use eg_grid::GridMap;
use eg_hazard::{FireSeed, HazardConfig};
use eg_route::HazardAStar;
use eg_sim::{SimBuilder, SimObserver, TickSnapshot, TickStats};

use building::{FLOORS, build_office};

// ── Constants ─────────────────────────────────────────────────────────────────

const OCCUPANTS_PER_FLOOR:   usize = 20;
const SEED:                  u64   = 42;
const TICK_DURATION_MS:      u32   = 500;   // one cell step per tick at full speed
const MAX_TICKS:             u64   = 1_200; // ten simulated minutes
const SNAPSHOT_INTERVAL:     u64   = 10;
const FIRE_START_INTENSITY:  f32   = 0.5;

// ── CSV observer ──────────────────────────────────────────────────────────────

/// Streams tick counters and occupant snapshots to two CSV files.
///
/// Observer callbacks cannot fail, so the first write error is kept and
/// further writes are skipped.
struct CsvObserver {
    stats:     Writer<File>,
    snapshots: Writer<File>,
    stat_rows:     usize,
    snapshot_rows: usize,
    error:     Option<csv::Error>,
}

impl CsvObserver {
    fn new(dir: &Path) -> Result<Self> {
        let mut stats = Writer::from_path(dir.join("tick_stats.csv"))?;
        stats.write_record([
            "tick", "burning_cells", "max_intensity", "hazard_changed",
            "routes_invalidated", "routes_failed", "moved", "stalled",
            "moving", "blocked", "escaped_total", "incapacitated_total",
        ])?;

        let mut snapshots = Writer::from_path(dir.join("agent_snapshots.csv"))?;
        snapshots.write_record(["tick", "agent_id", "floor", "row", "col", "status", "exposure"])?;

        Ok(Self { stats, snapshots, stat_rows: 0, snapshot_rows: 0, error: None })
    }

    fn record(&mut self, result: csv::Result<()>) {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
    }

    fn write_stats(&mut self, s: &TickStats) -> csv::Result<()> {
        self.stats.write_record(&[
            s.tick.0.to_string(),
            s.burning_cells.to_string(),
            format!("{:.3}", s.max_intensity),
            s.hazard_changed.to_string(),
            s.routes_invalidated.to_string(),
            s.routes_failed.to_string(),
            s.moved.to_string(),
            s.stalled.to_string(),
            s.moving.to_string(),
            s.blocked.to_string(),
            s.escaped_total.to_string(),
            s.incapacitated_total.to_string(),
        ])?;
        self.stat_rows += 1;
        Ok(())
    }

    fn write_snapshot(&mut self, snap: &TickSnapshot) -> csv::Result<()> {
        for a in &snap.agents {
            self.snapshots.write_record(&[
                snap.tick.0.to_string(),
                a.id.0.to_string(),
                a.coord.floor.to_string(),
                a.coord.row.to_string(),
                a.coord.col.to_string(),
                a.status.as_str().to_string(),
                format!("{:.3}", a.exposure),
            ])?;
            self.snapshot_rows += 1;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(usize, usize)> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.stats.flush()?;
        self.snapshots.flush()?;
        Ok((self.stat_rows, self.snapshot_rows))
    }
}

impl SimObserver for CsvObserver {
    fn on_tick_end(&mut self, _tick: Tick, stats: &TickStats) {
        if self.error.is_none() {
            let result = self.write_stats(stats);
            self.record(result);
        }
    }

    fn on_snapshot(&mut self, snapshot: &TickSnapshot) {
        if self.error.is_none() {
            let result = self.write_snapshot(snapshot);
            self.record(result);
        }
    }
}

// ── Placement ─────────────────────────────────────────────────────────────────

/// `per_floor` distinct open cells on every floor, shuffled with `seed`.
fn place_per_floor(grid: &GridMap, per_floor: usize, seed: u64) -> Result<Vec<CellId>> {
    let mut rng = SimRng::new(seed);
    let mut positions = Vec::with_capacity(per_floor * FLOORS as usize);
    for floor in 0..FLOORS {
        let mut free: Vec<CellId> = grid
            .walkable_cells()
            .filter(|&c| grid.coord(c).floor == floor && !grid.is_exit(c))
            .collect();
        anyhow::ensure!(
            free.len() >= per_floor,
            "floor {floor} has only {} free cells",
            free.len()
        );
        rng.shuffle(&mut free);
        positions.extend_from_slice(&free[..per_floor]);
    }
    Ok(positions)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let agent_count = OCCUPANTS_PER_FLOOR * FLOORS as usize;
    println!("=== office: rust_egress evacuation demo ===");
    println!("Occupants: {agent_count}  |  Floors: {FLOORS}  |  Seed: {SEED}");
    println!();

    // 1. Building and fire.
    let (grid, fire_cell) = build_office()?;
    println!(
        "Office: {} cells, {} walkable, {} exit cells, fire at {}",
        grid.cell_count(),
        grid.walkable_cells().count(),
        grid.exits().len(),
        grid.coord(fire_cell),
    );

    // 2. Occupants.
    let positions = place_per_floor(&grid, OCCUPANTS_PER_FLOOR, SEED)?;
    let agents = AgentStoreBuilder::new(agent_count, SEED).speed_jitter(0.25).build()?;

    // 3. Configuration.
    let config = SimConfig {
        tick_duration_ms:        TICK_DURATION_MS,
        max_ticks:               MAX_TICKS,
        seed:                    SEED,
        num_threads:             None, // all logical cores
        snapshot_interval_ticks: SNAPSHOT_INTERVAL,
    };
    let hazard = HazardConfig::default();
    let crowd = CrowdConfig::default();
    let pathfinder = HazardAStar::default();
    println!(
        "Effective config:\n{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "sim":    config,
            "hazard": hazard,
            "crowd":  crowd,
            "route":  pathfinder.costs,
        }))?
    );
    println!();

    // 4. Build sim.
    let mut sim = SimBuilder::new(config, grid, agents, pathfinder)
        .hazard_config(hazard)
        .crowd_config(crowd)
        .fire_seeds(vec![FireSeed::new(fire_cell, Tick::ZERO, FIRE_START_INTENSITY)])
        .initial_positions(positions)
        .build()?;

    // 5. Output.
    let dir = Path::new("output/office");
    std::fs::create_dir_all(dir)?;
    let mut obs = CsvObserver::new(dir)?;

    // 6. Run.
    let t0 = Instant::now();
    let summary = sim.run(&mut obs)?;
    let elapsed = t0.elapsed();
    let (stat_rows, snapshot_rows) = obs.finish()?;

    // 7. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  tick_stats.csv      : {stat_rows} rows");
    println!("  agent_snapshots.csv : {snapshot_rows} rows");
    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
