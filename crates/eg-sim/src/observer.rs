//! Simulation observer trait for progress reporting and data collection.

use eg_core::Tick;

use crate::{EvacuationSummary, TickSnapshot, TickStats};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, tick: Tick, stats: &TickStats) {
///         println!("{tick}: {} escaped so far", stats.escaped_total);
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before the hazard advances.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick with that tick's counters.
    fn on_tick_end(&mut self, _tick: Tick, _stats: &TickStats) {}

    /// Called every `snapshot_interval_ticks` ticks and on the final tick.
    ///
    /// The snapshot owns its data; keep it or drop it as you like.
    fn on_snapshot(&mut self, _snapshot: &TickSnapshot) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _summary: &EvacuationSummary) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
