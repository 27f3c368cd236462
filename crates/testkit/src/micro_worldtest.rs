//! Tick-stepped snapshot tests.
//!
//! A micro-worldtest drives a small piece of state for a fixed number of
//! ticks, captures a snapshot after every step, and compares the whole
//! timeline against one golden file.

use crate::snapshot::assert_json_snapshot;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use voxelhooks_core::SimTick;

/// Configuration for a micro-worldtest.
#[derive(Debug, Clone)]
pub struct MicroWorldtestConfig {
    /// Name written into the report.
    pub name: String,
    /// Number of steps; the report holds `ticks + 1` frames.
    pub ticks: u64,
    /// Golden JSON file.
    pub snapshot_path: PathBuf,
}

/// State captured after a step.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestFrame<S> {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

#[derive(Debug, Serialize)]
struct Timeline<S> {
    name: String,
    frames: Vec<MicroWorldtestFrame<S>>,
}

/// Step `state` and assert the snapshot timeline.
///
/// Frame 0 is taken before any step. A step returning an error aborts the
/// test with the failing tick attached.
pub fn run_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: MicroWorldtestConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<()>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, &mut State) -> Result<()>,
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut tick = SimTick::ZERO;
    let mut frames = vec![MicroWorldtestFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    }];

    while tick.0 < config.ticks {
        step(tick, &mut state)
            .with_context(|| format!("{}: step at tick {} failed", config.name, tick.0))?;
        tick = tick.advance(1);
        frames.push(MicroWorldtestFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }

    assert_json_snapshot(
        &config.snapshot_path,
        &Timeline {
            name: config.name,
            frames,
        },
    )
}
