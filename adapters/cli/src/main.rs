#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Creep Defence level headlessly.

mod logging;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use creep_defence_core::{seconds, Event};
use creep_defence_simulation::{GameStatus, Simulation};
use creep_defence_system_bootstrap::LevelBlueprint;
use creep_defence_system_path_routing as routing;
use creep_defence_system_wave_director::Phase;
use log::LevelFilter;
use serde::Serialize;

/// Command-line arguments accepted by the headless runner.
#[derive(Debug, Parser)]
#[command(author, version, about = "Plays a Creep Defence level without a renderer")]
struct CliArgs {
    /// Level file to load.
    #[arg(default_value = "levels/demo.toml")]
    level: PathBuf,
    /// Overrides the routing seed declared by the level.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated milliseconds advanced per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Simulated seconds after which the run is abandoned.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f32,
    /// Idle seconds before the runner starts the next wave itself.
    #[arg(long, default_value_t = 2.0)]
    wave_delay: f32,
    /// Starts each wave as soon as the previous one clears.
    #[arg(long)]
    auto_advance: bool,
    /// Verbosity of the diagnostic log written to standard error.
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
    /// Prints the summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Outcome of a headless run.
#[derive(Debug, Serialize)]
struct RunSummary {
    level: String,
    status: GameStatus,
    elapsed_secs: f32,
    waves: usize,
    processed_creeps: u32,
    total_creeps: u32,
    kills: u32,
    misses: u32,
    score: u64,
    health: i32,
    gold: u32,
    shots_fired: u64,
}

/// Entry point for the Creep Defence command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    logging::setup_logging(args.log_level)?;

    let summary = run(&args)?;
    if args.json {
        let rendered =
            serde_json::to_string_pretty(&summary).context("failed to serialize run summary")?;
        println!("{rendered}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run(args: &CliArgs) -> Result<RunSummary> {
    if args.tick_ms == 0 {
        bail!("--tick-ms must be at least 1");
    }

    let mut level = LevelBlueprint::load(&args.level)
        .with_context(|| format!("failed to load level {}", args.level.display()))?;
    if let Some(seed) = args.seed {
        level.routing = routing::Config::new(level.routing.danger_tolerance(), seed);
    }
    let name = level.name.clone();

    let mut simulation = Simulation::new(level);
    if args.auto_advance {
        simulation.set_auto_advance(true);
    }

    let dt = Duration::from_millis(args.tick_ms);
    let limit = seconds(args.max_seconds);
    let wave_delay = seconds(args.wave_delay);
    let mut elapsed = Duration::ZERO;
    let mut idle = Duration::ZERO;
    let mut shots_fired = 0_u64;

    while elapsed < limit && simulation.sink().status() == GameStatus::Playing {
        if matches!(simulation.wave_progress().phase, Phase::Idle { .. }) {
            if idle >= wave_delay {
                if simulation.start_next_wave() {
                    log::debug!("runner started a wave at {:.2}s", elapsed.as_secs_f32());
                }
                idle = Duration::ZERO;
            } else {
                idle += dt;
            }
        }

        simulation.tick(dt);
        elapsed += dt;
        shots_fired += simulation
            .drain_events()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count() as u64;
    }

    if simulation.sink().status() == GameStatus::Playing {
        log::warn!(
            "run stopped after {:.1}s without a result",
            elapsed.as_secs_f32()
        );
    }

    let progress = simulation.wave_progress();
    let board = simulation.sink();
    Ok(RunSummary {
        level: name,
        status: board.status(),
        elapsed_secs: elapsed.as_secs_f32(),
        waves: progress.wave_count,
        processed_creeps: progress.processed_creeps,
        total_creeps: progress.total_creeps,
        kills: board.kills(),
        misses: board.misses(),
        score: board.score(),
        health: board.health(),
        gold: board.gold(),
        shots_fired,
    })
}

fn print_summary(summary: &RunSummary) {
    println!("{} ({:?}) after {:.1}s", summary.level, summary.status, summary.elapsed_secs);
    println!(
        "  creeps: {}/{} processed over {} wave(s), {} killed, {} leaked",
        summary.processed_creeps, summary.total_creeps, summary.waves, summary.kills, summary.misses
    );
    println!(
        "  score {}, health {}, gold {}, {} shot(s) fired",
        summary.score, summary.health, summary.gold, summary.shots_fired
    );
}
