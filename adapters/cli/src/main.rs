#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays an Arena Waves arena headlessly.

mod arena_file;
mod report;
mod turret;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use arena_waves_core::seconds_to_duration;
use arena_waves_simulation::Simulation;
use arena_waves_world::query;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    arena_file::load_arena,
    report::{CountingSink, WaveReadout},
    turret::Turret,
};

/// Plays an arena for a fixed span of simulated time and reports progress.
#[derive(Debug, Parser)]
#[command(author, version, about = "Arena Waves headless runner", long_about = None)]
struct Args {
    /// Arena file to load; the bundled arena is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run.
    #[arg(short, long, default_value_t = 30.0)]
    seconds: f32,

    /// Length of one tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Overrides the arena's random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated second at which the arena is cleared and wave 1 restarts.
    #[arg(long)]
    reset_at: Option<f32>,

    /// Seconds between timer readouts.
    #[arg(long, default_value_t = 1.0)]
    report_every: f32,

    /// Ticks between turret shots; the turret stays idle when omitted.
    #[arg(long)]
    volley_every: Option<u32>,
}

/// Log filter taken from `RUST_LOG`, falling back to `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Entry point for the Arena Waves command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let args = Args::parse();
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        bail!("--seconds must be a positive number, got {}", args.seconds);
    }
    if args.tick_ms == 0 {
        bail!("--tick-ms must be at least 1");
    }

    let mut arena = load_arena(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        arena.seed = seed;
    }

    let mut simulation = Simulation::with_sink(&arena, CountingSink::default())
        .context("arena configuration rejected")?;
    info!(
        seed = arena.seed,
        waves = simulation.schedule().wave_count(),
        "arena loaded"
    );
    let mut turret = args
        .volley_every
        .and_then(|every| Turret::from_arena(&arena, every, 1.0));

    let dt = Duration::from_millis(args.tick_ms);
    let run_for = seconds_to_duration(args.seconds);
    let report_every = seconds_to_duration(args.report_every);
    let mut reset_at = args.reset_at.map(seconds_to_duration);

    let mut clock = Duration::ZERO;
    let mut since_report = Duration::ZERO;
    let mut volleys = 0_u64;
    while clock < run_for {
        if reset_at.is_some_and(|at| clock >= at) {
            info!(at = clock.as_secs_f32(), "clearing arena");
            simulation.reset_waves();
            reset_at = None;
        }

        simulation.tick(dt);
        if turret
            .as_mut()
            .is_some_and(|turret| turret.update(&mut simulation))
        {
            volleys += 1;
        }

        clock += dt;
        since_report += dt;
        if since_report >= report_every {
            since_report = Duration::ZERO;
            let readout = WaveReadout {
                elapsed: simulation.wave_elapsed(),
                wave: simulation.wave_display(),
                length: simulation.schedule().current_wave_duration(),
            };
            let live = query::live_count(simulation.world());
            match readout.progress() {
                Some(progress) => {
                    println!("{readout}  ({:.0}%)  live: {live}", progress * 100.0);
                }
                None => println!("{readout}  live: {live}"),
            }
        }
    }

    let (sink, destroyed) = simulation.shutdown();
    println!("{sink}");
    println!("volleys: {volleys}");
    info!(destroyed, "arena torn down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn bare_level_overrides_default() {
        assert_eq!(
            log_filter(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("warn")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }
}
