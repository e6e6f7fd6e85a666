#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Hayrunner.
//!
//! Loads a TOML configuration, plays a scripted run against the endless grid
//! and prints the outcome.

mod config;
mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use hayrunner_core::{Event, GenerationWarning, HopDirection, SlabId, TileKindId};
use hayrunner_world::query;

use crate::config::GameConfig;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "hayrunner")]
#[command(about = "Play a scripted Hayrunner run on the command line")]
struct Args {
    /// TOML configuration; the bundled defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the generation seed from the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of simulation ticks
    #[arg(short, long, default_value = "600")]
    ticks: u64,

    /// Simulated milliseconds per tick
    #[arg(long, default_value = "16")]
    dt_ms: u64,

    /// Hop directions, cycled in order
    #[arg(long, value_enum, value_delimiter = ',', default_value = "forward")]
    hops: Vec<Hop>,

    /// Ticks between hop requests; 0 disables hopping
    #[arg(long, default_value = "15")]
    hop_every: u64,

    /// Print every world event
    #[arg(short, long)]
    verbose: bool,

    /// Print the master grid once the run is over
    #[arg(long)]
    print_grid: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Hop {
    Forward,
    Backward,
    Left,
    Right,
}

impl From<Hop> for HopDirection {
    fn from(hop: Hop) -> Self {
        match hop {
            Hop::Forward => HopDirection::Forward,
            Hop::Backward => HopDirection::Backward,
            Hop::Left => HopDirection::Left,
            Hop::Right => HopDirection::Right,
        }
    }
}

/// Entry point for the Hayrunner command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        GameConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }
    if args.verbose {
        print_catalog(&config);
    }

    let mut session = Session::new(&config);
    for (slab, warning) in query::startup_warnings(session.world()) {
        report_warning(&config, *slab, warning);
    }

    let events = match session.start() {
        Ok(events) => events,
        Err(reason) => bail!(
            "player cannot spawn at {:?}: {reason:?}",
            query::player_start(session.world())
        ),
    };
    report_events(&config, &events, args.verbose);

    let dt = Duration::from_millis(args.dt_ms);
    let mut script = args.hops.iter().copied().cycle();
    for step in 0..args.ticks {
        if args.hop_every > 0 && step % args.hop_every == 0 {
            if let Some(hop) = script.next() {
                session.request_hop(hop.into());
            }
        }
        let events = session.tick(dt);
        report_events(&config, &events, args.verbose);
        if session.is_over() {
            break;
        }
    }
    let events = session.finish();
    report_events(&config, &events, args.verbose);

    if args.print_grid {
        print!("{}", query::grid_dump(session.world()));
    }

    let stats = session.stats();
    let outcome = stats
        .outcome
        .map_or_else(|| "running".to_owned(), |reason| format!("{reason:?}"));
    println!(
        "seed={} ticks={} regenerations={} hops={} rejected_hops={} pickups={} speed={:.3} outcome={}",
        config.world.seed,
        stats.ticks,
        stats.regenerations,
        stats.hops,
        stats.rejected_hops,
        stats.pickups,
        stats.final_speed,
        outcome,
    );
    Ok(())
}

fn print_catalog(config: &GameConfig) {
    let catalog = &config.world.catalog;
    for (kind, definition) in catalog.iter() {
        let crossing = definition
            .crossing_asset
            .and_then(|asset| config.asset_name(asset))
            .unwrap_or("-");
        println!(
            "tile {:>2} {:<12} passable={} hiding={} crossing_asset={}",
            kind.get(),
            definition.name,
            definition.passable,
            definition.hiding_place,
            crossing,
        );
    }
}

fn report_events(config: &GameConfig, events: &[Event], verbose: bool) {
    for event in events {
        if let Event::GenerationWarning { slab, warning } = event {
            report_warning(config, *slab, warning);
        } else if verbose {
            println!("{event:?}");
        }
    }
}

fn report_warning(config: &GameConfig, slab: SlabId, warning: &GenerationWarning) {
    let catalog = &config.world.catalog;
    let name = |kind: TileKindId| {
        catalog
            .get(kind)
            .map_or("<unknown>", |definition| definition.name.as_str())
    };
    let message = match *warning {
        GenerationWarning::BoundaryClamped {
            requested_left,
            requested_right,
            applied_left,
            applied_right,
        } => format!(
            "boundary {requested_left}/{requested_right} clamped to {applied_left}/{applied_right}"
        ),
        GenerationWarning::CrossingRangeClamped {
            min_crossings,
            requested_max,
        } => format!("max crossings {requested_max} raised to {min_crossings}"),
        GenerationWarning::EmptyProbabilityTable => {
            "no weighted tiles; filling with the default tile".to_owned()
        }
        GenerationWarning::MissingFenceAsset { kind } => {
            format!("no fence asset for `{}`", name(kind))
        }
        GenerationWarning::MissingCrossingAsset { kind } => {
            format!("no crossing asset for `{}`", name(kind))
        }
    };
    eprintln!("warning: slab {}: {message}", slab.get());
}
