#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that walks a random pipe loop and renders it.

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use pipe_loop_core::Direction;
use pipe_loop_rendering::{PngSink, RenderSink, TextSink, TileAtlas};
use pipe_loop_system_rollout::{Simulation, SimulationConfig, WalkOutcome};
use pipe_loop_world::query;

/// Random closed pipe loop generator.
#[derive(Parser, Debug)]
#[command(name = "pipe-loop", version, about, long_about = None)]
struct Args {
    /// Number of grid columns
    #[arg(long, default_value_t = 5)]
    columns: u32,

    /// Number of grid rows
    #[arg(long, default_value_t = 5)]
    rows: u32,

    /// Random seed; drawn from the system generator when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Direction the walker is treated as having arrived from at the origin
    #[arg(long, value_enum, default_value_t = Heading::Left)]
    initial_direction: Heading,

    /// Tile manifest describing the artwork for every segment
    #[arg(long, default_value_os_t = TileAtlas::default_manifest_path())]
    assets: PathBuf,

    /// Where the composed PNG is written
    #[arg(long, default_value_os_t = PngSink::default_output_path())]
    output: PathBuf,

    /// Also print the grid with box-drawing characters
    #[arg(long)]
    text: bool,

    /// Skip writing the PNG image
    #[arg(long)]
    no_image: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Heading {
    Left,
    Right,
    Up,
    Down,
}

impl From<Heading> for Direction {
    fn from(heading: Heading) -> Self {
        match heading {
            Heading::Left => Direction::Left,
            Heading::Right => Direction::Right,
            Heading::Up => Direction::Up,
            Heading::Down => Direction::Down,
        }
    }
}

/// Entry point for the Pipe Loop command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = SimulationConfig::new(args.columns, args.rows)
        .with_seed(seed)
        .with_initial_direction(args.initial_direction.into());

    let mut simulation = Simulation::new(config).context("invalid grid configuration")?;
    match simulation.run() {
        WalkOutcome::Closed { steps } => {
            info!("closed a loop of {steps} tiles (replay with --seed {seed})");
        }
        WalkOutcome::Stalled { steps, cell } => info!(
            "walk stalled at ({}, {}) after {steps} steps (replay with --seed {seed})",
            cell.column(),
            cell.row()
        ),
    }

    let grid = query::grid_view(simulation.world());
    if args.text {
        TextSink::new(io::stdout().lock()).present(grid)?;
    }

    if !args.no_image {
        let atlas = TileAtlas::from_manifest_path(&args.assets)?;
        PngSink::new(atlas, args.output).present(grid)?;
    }

    Ok(())
}
