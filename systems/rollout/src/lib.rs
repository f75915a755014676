#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded random rollout of the pipe walker.
//!
//! [`Rollout`] is a pure system: it reads the grid and walker, and answers
//! with at most one [`Command::Advance`] chosen uniformly among the legal
//! moves. [`Simulation`] owns a world together with a rollout and drives the
//! pair until the walker runs out of legal moves.

use log::{debug, info};
use pipe_loop_core::{CellCoord, Command, Direction, Event, GridError, GridView, WalkerSnapshot};
use pipe_loop_system_legality::legal_actions;
use pipe_loop_world::{self as world, query, World};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_COLUMNS: u32 = 5;
const DEFAULT_ROWS: u32 = 5;

/// Configuration parameters required to construct the rollout system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration drawing choices from the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that picks the walker's next move uniformly at random.
#[derive(Clone, Debug)]
pub struct Rollout {
    rng: ChaCha8Rng,
    finished: bool,
}

impl Rollout {
    /// Creates a new rollout system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            finished: false,
        }
    }

    /// Consumes world events and immutable views to emit the next advance.
    ///
    /// Nothing is emitted once the loop is closed or when no legal move exists.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid_view: GridView<'_>,
        walker: WalkerSnapshot,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::GridConfigured { .. } => self.finished = false,
                Event::LoopClosed { .. } => self.finished = true,
                _ => {}
            }
        }

        if self.finished {
            return;
        }

        let candidates = legal_actions(grid_view, walker);
        if let Some(action) = candidates.choose(&mut self.rng) {
            debug!("picked {action:?} from {candidates:?}");
            out.push(Command::Advance { action: *action });
        }
    }
}

/// Parameters describing a single walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of cell columns in the grid.
    pub columns: u32,
    /// Number of cell rows in the grid.
    pub rows: u32,
    /// Seed for the random move stream.
    pub seed: u64,
    /// Direction the walker is treated as having arrived from at the origin.
    pub initial_direction: Direction,
}

impl SimulationConfig {
    /// Creates a configuration for a `columns` x `rows` grid with default seed and heading.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            seed: 0,
            initial_direction: Direction::Left,
        }
    }

    /// Overrides the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Overrides the walker's initial direction.
    #[must_use]
    pub const fn with_initial_direction(mut self, initial_direction: Direction) -> Self {
        self.initial_direction = initial_direction;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS, DEFAULT_ROWS)
    }
}

/// Final state of a finished walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WalkOutcome {
    /// The walker returned to the origin.
    Closed {
        /// Number of advances in the loop.
        steps: u32,
    },
    /// The walker ran out of legal moves away from the origin.
    Stalled {
        /// Number of advances taken before getting stuck.
        steps: u32,
        /// Cell where the walker got stuck.
        cell: CellCoord,
    },
}

impl WalkOutcome {
    /// Number of advances taken during the walk.
    #[must_use]
    pub const fn steps(&self) -> u32 {
        match self {
            Self::Closed { steps } | Self::Stalled { steps, .. } => *steps,
        }
    }

    /// Reports whether the walk produced a closed loop.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// Owns one world and one rollout system and drives them to completion.
#[derive(Clone, Debug)]
pub struct Simulation {
    world: World,
    rollout: Rollout,
    pending: Vec<Event>,
    history: Vec<Event>,
}

impl Simulation {
    /// Builds an empty world for the configured grid.
    ///
    /// Fails with [`GridError::InvalidDimensions`] before any walk starts when
    /// either dimension is zero.
    pub fn new(config: SimulationConfig) -> Result<Self, GridError> {
        let world = World::new(config.columns, config.rows, config.initial_direction)?;
        info!(
            "starting {}x{} walk with seed {:#x}, initial direction {:?}",
            config.columns, config.rows, config.seed, config.initial_direction
        );
        Ok(Self {
            world,
            rollout: Rollout::new(Config::new(config.seed)),
            pending: Vec::new(),
            history: Vec::new(),
        })
    }

    /// Performs at most one advance, returning `true` when the walker moved.
    pub fn step(&mut self) -> bool {
        let mut commands = Vec::new();
        self.rollout.handle(
            &self.pending,
            query::grid_view(&self.world),
            query::walker(&self.world),
            &mut commands,
        );
        self.pending.clear();

        for command in commands {
            world::apply(&mut self.world, command, &mut self.pending);
        }
        self.history.extend_from_slice(&self.pending);

        self.pending
            .iter()
            .any(|event| matches!(event, Event::WalkerAdvanced { .. }))
    }

    /// Steps until no legal move remains and reports how the walk ended.
    pub fn run(&mut self) -> WalkOutcome {
        while self.step() {}

        let outcome = self.outcome();
        info!("walk finished: {outcome:?}");
        outcome
    }

    /// Describes the walk as it currently stands.
    #[must_use]
    pub fn outcome(&self) -> WalkOutcome {
        let steps = query::steps_taken(&self.world);
        if query::is_loop_closed(&self.world) {
            WalkOutcome::Closed { steps }
        } else {
            WalkOutcome::Stalled {
                steps,
                cell: query::walker(&self.world).cell,
            }
        }
    }

    /// Read-only access to the simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Every event the world broadcast since the simulation was created.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.history
    }
}
