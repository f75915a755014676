#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Pipe Loop.
//!
//! The world owns the tile grid and the walker. It is only mutated through
//! [`apply`], which re-validates every advance with the legality rules before
//! stamping a segment, so no sequence of commands can produce a grid that
//! revisits a cell.

mod grid;

use log::{debug, info, warn};
use pipe_loop_core::{
    Command, Direction, Event, GridError, MoveRejection, TileKind, WalkerSnapshot,
};
use pipe_loop_system_legality as legality;

pub use grid::TileGrid;

/// Represents the authoritative Pipe Loop world state.
#[derive(Clone, Debug)]
pub struct World {
    grid: TileGrid,
    walker: WalkerSnapshot,
    steps: u32,
    loop_closed: bool,
}

impl World {
    /// Creates an empty world with the walker parked at the origin.
    pub fn new(columns: u32, rows: u32, initial_direction: Direction) -> Result<Self, GridError> {
        let grid = TileGrid::new(columns, rows)?;
        Ok(Self {
            grid,
            walker: WalkerSnapshot::at_origin(initial_direction),
            steps: 0,
            loop_closed: false,
        })
    }

    fn advance(&mut self, action: Direction) -> Result<[Event; 2], MoveRejection> {
        if self.loop_closed {
            return Err(MoveRejection::WalkFinished);
        }

        let walker = self.walker;
        let destination = legality::check(self.grid.view(), walker, action)?;
        let tile = TileKind::for_turn(walker.direction, action).ok_or(MoveRejection::Reversal)?;
        self.grid
            .set(walker.cell, tile)
            .map_err(|_| MoveRejection::OutOfBounds)?;

        debug!(
            "arrived {:?}, leaving {:?}: stamped {:?} at ({}, {})",
            walker.direction,
            action,
            tile,
            walker.cell.column(),
            walker.cell.row()
        );

        self.walker = WalkerSnapshot::new(destination, action);
        self.steps = self.steps.saturating_add(1);

        Ok([
            Event::TileStamped {
                cell: walker.cell,
                tile,
            },
            Event::WalkerAdvanced {
                from: walker.cell,
                to: destination,
                direction: action,
            },
        ])
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            columns,
            rows,
            initial_direction,
        } => match World::new(columns, rows, initial_direction) {
            Ok(configured) => {
                *world = configured;
                info!("configured {columns}x{rows} grid, initial direction {initial_direction:?}");
                out_events.push(Event::GridConfigured { columns, rows });
            }
            Err(reason) => {
                warn!("grid configuration rejected: {reason}");
                out_events.push(Event::ConfigurationRejected { reason });
            }
        },
        Command::Advance { action } => match world.advance(action) {
            Ok(events) => {
                out_events.extend(events);
                if world.walker.cell.is_origin() {
                    world.loop_closed = true;
                    info!("loop closed after {} steps", world.steps);
                    out_events.push(Event::LoopClosed { steps: world.steps });
                }
            }
            Err(reason) => {
                warn!("advance {action:?} rejected: {reason}");
                out_events.push(Event::AdvanceRejected { action, reason });
            }
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use pipe_loop_core::{CellCoord, GridError, GridView, TileKind, WalkerSnapshot};

    /// Exposes a read-only view of the tile grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Returns the tile stored at `cell`.
    pub fn tile_at(world: &World, cell: CellCoord) -> Result<TileKind, GridError> {
        world.grid.get(cell)
    }

    /// Captures the walker's current position and heading.
    #[must_use]
    pub fn walker(world: &World) -> WalkerSnapshot {
        world.walker
    }

    /// Provides the grid dimensions as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.grid.columns(), world.grid.rows())
    }

    /// Number of advances applied since the grid was configured.
    #[must_use]
    pub fn steps_taken(world: &World) -> u32 {
        world.steps
    }

    /// Reports whether the walker returned to the origin.
    #[must_use]
    pub fn is_loop_closed(world: &World) -> bool {
        world.loop_closed
    }

    /// Encodes the grid as a flattened one-hot tensor.
    ///
    /// The logical shape is `[columns][rows][TileKind::COUNT]`: the value for
    /// channel `k` of cell `(x, y)` lives at `(x * rows + y) * COUNT + k`.
    #[must_use]
    pub fn one_hot(world: &World) -> Vec<f32> {
        let (columns, rows) = dimensions(world);
        let rows = rows as usize;
        let mut tensor = vec![0.0; columns as usize * rows * TileKind::COUNT];

        for (cell, tile) in grid_view(world).iter() {
            let cell_index = cell.column() as usize * rows + cell.row() as usize;
            tensor[cell_index * TileKind::COUNT + tile.ordinal()] = 1.0;
        }

        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipe_loop_core::CellCoord;

    const ORIGIN: CellCoord = CellCoord::ORIGIN;

    fn world(columns: u32, rows: u32) -> World {
        World::new(columns, rows, Direction::Left).expect("valid dimensions")
    }

    fn advance(world: &mut World, action: Direction) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::Advance { action }, &mut events);
        events
    }

    #[test]
    fn configure_grid_resets_state() {
        let mut world = world(3, 3);
        let _ = advance(&mut world, Direction::Down);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 4,
                rows: 2,
                initial_direction: Direction::Up,
            },
            &mut events,
        );

        assert_eq!(events, vec![Event::GridConfigured { columns: 4, rows: 2 }]);
        assert_eq!(query::dimensions(&world), (4, 2));
        assert_eq!(query::steps_taken(&world), 0);
        assert_eq!(
            query::walker(&world),
            WalkerSnapshot::at_origin(Direction::Up)
        );
        assert!(query::grid_view(&world)
            .cells()
            .iter()
            .all(|tile| tile.is_empty()));
    }

    #[test]
    fn invalid_configuration_keeps_previous_grid() {
        let mut world = world(3, 3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 0,
                rows: 5,
                initial_direction: Direction::Left,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::ConfigurationRejected {
                reason: GridError::InvalidDimensions {
                    columns: 0,
                    rows: 5
                }
            }]
        );
        assert_eq!(query::dimensions(&world), (3, 3));
    }

    #[test]
    fn advance_stamps_current_cell_and_moves() {
        let mut world = world(3, 3);
        let events = advance(&mut world, Direction::Down);

        assert_eq!(
            events,
            vec![
                Event::TileStamped {
                    cell: ORIGIN,
                    tile: TileKind::LeftUpper,
                },
                Event::WalkerAdvanced {
                    from: ORIGIN,
                    to: CellCoord::new(0, 1),
                    direction: Direction::Down,
                },
            ]
        );
        assert_eq!(query::tile_at(&world, ORIGIN), Ok(TileKind::LeftUpper));
        assert_eq!(
            query::walker(&world),
            WalkerSnapshot::new(CellCoord::new(0, 1), Direction::Down)
        );
        assert_eq!(query::steps_taken(&world), 1);
    }

    #[test]
    fn illegal_advance_leaves_world_untouched() {
        let mut world = world(3, 3);
        let before = query::grid_view(&world).cells().to_vec();

        let events = advance(&mut world, Direction::Right);

        assert_eq!(
            events,
            vec![Event::AdvanceRejected {
                action: Direction::Right,
                reason: MoveRejection::Reversal,
            }]
        );
        assert_eq!(query::grid_view(&world).cells(), before.as_slice());
        assert_eq!(query::walker(&world), WalkerSnapshot::at_origin(Direction::Left));
        assert_eq!(query::steps_taken(&world), 0);
    }

    #[test]
    fn two_by_two_loop_closes_after_four_steps() {
        let mut world = world(2, 2);
        let events: Vec<Event> = [
            Direction::Down,
            Direction::Right,
            Direction::Up,
            Direction::Left,
        ]
        .into_iter()
        .flat_map(|action| advance(&mut world, action))
        .collect();

        assert_eq!(events.last(), Some(&Event::LoopClosed { steps: 4 }));
        assert!(query::is_loop_closed(&world));
        assert_eq!(
            query::grid_view(&world).cells(),
            &[
                TileKind::LeftUpper,
                TileKind::RightUpper,
                TileKind::LeftLower,
                TileKind::RightLower,
            ]
        );

        let events = advance(&mut world, Direction::Down);
        assert_eq!(
            events,
            vec![Event::AdvanceRejected {
                action: Direction::Down,
                reason: MoveRejection::WalkFinished,
            }]
        );
    }

    #[test]
    fn one_hot_marks_exactly_one_channel_per_cell() {
        let mut world = world(3, 2);
        let _ = advance(&mut world, Direction::Down);

        let tensor = query::one_hot(&world);
        assert_eq!(tensor.len(), 3 * 2 * TileKind::COUNT);

        for chunk in tensor.chunks(TileKind::COUNT) {
            assert_eq!(chunk.iter().filter(|value| **value == 1.0).count(), 1);
        }

        let origin_channels = &tensor[..TileKind::COUNT];
        assert_eq!(origin_channels[TileKind::LeftUpper.ordinal()], 1.0);

        // cell (0, 1) sits right after (0, 0) because rows vary fastest
        let below_origin = &tensor[TileKind::COUNT..2 * TileKind::COUNT];
        assert_eq!(below_origin[TileKind::Empty.ordinal()], 1.0);
    }
}
