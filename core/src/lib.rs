#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pipe Loop engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Systems and renderers read the grid exclusively through
//! [`GridView`] snapshots.

use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the grid with an empty one and parks the walker at the origin.
    ConfigureGrid {
        /// Number of cell columns laid out in the grid.
        columns: u32,
        /// Number of cell rows laid out in the grid.
        rows: u32,
        /// Direction the walker pretends to have arrived from before its first move.
        initial_direction: Direction,
    },
    /// Requests that the walker stamp its current cell and leave it via `action`.
    Advance {
        /// Direction the walker leaves its current cell in.
        action: Direction,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Announces that a fresh, fully empty grid is in place.
    GridConfigured {
        /// Number of cell columns in the new grid.
        columns: u32,
        /// Number of cell rows in the new grid.
        rows: u32,
    },
    /// Reports that a grid configuration request was refused.
    ConfigurationRejected {
        /// Reason the configuration could not be applied.
        reason: GridError,
    },
    /// Confirms that a pipe segment was written into a cell.
    TileStamped {
        /// Cell that received the tile.
        cell: CellCoord,
        /// Tile written into the cell.
        tile: TileKind,
    },
    /// Confirms that the walker moved between two neighbouring cells.
    WalkerAdvanced {
        /// Cell the walker occupied before moving.
        from: CellCoord,
        /// Cell the walker occupies after moving.
        to: CellCoord,
        /// Direction of travel, which becomes the walker's new direction.
        direction: Direction,
    },
    /// Announces that the walker re-entered the origin and the loop is complete.
    LoopClosed {
        /// Number of advances taken to close the loop.
        steps: u32,
    },
    /// Reports that an advance request was refused and nothing changed.
    AdvanceRejected {
        /// Direction that was requested.
        action: Direction,
        /// Specific reason the advance failed.
        reason: MoveRejection,
    },
}

/// Cardinal directions the walker can travel in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
}

impl Direction {
    /// Every direction in the fixed order used when enumerating candidates.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Returns the direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Iterates the three directions that do not reverse `self`, in [`Direction::ALL`] order.
    pub fn candidates(self) -> impl Iterator<Item = Direction> {
        let reverse = self.opposite();
        Self::ALL
            .into_iter()
            .filter(move |direction| *direction != reverse)
    }
}

/// Pipe segment occupying a single grid cell.
///
/// Corner variants are named after their artwork files, not their geometry.
/// Each one documents the pair of cell edges its pipe connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKind {
    /// Bend joining the left and bottom edges.
    RightUpper,
    /// Bend joining the left and top edges.
    RightLower,
    /// Bend joining the right and bottom edges.
    LeftUpper,
    /// Bend joining the right and top edges.
    LeftLower,
    /// Straight segment joining the left and right edges.
    Horizontal,
    /// Straight segment joining the top and bottom edges.
    Vertical,
    /// Cell not yet visited by the walker.
    Empty,
}

impl TileKind {
    /// Number of distinct tile kinds.
    pub const COUNT: usize = 7;

    /// Every tile kind in declaration order.
    pub const ALL: [TileKind; Self::COUNT] = [
        TileKind::RightUpper,
        TileKind::RightLower,
        TileKind::LeftUpper,
        TileKind::LeftLower,
        TileKind::Horizontal,
        TileKind::Vertical,
        TileKind::Empty,
    ];

    /// Selects the segment for a cell entered travelling `arrived` and left via `leaving`.
    ///
    /// Returns `None` for reversals, which the legality rules never allow.
    #[must_use]
    pub const fn for_turn(arrived: Direction, leaving: Direction) -> Option<Self> {
        use Direction::{Down, Left, Right, Up};

        let tile = match (arrived, leaving) {
            (Left, Up) => Self::LeftLower,
            (Left, Down) => Self::LeftUpper,
            (Left, Left) => Self::Horizontal,
            (Right, Up) => Self::RightLower,
            (Right, Down) => Self::RightUpper,
            (Right, Right) => Self::Horizontal,
            (Up, Left) => Self::RightUpper,
            (Up, Right) => Self::LeftUpper,
            (Up, Up) => Self::Vertical,
            (Down, Left) => Self::RightLower,
            (Down, Right) => Self::LeftLower,
            (Down, Down) => Self::Vertical,
            (Left, Right) | (Right, Left) | (Up, Down) | (Down, Up) => return None,
        };
        Some(tile)
    }

    /// Zero-based position of the tile kind within [`TileKind::ALL`].
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::RightUpper => 0,
            Self::RightLower => 1,
            Self::LeftUpper => 2,
            Self::LeftLower => 3,
            Self::Horizontal => 4,
            Self::Vertical => 5,
            Self::Empty => 6,
        }
    }

    /// Reports whether the cell is still unvisited.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// The upper-left cell where every walk starts and must end.
    pub const ORIGIN: CellCoord = CellCoord::new(0, 0);

    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the cell is the walk origin.
    #[must_use]
    pub const fn is_origin(&self) -> bool {
        self.column == 0 && self.row == 0
    }

    /// Returns the neighbouring cell one step toward `direction`.
    ///
    /// Yields `None` when the neighbour falls outside a `columns` x `rows` grid.
    #[must_use]
    pub fn step(self, direction: Direction, columns: u32, rows: u32) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::Left => (self.column.checked_sub(1)?, self.row),
            Direction::Right => (self.column.checked_add(1)?, self.row),
            Direction::Up => (self.column, self.row.checked_sub(1)?),
            Direction::Down => (self.column, self.row.checked_add(1)?),
        };

        if column < columns && row < rows {
            Some(CellCoord::new(column, row))
        } else {
            None
        }
    }
}

/// Immutable snapshot of the walker's position and heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WalkerSnapshot {
    /// Cell the walker currently occupies.
    pub cell: CellCoord,
    /// Direction of the walker's most recent move, or the seeded initial direction.
    pub direction: Direction,
}

impl WalkerSnapshot {
    /// Creates a new walker snapshot.
    #[must_use]
    pub const fn new(cell: CellCoord, direction: Direction) -> Self {
        Self { cell, direction }
    }

    /// Walker parked at the origin facing the provided initial direction.
    #[must_use]
    pub const fn at_origin(direction: Direction) -> Self {
        Self::new(CellCoord::ORIGIN, direction)
    }
}

/// Read-only view into the dense tile grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [TileKind],
    columns: u32,
    rows: u32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [TileKind], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the tile stored in the provided cell.
    pub fn tile(&self, cell: CellCoord) -> Result<TileKind, GridError> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .ok_or(GridError::IndexOutOfRange {
                column: cell.column(),
                row: cell.row(),
                columns: self.columns,
                rows: self.rows,
            })
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Provides the dimensions of the underlying grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Raw row-major cell storage.
    #[must_use]
    pub fn cells(&self) -> &'a [TileKind] {
        self.cells
    }

    /// Iterates every cell together with its tile, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, TileKind)> + 'a {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, tile)| {
            let index = index as u64;
            let column = (index % u64::from(columns)) as u32;
            let row = (index / u64::from(columns)) as u32;
            (CellCoord::new(column, row), *tile)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Failures raised when building or addressing a tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum GridError {
    /// Both dimensions must be positive and their product addressable.
    #[error("grid dimensions must be positive (received {columns}x{rows})")]
    InvalidDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The addressed cell lies outside the grid.
    #[error("cell ({column}, {row}) lies outside the {columns}x{rows} grid")]
    IndexOutOfRange {
        /// Column that was addressed.
        column: u32,
        /// Row that was addressed.
        row: u32,
        /// Column count of the grid.
        columns: u32,
        /// Row count of the grid.
        rows: u32,
    },
}

/// Reasons a candidate move may be illegal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum MoveRejection {
    /// The move would immediately reverse the walker's direction.
    #[error("move reverses the current direction")]
    Reversal,
    /// The move would leave the grid.
    #[error("move leaves the grid")]
    OutOfBounds,
    /// The destination already holds a pipe segment and is not the origin.
    #[error("destination cell is already occupied")]
    Occupied,
    /// The loop is already closed, so the walker no longer moves.
    #[error("walk already closed the loop")]
    WalkFinished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for direction in Direction::ALL {
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn candidates_exclude_only_the_reverse() {
        let candidates: Vec<_> = Direction::Left.candidates().collect();
        assert_eq!(
            candidates,
            vec![Direction::Left, Direction::Up, Direction::Down]
        );

        for direction in Direction::ALL {
            let candidates: Vec<_> = direction.candidates().collect();
            assert_eq!(candidates.len(), 3);
            assert!(!candidates.contains(&direction.opposite()));
        }
    }

    #[test]
    fn turn_table_covers_every_non_reversal_pair() {
        for arrived in Direction::ALL {
            for leaving in Direction::ALL {
                let tile = TileKind::for_turn(arrived, leaving);
                if leaving == arrived.opposite() {
                    assert_eq!(tile, None, "{arrived:?} -> {leaving:?} is a reversal");
                } else {
                    let tile = tile.expect("non-reversal turns always stamp a tile");
                    assert!(!tile.is_empty());
                }
            }
        }
    }

    #[test]
    fn turn_table_matches_segment_geometry() {
        assert_eq!(
            TileKind::for_turn(Direction::Up, Direction::Left),
            TileKind::for_turn(Direction::Right, Direction::Down)
        );
        assert_eq!(
            TileKind::for_turn(Direction::Up, Direction::Right),
            TileKind::for_turn(Direction::Left, Direction::Down)
        );
        assert_eq!(
            TileKind::for_turn(Direction::Down, Direction::Left),
            TileKind::for_turn(Direction::Right, Direction::Up)
        );
        assert_eq!(
            TileKind::for_turn(Direction::Down, Direction::Right),
            TileKind::for_turn(Direction::Left, Direction::Up)
        );
    }

    #[test]
    fn corner_tiles_join_their_documented_edges() {
        // entering while travelling left means coming in through the right edge
        assert_eq!(
            TileKind::for_turn(Direction::Left, Direction::Down),
            Some(TileKind::LeftUpper)
        );
        assert_eq!(
            TileKind::for_turn(Direction::Left, Direction::Up),
            Some(TileKind::LeftLower)
        );
        assert_eq!(
            TileKind::for_turn(Direction::Right, Direction::Down),
            Some(TileKind::RightUpper)
        );
        assert_eq!(
            TileKind::for_turn(Direction::Right, Direction::Up),
            Some(TileKind::RightLower)
        );
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        for (index, tile) in TileKind::ALL.iter().enumerate() {
            assert_eq!(tile.ordinal(), index);
        }
    }

    #[test]
    fn step_stays_within_grid() {
        let origin = CellCoord::ORIGIN;
        assert_eq!(origin.step(Direction::Left, 3, 3), None);
        assert_eq!(origin.step(Direction::Up, 3, 3), None);
        assert_eq!(
            origin.step(Direction::Right, 3, 3),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(origin.step(Direction::Down, 3, 3), Some(CellCoord::new(0, 1)));

        let corner = CellCoord::new(2, 2);
        assert_eq!(corner.step(Direction::Right, 3, 3), None);
        assert_eq!(corner.step(Direction::Down, 3, 3), None);
    }

    #[test]
    fn grid_view_validates_bounds() {
        let cells = [TileKind::Empty; 6];
        let view = GridView::new(&cells, 3, 2);

        assert_eq!(view.tile(CellCoord::new(2, 1)), Ok(TileKind::Empty));
        assert_eq!(
            view.tile(CellCoord::new(3, 0)),
            Err(GridError::IndexOutOfRange {
                column: 3,
                row: 0,
                columns: 3,
                rows: 2,
            })
        );
    }

    #[test]
    fn grid_view_iterates_row_major() {
        let mut cells = [TileKind::Empty; 6];
        cells[4] = TileKind::Vertical;
        let view = GridView::new(&cells, 3, 2);

        let visited: Vec<_> = view.iter().collect();
        assert_eq!(visited.len(), 6);
        assert_eq!(visited[4], (CellCoord::new(1, 1), TileKind::Vertical));
        assert_eq!(visited[2].0, CellCoord::new(2, 0));
    }

    #[test]
    fn tile_kind_and_direction_round_trip_through_bincode() {
        let value = (TileKind::LeftUpper, Direction::Down, CellCoord::new(5, 7));
        let bytes = bincode::serialize(&value).expect("serialize");
        let restored: (TileKind, Direction, CellCoord) =
            bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, value);
    }
}
