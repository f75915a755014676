//! Dense tile storage backing the world.

use pipe_loop_core::{CellCoord, GridError, GridView, TileKind};

/// Row-major grid of pipe segments, indexed as `column + columns * row`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    cells: Vec<TileKind>,
}

impl TileGrid {
    /// Creates a grid with every cell set to [`TileKind::Empty`].
    ///
    /// Fails with [`GridError::InvalidDimensions`] when either dimension is
    /// zero or the cell count does not fit in memory addressing.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        let invalid = GridError::InvalidDimensions { columns, rows };
        if columns == 0 || rows == 0 {
            return Err(invalid);
        }

        let capacity =
            usize::try_from(u64::from(columns) * u64::from(rows)).map_err(|_| invalid)?;
        Ok(Self {
            columns,
            rows,
            cells: vec![TileKind::Empty; capacity],
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Returns the tile stored at `cell`.
    pub fn get(&self, cell: CellCoord) -> Result<TileKind, GridError> {
        self.index(cell)
            .map(|index| self.cells[index])
            .ok_or_else(|| self.out_of_range(cell))
    }

    /// Overwrites the tile stored at `cell`.
    pub fn set(&mut self, cell: CellCoord, tile: TileKind) -> Result<(), GridError> {
        let index = self.index(cell).ok_or_else(|| self.out_of_range(cell))?;
        self.cells[index] = tile;
        Ok(())
    }

    /// Captures a read-only view for systems and renderers.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn out_of_range(&self, cell: CellCoord) -> GridError {
        GridError::IndexOutOfRange {
            column: cell.column(),
            row: cell.row(),
            columns: self.columns,
            rows: self.rows,
        }
    }
}
