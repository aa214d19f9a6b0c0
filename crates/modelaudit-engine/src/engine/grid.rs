//! Rectangular sheet grid.

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellValue};
use super::cell_ref::CellRef;

/// A rectangular, immutable snapshot of a sheet's used range.
///
/// Coordinates are 0-based and relative to `origin`, the sheet cell where the
/// used range starts (A1 by default). Formula cells carry shapes computed at
/// their sheet position, i.e. `origin` plus their grid coordinates.
/// Reads outside the grid return an empty cell, so detectors can read
/// neighbours without bounds checks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    #[serde(default)]
    origin: CellRef,
}

static EMPTY_CELL: Cell = Cell {
    value: CellValue::Empty,
    formula: None,
    shape: None,
};

impl SheetGrid {
    /// Build a grid from ragged rows; short rows are padded with empty cells.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> SheetGrid {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);
        for mut row in rows {
            row.resize_with(cols, Cell::new_empty);
            cells.extend(row);
        }
        SheetGrid {
            rows: row_count,
            cols,
            cells,
            origin: CellRef::default(),
        }
    }

    /// Place the grid's top-left cell at `origin` on the sheet.
    pub fn with_origin(mut self, origin: CellRef) -> SheetGrid {
        self.origin = origin;
        self
    }

    pub fn origin(&self) -> CellRef {
        self.origin
    }

    /// Sheet position of the grid cell at (row, col).
    pub fn address(&self, row: usize, col: usize) -> CellRef {
        CellRef::new(self.origin.col + col, self.origin.row + row)
    }

    /// Build a grid of plain values (no formulas).
    pub fn from_values(rows: Vec<Vec<CellValue>>) -> SheetGrid {
        SheetGrid::from_rows(
            rows.into_iter()
                .map(|r| r.into_iter().map(Cell::new_value).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        if row >= self.rows || col >= self.cols {
            return &EMPTY_CELL;
        }
        &self.cells[row * self.cols + col]
    }

    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        &self.cell(row, col).value
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        if row >= self.rows {
            return &[];
        }
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Number of cells holding a formula.
    pub fn formula_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_formula()).count()
    }
}
