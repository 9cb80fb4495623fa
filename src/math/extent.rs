//! Axis-aligned rectangular extent on an integer grid

use serde::{Deserialize, Serialize};

/// Half-open rectangle `[row, row + rows) x [col, col + cols)` on a grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridExtent {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl GridExtent {
    /// Create extent from offset and size
    pub fn new(row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self { row, col, rows, cols }
    }

    /// Create extent from inclusive start and exclusive end corners
    pub fn from_corners(row: usize, col: usize, row_end: usize, col_end: usize) -> Self {
        Self {
            row,
            col,
            rows: row_end.saturating_sub(row),
            cols: col_end.saturating_sub(col),
        }
    }

    /// Exclusive end row
    pub fn row_end(&self) -> usize {
        self.row + self.rows
    }

    /// Exclusive end column
    pub fn col_end(&self) -> usize {
        self.col + self.cols
    }

    /// Number of cells covered
    pub fn area(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Check if a cell lies inside the extent
    pub fn contains_cell(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.row_end() && col >= self.col && col < self.col_end()
    }

    /// Check if another extent lies entirely inside this one
    pub fn contains(&self, other: &GridExtent) -> bool {
        other.row >= self.row
            && other.col >= self.col
            && other.row_end() <= self.row_end()
            && other.col_end() <= self.col_end()
    }

    /// Overlapping part of two extents (empty when disjoint)
    pub fn intersection(&self, other: &GridExtent) -> GridExtent {
        let row = self.row.max(other.row);
        let col = self.col.max(other.col);
        let row_end = self.row_end().min(other.row_end());
        let col_end = self.col_end().min(other.col_end());
        GridExtent::from_corners(row, col, row_end.max(row), col_end.max(col))
    }

    /// Grow by `margin` on every side, clipped to `[0, max_rows) x [0, max_cols)`
    pub fn expanded(&self, margin: usize, max_rows: usize, max_cols: usize) -> GridExtent {
        GridExtent::from_corners(
            self.row.saturating_sub(margin),
            self.col.saturating_sub(margin),
            (self.row_end() + margin).min(max_rows),
            (self.col_end() + margin).min(max_cols),
        )
    }

    /// Row-major iterator over every (row, col) cell
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row..self.row_end())
            .flat_map(move |r| (self.col..self.col_end()).map(move |c| (r, c)))
    }
}
