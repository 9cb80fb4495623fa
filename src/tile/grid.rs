//! Tile decomposition of the output grid

use serde::{Deserialize, Serialize};

use crate::math::GridExtent;

/// Tile identifier: (row index, column index) in tile units
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    pub row: usize,
    pub col: usize,
}

impl TileIndex {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Half-open range of tile indices `[min_row, max_row) x [min_col, max_col)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl TileRange {
    pub fn new(min_row: usize, min_col: usize, max_row: usize, max_col: usize) -> Self {
        Self { min_row, min_col, max_row, max_col }
    }

    /// Number of tiles in the range
    pub fn len(&self) -> usize {
        self.max_row.saturating_sub(self.min_row) * self.max_col.saturating_sub(self.min_col)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major enumeration of every tile index
    pub fn indices(&self) -> Vec<TileIndex> {
        (self.min_row..self.max_row)
            .flat_map(|r| (self.min_col..self.max_col).map(move |c| TileIndex::new(r, c)))
            .collect()
    }
}

/// Output grid partitioned into fixed-shape tiles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    pub max_rows: usize,
    pub max_cols: usize,
    pub tile_rows: usize,
    pub tile_cols: usize,
}

impl TileGrid {
    /// Create a tile grid; tile sides are raised to at least 1
    pub fn new(max_rows: usize, max_cols: usize, tile_rows: usize, tile_cols: usize) -> Self {
        Self {
            max_rows,
            max_cols,
            tile_rows: tile_rows.max(1),
            tile_cols: tile_cols.max(1),
        }
    }

    /// Tiles needed to cover the grid: (row tiles, column tiles)
    pub fn tile_counts(&self) -> (usize, usize) {
        (
            self.max_rows.div_ceil(self.tile_rows),
            self.max_cols.div_ceil(self.tile_cols),
        )
    }

    /// Every tile of the grid
    pub fn full_range(&self) -> TileRange {
        let (rows, cols) = self.tile_counts();
        TileRange::new(0, 0, rows, cols)
    }

    /// Footprint of a tile grown by `halo` on every side.
    ///
    /// With `halo == 0` this is the tile's own output footprint. The result
    /// is clipped to the grid and never wraps around an edge.
    pub fn tile_extent(&self, index: TileIndex, halo: usize) -> GridExtent {
        let base = GridExtent::new(
            index.row * self.tile_rows,
            index.col * self.tile_cols,
            self.tile_rows,
            self.tile_cols,
        );
        base.expanded(halo, self.max_rows, self.max_cols)
    }

    /// Full output grid extent
    pub fn extent(&self) -> GridExtent {
        GridExtent::new(0, 0, self.max_rows, self.max_cols)
    }
}
