//! Render configuration and per-region parameter resolution.
//!
//! A [`RenderConfig`] holds what the user asked for. Resolving it against a
//! region's [`RegionBounds`] clamps every value into its valid range and
//! yields the [`RenderSettings`] a run actually uses. Each adjustment is
//! reported with a warning; nothing here fails.

use serde::{Deserialize, Serialize};

use crate::bathy::{BathymetryParams, MAX_SLOPE};
use crate::core::Result;
use crate::interp::QueryParams;
use crate::raster::Region;
use crate::tile::{TileGrid, TileRange};
use crate::voxel::ChunkLayout;

/// Land-cover code used for water and for land-cover no-data
pub const WATER_CODE: u8 = 11;

/// Requested rendering parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Horizontal scale: raster units per output column
    pub scale: f64,
    /// Vertical scale: elevation units per block
    pub vscale: f64,
    /// Deepest synthesized water depth in blocks
    pub max_depth: u32,
    /// Bathymetry dropoff control
    pub slope: f64,
    /// Tile shape (rows, cols) in output cells
    pub tile: (usize, usize),
    /// First tile (row, col) to render
    pub start: (usize, usize),
    /// One past the last tile; zero means "through the last tile"
    pub end: (usize, usize),
    pub workers: usize,
    pub seed: u64,
    /// Sampling margin around each tile, in output cells
    pub halo: usize,
    /// Neighbors consulted per interpolated cell
    pub neighbors: usize,
    /// Distance under which a sample is taken verbatim
    pub epsilon: f64,
    pub layout: ChunkLayout,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 6.0,
            vscale: 6.0,
            max_depth: 10,
            slope: 1.0,
            tile: (256, 256),
            start: (0, 0),
            end: (0, 0),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            seed: 0,
            halo: 16,
            neighbors: 11,
            epsilon: 0.1,
            layout: ChunkLayout::default(),
        }
    }
}

/// Facts about a region that bound the render parameters
#[derive(Clone, Debug, PartialEq)]
pub struct RegionBounds {
    pub name: String,
    /// Land-cover raster lines
    pub rows: usize,
    /// Land-cover raster pixels per line
    pub cols: usize,
    /// Land-cover pixel size in geo units
    pub pixel_size: f64,
    /// Highest valid elevation sample
    pub elev_max: f64,
}

impl RegionBounds {
    pub fn of(region: &Region) -> Self {
        let (rows, cols) = region.dims();
        let (_, elev_max) = region.elevation.min_max();
        Self {
            name: region.name.clone(),
            rows,
            cols,
            pixel_size: region.landcover.transform().pixel_size(),
            elev_max: if elev_max.is_finite() { elev_max } else { 0.0 },
        }
    }
}

/// Effective parameters for one run over one region
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderSettings {
    pub scale: f64,
    /// Output cells per raster pixel
    pub mult: f64,
    pub vscale: f64,
    pub max_depth: u32,
    pub slope: f64,
    pub grid: TileGrid,
    pub range: TileRange,
    pub workers: usize,
    pub seed: u64,
    pub halo: usize,
    pub neighbors: usize,
    pub epsilon: f64,
    pub layout: ChunkLayout,
}

impl RenderSettings {
    /// Nearest-neighbor parameters for elevation
    pub fn weighted_query(&self) -> QueryParams {
        QueryParams::weighted(self.neighbors, self.epsilon)
    }

    /// Nearest-neighbor parameters for land cover
    pub fn majority_query(&self) -> QueryParams {
        QueryParams::majority(self.neighbors, self.epsilon)
    }

    /// Depth synthesis parameters for the given water class
    pub fn bathymetry(&self, water_code: u8) -> BathymetryParams {
        BathymetryParams::new(water_code, self.max_depth, self.slope)
    }

    /// Margin sampled around each tile: enough for the halo and for the
    /// depth search
    pub fn sampling_halo(&self) -> usize {
        self.halo.max(self.max_depth as usize)
    }
}

fn note<T: PartialEq + std::fmt::Display>(region: &str, what: &str, old: T, new: T) -> T {
    if old != new {
        log::warn!("{} of {} for region {} is invalid -- changed to {}", what, old, region, new);
    }
    new
}

impl RenderConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Clamp every parameter against the region and build the tile grid
    pub fn resolve(&self, bounds: &RegionBounds) -> RenderSettings {
        let name = bounds.name.as_str();
        let layout = self.layout;

        let workers = note(name, "process count", self.workers, self.workers.max(1));

        let pixel_size = if bounds.pixel_size.is_finite() && bounds.pixel_size > 0.0 {
            bounds.pixel_size
        } else {
            1.0
        };
        let requested = if self.scale.is_nan() { 1.0 } else { self.scale };
        let scale = requested.min(pixel_size).max(1.0_f64.min(pixel_size));
        let scale = note(name, "scale", self.scale, scale);
        let mult = pixel_size / scale;

        let max_rows = ((bounds.rows as f64 * mult) as usize).max(1);
        let max_cols = ((bounds.cols as f64 * mult) as usize).max(1);

        let max_elevation = layout.max_elevation().max(1) as f64;
        let vscale_floor = (bounds.elev_max / max_elevation).max(1.0);
        let vscale_ceiling = bounds.elev_max.max(1.0).max(vscale_floor);
        let requested = if self.vscale.is_nan() { vscale_floor } else { self.vscale };
        let vscale = note(
            name,
            "vertical scale",
            self.vscale,
            requested.clamp(vscale_floor, vscale_ceiling),
        );

        let depth_ceiling = max_rows
            .min(max_cols)
            .min(layout.sea_level.saturating_sub(1) as usize)
            .max(1) as u32;
        let max_depth = self.max_depth.clamp(1, depth_ceiling);
        let max_depth = note(name, "maximum depth", self.max_depth, max_depth);

        let requested = if self.slope.is_nan() { 1.0 } else { self.slope };
        let slope = note(name, "slope", self.slope, requested.clamp(1.0, MAX_SLOPE));

        let tile_rows = self.tile.0.clamp(1, max_rows);
        let tile_cols = self.tile.1.clamp(1, max_cols);
        if (tile_rows, tile_cols) != self.tile {
            log::warn!(
                "tile size of {}, {} for region {} is invalid -- changed to {}, {}",
                self.tile.0,
                self.tile.1,
                name,
                tile_rows,
                tile_cols
            );
        }

        let grid = TileGrid::new(max_rows, max_cols, tile_rows, tile_cols);
        let range = resolve_range(name, &grid, self.start, self.end);

        RenderSettings {
            scale,
            mult,
            vscale,
            max_depth,
            slope,
            grid,
            range,
            workers,
            seed: self.seed,
            halo: self.halo,
            neighbors: self.neighbors.max(1),
            epsilon: if self.epsilon.is_finite() { self.epsilon.max(0.0) } else { 0.0 },
            layout,
        }
    }
}

fn resolve_range(
    name: &str,
    grid: &TileGrid,
    start: (usize, usize),
    end: (usize, usize),
) -> TileRange {
    let (row_tiles, col_tiles) = grid.tile_counts();
    let clamp_end = |end: usize, count: usize, axis: &str| {
        if end > count {
            log::warn!(
                "end {} of {} for region {} exceeds {} -- changed to {}",
                axis,
                end,
                name,
                count,
                count
            );
        }
        if end == 0 || end > count { count } else { end }
    };
    let clamp_start = |start: usize, end: usize, axis: &str| {
        if start > end {
            log::warn!(
                "start {} of {} for region {} is past the end -- changed to {}",
                axis,
                start,
                name,
                end
            );
            end
        } else {
            start
        }
    };

    let max_row = clamp_end(end.0, row_tiles, "row");
    let max_col = clamp_end(end.1, col_tiles, "col");
    let min_row = clamp_start(start.0, max_row, "row");
    let min_col = clamp_start(start.1, max_col, "col");
    TileRange::new(min_row, min_col, max_row, max_col)
}
