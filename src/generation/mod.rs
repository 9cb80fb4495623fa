//! Tile pipeline: rasters in, voxel columns out.
//!
//! For every tile the pipeline:
//! 1. Reads land-cover and elevation windows covering the tile plus a halo
//! 2. Builds one nearest-neighbor index per raster
//! 3. Classifies the tile grown by the maximum depth (majority vote) and
//!    interpolates elevation over the tile itself (inverse distance)
//! 4. Synthesizes water depth and crops it back to the tile
//! 5. Writes one column per output cell into the shared chunk store

pub mod config;
pub mod landcover;
pub mod manifest;

pub use config::{RegionBounds, RenderConfig, RenderSettings, WATER_CODE};
pub use landcover::{LandcoverClass, LandcoverTable};
pub use manifest::write_manifest;

use std::path::PathBuf;
use std::time::Instant;

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::bathy::BathymetrySynthesizer;
use crate::core::{Error, Result};
use crate::export::preview::{clamp_gray, write_preview, PreviewKind};
use crate::interp::{QueryParams, SpatialIndex};
use crate::math::{Grid, GridExtent};
use crate::raster::{read_samples, window_for, Region};
use crate::tile::{RunReport, TileIndex, TileScheduler};
use crate::voxel::ChunkStore;

/// What one tile produced
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileSummary {
    pub index: TileIndex,
    /// Output cells owned by the tile
    pub base: GridExtent,
    pub columns: usize,
    pub water_cells: usize,
    pub deepest: u32,
    pub elapsed_ms: u64,
}

/// Per-tile RNG seed derived from the run seed
pub fn tile_seed(seed: u64, index: TileIndex) -> u64 {
    seed ^ ((index.row as u64) << 32 | index.col as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Store covering the whole output grid of a run. World x follows output
/// columns and world z follows output rows.
pub fn allocate_store(settings: &RenderSettings) -> ChunkStore {
    let grid = &settings.grid;
    ChunkStore::preallocated(
        settings.layout,
        0,
        0,
        grid.max_cols as i32 - 1,
        grid.max_rows as i32 - 1,
    )
}

/// Converts tiles of one region into columns in a chunk store
pub struct TilePipeline<'a> {
    region: &'a Region,
    settings: &'a RenderSettings,
    table: &'a LandcoverTable,
    store: &'a ChunkStore,
    image_dir: Option<PathBuf>,
}

impl<'a> TilePipeline<'a> {
    pub fn new(
        region: &'a Region,
        settings: &'a RenderSettings,
        table: &'a LandcoverTable,
        store: &'a ChunkStore,
    ) -> Self {
        Self {
            region,
            settings,
            table,
            store,
            image_dir: None,
        }
    }

    /// Also write `lc-`, `elev-` and `bathy-` preview images into `dir`
    pub fn with_previews(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    /// Process every tile in the configured range
    pub fn run(&self) -> Result<RunReport<TileSummary>> {
        let tiles = self.settings.range.indices();
        let (row_tiles, col_tiles) = self.settings.grid.tile_counts();
        log::info!(
            "Rendering {} of {}x{} tiles for region {} with {} workers",
            tiles.len(),
            row_tiles,
            col_tiles,
            self.region.name,
            self.settings.workers
        );
        TileScheduler::new(self.settings.workers).run(&tiles, |index| self.process_tile(index))
    }

    /// Geo position of an output cell corner
    fn cell_geo(&self, row: usize, col: usize) -> DVec2 {
        let mult = self.settings.mult;
        self.region
            .landcover
            .transform()
            .pixel_to_geo(col as f64 / mult, row as f64 / mult)
    }

    fn targets(&self, extent: &GridExtent) -> Vec<DVec2> {
        extent.cells().map(|(r, c)| self.cell_geo(r, c)).collect()
    }

    fn interpolate(
        &self,
        index: &SpatialIndex,
        extent: &GridExtent,
        params: &QueryParams,
    ) -> Result<Grid<f64>> {
        let values = index.query(&self.targets(extent), params)?;
        Grid::from_vec(extent.rows, extent.cols, values)
            .ok_or_else(|| Error::InvalidInput("interpolated grid has the wrong size".into()))
    }

    /// Run the whole pipeline for one tile
    pub fn process_tile(&self, index: TileIndex) -> Result<TileSummary> {
        let start = Instant::now();
        let settings = self.settings;
        let grid = &settings.grid;

        let base = grid.tile_extent(index, 0);
        let depth_extent = grid.tile_extent(index, settings.max_depth as usize);
        let sample_extent = grid.tile_extent(index, settings.sampling_halo());
        log::debug!(
            "Generating tile ({}, {}) with dimensions ({}, {})",
            index.row,
            index.col,
            base.rows,
            base.cols
        );

        // both rasters are windowed by the same geo corners
        let ul = self.cell_geo(sample_extent.row, sample_extent.col);
        let lr = self.cell_geo(sample_extent.row_end(), sample_extent.col_end());
        let landcover = self.region.landcover.as_ref();
        let elevation = self.region.elevation.as_ref();

        // no-data land cover reads as open water
        let water_code = self.table.water_code;
        let lc_samples = read_samples(
            landcover,
            &window_for(landcover, ul, lr),
            Some(water_code as f64),
            1.0,
        )?;
        let elev_samples = read_samples(
            elevation,
            &window_for(elevation, ul, lr),
            Some(0.0),
            settings.vscale,
        )?;
        let lc_index = SpatialIndex::from_samples(lc_samples);
        let elev_index = SpatialIndex::from_samples(elev_samples);

        let classes = self.interpolate(&lc_index, &depth_extent, &settings.majority_query())?;
        let classes = Grid::from_vec(
            classes.rows(),
            classes.cols(),
            classes
                .into_vec()
                .into_iter()
                .map(|v| v.round().clamp(0.0, 255.0) as u8)
                .collect(),
        )
        .ok_or_else(|| Error::InvalidInput("classified grid has the wrong size".into()))?;
        let elevations = self.interpolate(&elev_index, &base, &settings.weighted_query())?;

        let mut rng = ChaCha8Rng::seed_from_u64(tile_seed(settings.seed, index));
        let synthesizer = BathymetrySynthesizer::new(settings.bathymetry(water_code));
        let depths = synthesizer.synthesize(&classes, &mut rng);

        let inner = GridExtent::new(
            base.row - depth_extent.row,
            base.col - depth_extent.col,
            base.rows,
            base.cols,
        );
        let classes = classes.crop(&inner);
        let depths = depths.crop(&inner);

        let mut columns = Vec::with_capacity(base.area());
        let mut water_cells = 0;
        let mut deepest = 0;
        for (r, c) in base.cells() {
            let (i, j) = (r - base.row, c - base.col);
            let code = classes[(i, j)];
            let depth = depths[(i, j)];
            if self.table.is_water(code) {
                water_cells += 1;
                deepest = deepest.max(depth);
            }
            let elevation = elevations[(i, j)].round() as i32;
            columns.push(self.table.column(c as i32, r as i32, code, elevation, depth));
        }

        if let Some(dir) = &self.image_dir {
            self.write_previews(dir, &base, &classes, &elevations, &depths)?;
        }

        let written = self.store.write_columns(&columns)?;
        let summary = TileSummary {
            index,
            base,
            columns: written,
            water_cells,
            deepest,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        log::info!(
            "Tile ({}, {}) finished in {} ms: {} columns, {} water, deepest {}",
            index.row,
            index.col,
            summary.elapsed_ms,
            summary.columns,
            summary.water_cells,
            summary.deepest
        );
        Ok(summary)
    }

    fn write_previews(
        &self,
        dir: &std::path::Path,
        base: &GridExtent,
        classes: &Grid<u8>,
        elevations: &Grid<f64>,
        depths: &Grid<u32>,
    ) -> Result<()> {
        let offset = (base.row, base.col);
        write_preview(dir, PreviewKind::Landcover, offset, classes, |v| v)?;
        write_preview(dir, PreviewKind::Elevation, offset, elevations, clamp_gray)?;
        write_preview(dir, PreviewKind::Bathymetry, offset, depths, |v| v.min(255) as u8)?;
        Ok(())
    }
}
