//! Topovox - renders a raster region into voxel terrain chunks.
//!
//! Usage: topovox [REGION] [OPTIONS]
//!
//! Without a region the valid regions found under the dataset roots are
//! listed. With one, the region is tiled, interpolated and written into
//! chunk files (`--arrays`) and optional per-tile previews (`--images`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use topovox::core::{logging, Result};
use topovox::export::export_store;
use topovox::generation::{
    allocate_store, write_manifest, LandcoverTable, RegionBounds, RenderConfig, TilePipeline,
};
use topovox::raster::catalog::DEFAULT_DATASET_PATHS;
use topovox::raster::RegionCatalog;

#[derive(Parser, Debug)]
#[command(name = "topovox")]
#[command(about = "Convert land-cover and elevation rasters into voxel terrain")]
struct Args {
    /// Region to render; omit to list the valid regions
    region: Option<String>,

    /// Number of worker threads
    #[arg(long = "processes")]
    processes: Option<usize>,

    /// Horizontal scale (raster units per block)
    #[arg(long)]
    scale: Option<f64>,

    /// Vertical scale (elevation units per block)
    #[arg(long)]
    vscale: Option<f64>,

    /// Maximum synthesized water depth
    #[arg(long)]
    maxdepth: Option<u32>,

    /// Bathymetry slope (1 to 4; higher deepens faster)
    #[arg(long)]
    slope: Option<f64>,

    /// Tile size in blocks: ROWS COLS
    #[arg(long, num_args = 2, value_names = ["ROWS", "COLS"])]
    tile: Option<Vec<usize>>,

    /// First tile to render: ROW COL
    #[arg(long, num_args = 2, value_names = ["ROW", "COL"])]
    start: Option<Vec<usize>>,

    /// One past the last tile to render: ROW COL (0 means all)
    #[arg(long, num_args = 2, value_names = ["ROW", "COL"])]
    end: Option<Vec<usize>>,

    /// Seed for bathymetry randomization
    #[arg(long)]
    seed: Option<u64>,

    /// Sampling margin around each tile in blocks
    #[arg(long)]
    halo: Option<usize>,

    /// Dataset root directories to scan for regions
    #[arg(long, num_args = 1..)]
    datasets: Vec<PathBuf>,

    /// Directory for per-tile preview images
    #[arg(long)]
    images: Option<PathBuf>,

    /// Directory for exported chunk files
    #[arg(long)]
    arrays: Option<PathBuf>,

    /// JSON render configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON land-cover table replacing the built-in classes
    #[arg(long)]
    landcover: Option<PathBuf>,
}

fn pair(values: &Option<Vec<usize>>) -> Option<(usize, usize)> {
    match values.as_deref() {
        Some([a, b]) => Some((*a, *b)),
        _ => None,
    }
}

impl Args {
    /// Layer command-line flags over a base configuration
    fn apply(&self, mut config: RenderConfig) -> RenderConfig {
        if let Some(v) = self.processes {
            config.workers = v;
        }
        if let Some(v) = self.scale {
            config.scale = v;
        }
        if let Some(v) = self.vscale {
            config.vscale = v;
        }
        if let Some(v) = self.maxdepth {
            config.max_depth = v;
        }
        if let Some(v) = self.slope {
            config.slope = v;
        }
        if let Some(v) = pair(&self.tile) {
            config.tile = v;
        }
        if let Some(v) = pair(&self.start) {
            config.start = v;
        }
        if let Some(v) = pair(&self.end) {
            config.end = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.halo {
            config.halo = v;
        }
        config
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let roots: Vec<PathBuf> = if args.datasets.is_empty() {
        DEFAULT_DATASET_PATHS.iter().map(PathBuf::from).collect()
    } else {
        args.datasets.clone()
    };
    let catalog = RegionCatalog::discover(&roots);

    let Some(name) = args.region.as_deref() else {
        print!("{}", catalog.listing());
        return Ok(ExitCode::SUCCESS);
    };
    let Some(region) = catalog.get(name) else {
        eprintln!("Region '{}' not found", name);
        eprint!("{}", catalog.listing());
        return Ok(ExitCode::FAILURE);
    };

    let base = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    let config = args.apply(base);
    let table = match &args.landcover {
        Some(path) => LandcoverTable::load(path)?,
        None => LandcoverTable::default(),
    };

    let settings = config.resolve(&RegionBounds::of(region));
    let (row_tiles, col_tiles) = settings.grid.tile_counts();

    println!("=== Topovox ===");
    println!("Region:  {} {:?}", region.name, region.dims());
    println!("Scale:   {} (x{:.3}), vertical {}", settings.scale, settings.mult, settings.vscale);
    println!("Depth:   max {}, slope {}", settings.max_depth, settings.slope);
    println!("Grid:    {} x {} blocks", settings.grid.max_rows, settings.grid.max_cols);
    println!("Tiles:   {} of {} x {}", settings.range.len(), row_tiles, col_tiles);
    println!("Workers: {}", settings.workers);
    println!();

    let start = Instant::now();
    let store = allocate_store(&settings);
    let mut pipeline = TilePipeline::new(region, &settings, &table, &store);
    if let Some(dir) = &args.images {
        pipeline = pipeline.with_previews(dir);
    }
    let report = pipeline.run()?;

    let chunk_files = match &args.arrays {
        Some(dir) => {
            let max_x = settings.grid.max_cols as i32 - 1;
            let written = export_store(&store, dir, 0, max_x)?;
            write_manifest(dir, &region.name, &settings, &report, written.len())?;
            written.len()
        }
        None => 0,
    };

    println!();
    println!("=== Render Complete ===");
    println!(
        "Tiles:  {} done, {} failed in {:.1}s",
        report.completed.len(),
        report.failed.len(),
        start.elapsed().as_secs_f64()
    );
    if args.arrays.is_some() {
        println!("Chunks: {} written", chunk_files);
    }
    for (index, error) in &report.failed {
        eprintln!("Tile ({}, {}) failed: {}", index.row, index.col, error);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
