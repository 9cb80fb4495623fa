//! Writes a synthetic island region for trying out the renderer.
//!
//! Usage: cargo run --bin make_region -- [OPTIONS]
//!
//! Output structure:
//!   <out>/<name>/
//!     region.json        # raster paths, transforms, CRS, no-data
//!     landcover.png      # 8-bit land-cover codes
//!     elevation.png      # 16-bit elevation samples

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::DVec2;
use image::{GrayImage, ImageBuffer, Luma};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use topovox::core::{logging, Result};
use topovox::raster::catalog::REGION_FILENAME;
use topovox::raster::{GeoTransform, RasterEntry, RegionManifest};

#[derive(Parser, Debug)]
#[command(name = "make_region")]
#[command(about = "Generate a synthetic land-cover/elevation region")]
struct Args {
    /// Dataset root to write into
    #[arg(long, default_value = "Datasets")]
    out: PathBuf,

    /// Region name (directory name)
    #[arg(long, default_value = "Island")]
    name: String,

    /// Raster lines
    #[arg(long, default_value = "128")]
    rows: u32,

    /// Raster pixels per line
    #[arg(long, default_value = "128")]
    cols: u32,

    /// Pixel size in meters
    #[arg(long, default_value = "30")]
    pixel_size: f64,

    /// Highest elevation in meters
    #[arg(long, default_value = "600")]
    peak: f64,

    #[arg(long, default_value = "1")]
    seed: u64,
}

fn classify(elevation: f64, peak: f64, rng: &mut ChaCha8Rng) -> u8 {
    let h = elevation / peak;
    match h {
        h if h <= 0.0 => 11,
        h if h < 0.05 => 31,
        h if h < 0.4 => {
            if rng.gen_bool(0.3) { 82 } else { 71 }
        }
        h if h < 0.8 => [41, 42, 43][rng.gen_range(0..3)],
        _ => 12,
    }
}

fn run(args: &Args) -> Result<PathBuf> {
    let dir = args.out.join(&args.name);
    std::fs::create_dir_all(&dir)?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let (rows, cols) = (args.rows.max(1), args.cols.max(1));
    let center = DVec2::new(cols as f64 / 2.0, rows as f64 / 2.0);
    let radius = center.x.min(center.y).max(1.0);

    let mut elevation = vec![0.0f64; (rows * cols) as usize];
    for y in 0..rows {
        for x in 0..cols {
            let d = DVec2::new(x as f64, y as f64).distance(center) / radius;
            let bump = rng.gen_range(-0.03..0.03);
            elevation[(y * cols + x) as usize] = ((1.0 - d * 1.2) + bump).max(0.0) * args.peak;
        }
    }

    let elev_img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(cols, rows, |x, y| {
        Luma([elevation[(y * cols + x) as usize].round().min(u16::MAX as f64) as u16])
    });
    let lc_img = GrayImage::from_fn(cols, rows, |x, y| {
        Luma([classify(elevation[(y * cols + x) as usize], args.peak, &mut rng)])
    });
    elev_img.save(dir.join("elevation.png"))?;
    lc_img.save(dir.join("landcover.png"))?;

    let transform = GeoTransform::north_up(DVec2::new(500_000.0, 4_000_000.0), args.pixel_size)?;
    let manifest = RegionManifest {
        landcover: RasterEntry {
            path: "landcover.png".into(),
            crs: "EPSG:26915".into(),
            transform,
            nodata: Some(0.0),
            scale: 1.0,
            offset: 0.0,
        },
        elevation: RasterEntry {
            path: "elevation.png".into(),
            crs: "EPSG:26915".into(),
            transform,
            nodata: None,
            scale: 1.0,
            offset: 0.0,
        },
    };
    manifest.save(&dir.join(REGION_FILENAME))?;
    Ok(dir)
}

fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();
    match run(&args) {
        Ok(dir) => {
            println!(
                "Wrote region {} ({} x {}) to {}",
                args.name,
                args.rows,
                args.cols,
                dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
