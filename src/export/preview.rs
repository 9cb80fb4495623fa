//! Per-tile preview images

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

use crate::core::Result;
use crate::math::Grid;

/// Which tile grid a preview shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewKind {
    Landcover,
    Elevation,
    Bathymetry,
}

impl PreviewKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            PreviewKind::Landcover => "lc",
            PreviewKind::Elevation => "elev",
            PreviewKind::Bathymetry => "bathy",
        }
    }
}

/// `<dir>/<kind>-<offset_x>-<offset_y>.png`
pub fn preview_path(dir: &Path, kind: PreviewKind, offset: (usize, usize)) -> PathBuf {
    dir.join(format!("{}-{}-{}.png", kind.prefix(), offset.0, offset.1))
}

/// Render a grid as an 8-bit grayscale image, one pixel per cell
pub fn render<T: Copy>(grid: &Grid<T>, to_gray: impl Fn(T) -> u8) -> GrayImage {
    GrayImage::from_fn(grid.cols() as u32, grid.rows() as u32, |x, y| {
        let value = grid.get(y as usize, x as usize).copied();
        Luma([value.map(&to_gray).unwrap_or(0)])
    })
}

/// Write a preview image for a tile and return its path
pub fn write_preview<T: Copy>(
    dir: &Path,
    kind: PreviewKind,
    offset: (usize, usize),
    grid: &Grid<T>,
    to_gray: impl Fn(T) -> u8,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = preview_path(dir, kind, offset);
    render(grid, to_gray).save(&path)?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}

/// Saturating conversion used for elevation previews
pub fn clamp_gray(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}
