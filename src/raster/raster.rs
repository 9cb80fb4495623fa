//! Raster input contract and the in-memory raster

use glam::DVec2;

use super::transform::GeoTransform;
use crate::core::{Error, Result};
use crate::interp::SampleSet;
use crate::math::GridExtent;

/// A single-band georeferenced raster.
///
/// Extents passed to and returned from a raster are in pixel space:
/// rows run along the raster's lines (y), columns along its pixels (x).
pub trait Raster: Send + Sync {
    /// Pixels per line
    fn width(&self) -> usize;
    /// Number of lines
    fn height(&self) -> usize;
    fn transform(&self) -> &GeoTransform;
    /// Identifier of the geographic CRS, compared verbatim between rasters
    fn crs(&self) -> &str;
    /// Sentinel meaning "no measurement"
    fn nodata(&self) -> Option<f64>;
    /// Read a window in row-major order
    fn read_window(&self, window: &GridExtent) -> Result<Vec<f64>>;
    /// Minimum and maximum valid values
    fn min_max(&self) -> (f64, f64);

    /// Full pixel extent
    fn extent(&self) -> GridExtent {
        GridExtent::new(0, 0, self.height(), self.width())
    }
}

/// Raster held entirely in memory
#[derive(Clone, Debug)]
pub struct GridRaster {
    width: usize,
    height: usize,
    transform: GeoTransform,
    crs: String,
    nodata: Option<f64>,
    values: Vec<f64>,
}

impl GridRaster {
    /// Create from a row-major value buffer of `width * height` values
    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: impl Into<String>,
        nodata: Option<f64>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Raster("raster has no pixels".to_string()));
        }
        if values.len() != width * height {
            return Err(Error::Raster(format!(
                "expected {} values for {}x{} raster, got {}",
                width * height,
                width,
                height,
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            transform,
            crs: crs.into(),
            nodata,
            values,
        })
    }
}

impl Raster for GridRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    fn crs(&self) -> &str {
        &self.crs
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn read_window(&self, window: &GridExtent) -> Result<Vec<f64>> {
        if !self.extent().contains(window) {
            return Err(Error::Raster(format!(
                "window {:?} outside {}x{} raster",
                window, self.width, self.height
            )));
        }
        let mut out = Vec::with_capacity(window.area());
        for row in window.row..window.row_end() {
            let start = row * self.width + window.col;
            out.extend_from_slice(&self.values[start..start + window.cols]);
        }
        Ok(out)
    }

    fn min_max(&self) -> (f64, f64) {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan() && Some(*v) != self.nodata)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }
}

/// Convert two geo corners into a pixel window of `raster`.
///
/// Uses the raster's own inverse transform, so paired rasters with different
/// resolutions each get their own window. The result is clipped to the
/// raster and never empty.
pub fn window_for(raster: &dyn Raster, ul: DVec2, lr: DVec2) -> GridExtent {
    let (ax, ay) = raster.transform().geo_to_pixel(ul);
    let (bx, by) = raster.transform().geo_to_pixel(lr);

    let clip = |lo: f64, hi: f64, limit: usize| -> (usize, usize) {
        let start = (lo.floor().max(0.0) as usize).min(limit.saturating_sub(1));
        let end = (hi.ceil().max(0.0) as usize).min(limit).max(start + 1);
        (start, end)
    };

    let (col, col_end) = clip(ax.min(bx), ax.max(bx), raster.width());
    let (row, row_end) = clip(ay.min(by), ay.max(by), raster.height());
    GridExtent::from_corners(row, col, row_end, col_end)
}

/// Read a pixel window as interpolation samples.
///
/// Every pixel becomes a point at its geo coordinate. No-data pixels are
/// replaced with `replacement` when one is supplied and dropped otherwise.
/// Values are divided by `divisor` (the vertical scale for elevation).
pub fn read_samples(
    raster: &dyn Raster,
    window: &GridExtent,
    replacement: Option<f64>,
    divisor: f64,
) -> Result<SampleSet> {
    let raw = raster.read_window(window)?;
    let nodata = raster.nodata();
    let transform = raster.transform();

    let mut points = Vec::with_capacity(raw.len());
    let mut values = Vec::with_capacity(raw.len());
    for ((row, col), value) in window.cells().zip(raw) {
        let value = match nodata {
            Some(nd) if value == nd || (nd.is_nan() && value.is_nan()) => match replacement {
                Some(r) => r,
                None => continue,
            },
            _ => value,
        };
        points.push(transform.pixel_to_geo(col as f64, row as f64));
        values.push(value / divisor);
    }

    SampleSet::new(points, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> GridRaster {
        let values = (0..width * height).map(|v| v as f64).collect();
        let t = GeoTransform::north_up(DVec2::new(0.0, 0.0), 1.0).unwrap();
        GridRaster::new(width, height, t, "WGS84", Some(-1.0), values).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_length() {
        let t = GeoTransform::north_up(DVec2::ZERO, 1.0).unwrap();
        assert!(GridRaster::new(2, 2, t, "x", None, vec![0.0; 3]).is_err());
        assert!(GridRaster::new(0, 2, t, "x", None, vec![]).is_err());
    }

    #[test]
    fn test_read_window() {
        let r = ramp(4, 3);
        let w = r.read_window(&GridExtent::new(1, 2, 2, 2)).unwrap();
        assert_eq!(w, vec![6.0, 7.0, 10.0, 11.0]);
        assert!(r.read_window(&GridExtent::new(2, 2, 2, 2)).is_err());
    }

    #[test]
    fn test_min_max_skips_nodata() {
        let t = GeoTransform::north_up(DVec2::ZERO, 1.0).unwrap();
        let r = GridRaster::new(3, 1, t, "x", Some(-9999.0), vec![-9999.0, 5.0, 12.0]).unwrap();
        assert_eq!(r.min_max(), (5.0, 12.0));
    }

    #[test]
    fn test_window_for_clips_and_orders_corners() {
        let r = ramp(10, 10);
        // North-up: upper-left has the larger y
        let ul = r.transform().pixel_to_geo(-3.0, 2.0);
        let lr = r.transform().pixel_to_geo(4.0, 20.0);
        let w = window_for(&r, ul, lr);
        assert_eq!(w, GridExtent::from_corners(2, 0, 10, 4));
    }

    #[test]
    fn test_window_for_never_empty() {
        let r = ramp(10, 10);
        let p = r.transform().pixel_to_geo(3.0, 3.0);
        let w = window_for(&r, p, p);
        assert_eq!(w.area(), 1);
    }

    #[test]
    fn test_read_samples_replaces_nodata() {
        let t = GeoTransform::north_up(DVec2::ZERO, 1.0).unwrap();
        let r = GridRaster::new(2, 1, t, "x", Some(0.0), vec![0.0, 8.0]).unwrap();
        let s = read_samples(&r, &r.extent(), Some(11.0), 1.0).unwrap();
        assert_eq!(s.values(), &[11.0, 8.0]);

        let s = read_samples(&r, &r.extent(), None, 2.0).unwrap();
        assert_eq!(s.values(), &[4.0]);
        assert_eq!(s.points()[0], DVec2::new(1.0, 0.0));
    }
}
