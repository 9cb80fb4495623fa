//! Affine pixel <-> geo transforms

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Six-coefficient affine transform in GDAL order:
/// `geo_x = c[0] + c[1] * px + c[2] * py`, `geo_y = c[3] + c[4] * px + c[5] * py`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 6]", into = "[f64; 6]")]
pub struct GeoTransform {
    coeffs: [f64; 6],
    inverse: [f64; 4],
}

impl GeoTransform {
    /// Create a transform; fails if the linear part cannot be inverted
    pub fn new(coeffs: [f64; 6]) -> Result<Self> {
        let [_, a, b, _, d, e] = coeffs;
        let det = a * e - b * d;
        if det == 0.0 || !det.is_finite() {
            return Err(Error::Raster(format!("singular geotransform {:?}", coeffs)));
        }
        Ok(Self {
            coeffs,
            inverse: [e / det, -b / det, -d / det, a / det],
        })
    }

    /// North-up transform with square pixels of `pixel_size` and origin at `origin`
    pub fn north_up(origin: DVec2, pixel_size: f64) -> Result<Self> {
        Self::new([origin.x, pixel_size, 0.0, origin.y, 0.0, -pixel_size])
    }

    pub fn coeffs(&self) -> [f64; 6] {
        self.coeffs
    }

    /// Horizontal pixel size in CRS units
    pub fn pixel_size(&self) -> f64 {
        self.coeffs[1].hypot(self.coeffs[4])
    }

    /// Map (possibly fractional) pixel coordinates to the working CRS
    pub fn pixel_to_geo(&self, px: f64, py: f64) -> DVec2 {
        let c = &self.coeffs;
        DVec2::new(c[0] + c[1] * px + c[2] * py, c[3] + c[4] * px + c[5] * py)
    }

    /// Map a point in the working CRS back to fractional pixel coordinates
    pub fn geo_to_pixel(&self, geo: DVec2) -> (f64, f64) {
        let dx = geo.x - self.coeffs[0];
        let dy = geo.y - self.coeffs[3];
        let [ia, ib, id, ie] = self.inverse;
        (ia * dx + ib * dy, id * dx + ie * dy)
    }
}

impl TryFrom<[f64; 6]> for GeoTransform {
    type Error = Error;

    fn try_from(coeffs: [f64; 6]) -> Result<Self> {
        Self::new(coeffs)
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(t: GeoTransform) -> Self {
        t.coeffs
    }
}
