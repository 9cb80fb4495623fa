//! Region datasets: paired land-cover and elevation rasters.
//!
//! A region lives in its own directory under a dataset root:
//!
//! ```text
//! Datasets/
//!   <region>/
//!     region.json      # raster paths, transforms, CRS, no-data
//!     landcover.png    # 8-bit grayscale class codes
//!     elevation.png    # 16-bit grayscale, value = raw * scale + offset
//! ```
//!
//! Regions that fail validation are left out of the catalog with a warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::raster::{GridRaster, Raster};
use super::transform::GeoTransform;
use crate::core::{Error, Result};

/// File name of the per-region description
pub const REGION_FILENAME: &str = "region.json";

/// Dataset roots searched when none are given
pub const DEFAULT_DATASET_PATHS: [&str; 2] = ["Datasets", "../TopoMC-Datasets"];

/// Description of one raster inside `region.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterEntry {
    /// Image path, relative to the region directory
    pub path: PathBuf,
    /// Geographic CRS identifier (e.g. "EPSG:4269")
    pub crs: String,
    pub transform: GeoTransform,
    /// Raw pixel value meaning "no measurement"
    #[serde(default)]
    pub nodata: Option<f64>,
    /// Multiplier applied to raw pixel values
    #[serde(default = "default_value_scale")]
    pub scale: f64,
    /// Offset added after scaling
    #[serde(default)]
    pub offset: f64,
}

fn default_value_scale() -> f64 {
    1.0
}

/// Contents of `region.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionManifest {
    pub landcover: RasterEntry,
    pub elevation: RasterEntry,
}

impl RegionManifest {
    /// Load from file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// A validated pair of rasters sharing one geographic CRS
#[derive(Clone)]
pub struct Region {
    pub name: String,
    pub landcover: Arc<dyn Raster>,
    pub elevation: Arc<dyn Raster>,
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("dims", &self.dims())
            .finish()
    }
}

impl Region {
    /// Pair two rasters, checking the shared CRS and dimensions
    pub fn new(
        name: impl Into<String>,
        landcover: Arc<dyn Raster>,
        elevation: Arc<dyn Raster>,
    ) -> Result<Self> {
        let name = name.into();
        if landcover.crs() != elevation.crs() {
            return Err(Error::region(
                &name,
                format!(
                    "land cover ({}) and elevation ({}) do not share a CRS",
                    landcover.crs(),
                    elevation.crs()
                ),
            ));
        }
        if landcover.width() != elevation.width() || landcover.height() != elevation.height() {
            return Err(Error::region(
                &name,
                format!(
                    "land cover is {}x{} but elevation is {}x{}",
                    landcover.width(),
                    landcover.height(),
                    elevation.width(),
                    elevation.height()
                ),
            ));
        }
        Ok(Self {
            name,
            landcover,
            elevation,
        })
    }

    /// Open and validate the region stored in `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest = RegionManifest::load(&dir.join(REGION_FILENAME))
            .map_err(|e| Error::region(&name, e.to_string()))?;

        let landcover = load_png_raster(dir, &manifest.landcover)
            .map_err(|e| Error::region(&name, format!("land cover didn't open: {}", e)))?;
        let elevation = load_png_raster(dir, &manifest.elevation)
            .map_err(|e| Error::region(&name, format!("elevation didn't open: {}", e)))?;

        Self::new(name, Arc::new(landcover), Arc::new(elevation))
    }

    /// (rows, cols) of the land-cover raster
    pub fn dims(&self) -> (usize, usize) {
        (self.landcover.height(), self.landcover.width())
    }
}

/// Decode a grayscale PNG into a raster, applying scale/offset and mapping
/// the no-data pixel value to NaN.
pub fn load_png_raster(dir: &Path, entry: &RasterEntry) -> Result<GridRaster> {
    let dynamic = image::open(dir.join(&entry.path))?;
    let (width, height) = (dynamic.width(), dynamic.height());
    let raw: Vec<f64> = match dynamic {
        image::DynamicImage::ImageLuma16(img) => {
            img.into_raw().into_iter().map(f64::from).collect()
        }
        other => other.to_luma8().into_raw().into_iter().map(f64::from).collect(),
    };

    let values = raw
        .into_iter()
        .map(|raw| {
            if entry.nodata == Some(raw) {
                f64::NAN
            } else {
                raw * entry.scale + entry.offset
            }
        })
        .collect();

    let nodata = entry.nodata.map(|_| f64::NAN);
    GridRaster::new(
        width as usize,
        height as usize,
        entry.transform,
        entry.crs.clone(),
        nodata,
        values,
    )
}

/// Catalog of valid regions keyed by name
#[derive(Debug, Default)]
pub struct RegionCatalog {
    regions: BTreeMap<String, Region>,
}

impl RegionCatalog {
    /// Scan dataset roots for region directories.
    ///
    /// Missing roots are skipped silently; invalid regions are excluded
    /// with a warning.
    pub fn discover<P: AsRef<Path>>(roots: &[P]) -> Self {
        let mut catalog = Self::default();
        for root in roots {
            let Ok(entries) = std::fs::read_dir(root.as_ref()) else {
                continue;
            };
            let mut dirs: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.join(REGION_FILENAME).is_file())
                .collect();
            dirs.sort();

            for dir in dirs {
                match Region::open(&dir) {
                    Ok(region) => catalog.insert(region),
                    Err(e) => log::warn!("Excluding region: {}", e),
                }
            }
        }
        catalog
    }

    /// Add a region, replacing any previous region with the same name
    pub fn insert(&mut self, region: Region) {
        self.regions.insert(region.name.clone(), region);
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions sorted by name
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// One `name (rows, cols)` line per region
    pub fn listing(&self) -> String {
        let mut out = String::from("Valid datasets detected:\n");
        for region in self.regions() {
            let (rows, cols) = region.dims();
            out.push_str(&format!("\t{} ({}, {})\n", region.name, rows, cols));
        }
        out
    }
}
