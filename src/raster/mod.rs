//! Raster access and geo <-> pixel coordinate bridging

pub mod catalog;
pub mod raster;
pub mod transform;

pub use catalog::{Region, RegionCatalog, RegionManifest, RasterEntry};
pub use raster::{read_samples, window_for, GridRaster, Raster};
pub use transform::GeoTransform;
