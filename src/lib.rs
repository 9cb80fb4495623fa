//! Topovox - converts paired land-cover and elevation rasters into voxel
//! terrain chunks

pub mod core;
pub mod math;
pub mod raster;
pub mod interp;
pub mod tile;
pub mod bathy;
pub mod voxel;
pub mod export;
pub mod generation;
