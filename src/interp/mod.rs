//! Scattered-point interpolation: nearest-neighbor index with inverse
//! distance weighting or majority vote.
//!
//! One index is built per tile from that tile's raster window and dropped
//! when the tile finishes, so nothing here is shared between workers.

pub mod index;
pub mod samples;

pub use index::{QueryMode, QueryParams, SpatialIndex};
pub use samples::SampleSet;
