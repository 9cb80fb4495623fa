//! Tile partitioning and scheduling

pub mod grid;
pub mod scheduler;

pub use grid::{TileGrid, TileIndex, TileRange};
pub use scheduler::{RunReport, TileScheduler};
