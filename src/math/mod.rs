//! Grid geometry utilities

pub mod extent;
pub mod grid;

pub use extent::GridExtent;
pub use grid::Grid;
