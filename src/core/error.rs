//! Error types for the raster-to-voxel pipeline

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Raster error: {0}")]
    Raster(String),

    #[error("Region {region}: {reason}")]
    Region { region: String, reason: String },

    #[error("Layer spec error: {0}")]
    LayerSpec(String),

    #[error("Chunk ({x}, {z}) was never allocated")]
    ChunkNotAllocated { x: i32, z: i32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn region(region: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Region {
            region: region.into(),
            reason: reason.into(),
        }
    }
}
