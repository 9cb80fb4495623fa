//! Voxel storage: materials, layer stacks, chunks and the shared chunk store

pub mod chunk;
pub mod column;
pub mod material;
pub mod store;

pub use chunk::{ChunkCoord, ChunkLayout, VoxelChunk};
pub use column::{BlockColumn, Layer, LayerSpec};
pub use material::Material;
pub use store::{ChunkHandle, ChunkStore};
