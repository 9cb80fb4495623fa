//! Importing exported chunks into a consuming world
//!
//! The store keeps blocks as `[x][z][y]` in its own orientation. Worlds
//! consume them rotated: world column `(x, z)` of a chunk takes stored
//! column `(W - 1 - z, x)`. Combined with [`ExportRemap`](super::ExportRemap)
//! this maps store column `(X, Z)` to world column
//! `(Z, (max_cz + 1) * W - 1 - X)`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::disk_io::{list_chunk_files, load_chunk, parse_chunk_path};
use crate::core::{Error, Result};
use crate::voxel::{ChunkCoord, Material, VoxelChunk};

/// World representation that imported chunks are written into
pub trait ChunkSink {
    /// Chunk at `coord`, created empty with the given shape if missing
    fn chunk_mut(
        &mut self,
        coord: ChunkCoord,
        width: usize,
        height: usize,
    ) -> Result<&mut VoxelChunk>;

    /// Called once a chunk has been fully written
    fn chunk_changed(&mut self, _coord: ChunkCoord) {}
}

/// In-memory world, mostly useful for tests and tooling
#[derive(Default)]
pub struct MemoryWorld {
    chunks: BTreeMap<ChunkCoord, VoxelChunk>,
    changed: BTreeSet<ChunkCoord>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&VoxelChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks reported as changed, in coordinate order
    pub fn changed(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.changed.iter()
    }

    /// Material at a global world position
    pub fn material_at(&self, x: i32, y: usize, z: i32) -> Option<Material> {
        let (_, chunk) = self.chunks.first_key_value()?;
        let width = chunk.width() as i32;
        let coord = ChunkCoord::new(x.div_euclid(width), z.div_euclid(width));
        self.chunks.get(&coord)?.get(
            x.rem_euclid(width) as usize,
            z.rem_euclid(width) as usize,
            y,
        )
    }
}

impl ChunkSink for MemoryWorld {
    fn chunk_mut(
        &mut self,
        coord: ChunkCoord,
        width: usize,
        height: usize,
    ) -> Result<&mut VoxelChunk> {
        let chunk = self
            .chunks
            .entry(coord)
            .or_insert_with(|| VoxelChunk::empty(width, height));
        if chunk.width() != width {
            return Err(Error::Serialization(format!(
                "chunk {}x{} is {} wide, expected {}",
                coord.x,
                coord.z,
                chunk.width(),
                width
            )));
        }
        Ok(chunk)
    }

    fn chunk_changed(&mut self, coord: ChunkCoord) {
        self.changed.insert(coord);
    }
}

/// Copy a stored chunk into a world chunk, rotating columns
pub fn remap_into(stored: &VoxelChunk, target: &mut VoxelChunk) {
    let w = stored.width();
    for x in 0..w {
        for z in 0..w {
            let (sx, sz) = (w - 1 - z, x);
            target.set_column(x, z, stored.column_blocks(sx, sz), stored.column_data(sx, sz));
        }
    }
}

/// Load every chunk file in `dir` into `world`. Returns the number of
/// chunks loaded.
pub fn load_chunks(world: &mut dyn ChunkSink, dir: &Path) -> Result<usize> {
    let files = list_chunk_files(dir)?;
    for path in &files {
        let (_, stored) = load_chunk(path)?;
        let coord = parse_chunk_path(path).ok_or_else(|| {
            Error::Serialization(format!("bad chunk file name {}", path.display()))
        })?;
        let target = world.chunk_mut(coord, stored.width(), stored.height())?;
        remap_into(&stored, target);
        world.chunk_changed(coord);
        log::debug!("Loaded chunk {}x{}", coord.x, coord.z);
    }
    log::info!("{} arrays loaded", files.len());
    Ok(files.len())
}
