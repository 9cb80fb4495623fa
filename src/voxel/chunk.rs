//! Chunk addressing and the per-chunk block arrays

use serde::{Deserialize, Serialize};

use super::column::LayerSpec;
use super::material::Material;

/// Chunk geometry shared by the store, the exporter and the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkLayout {
    /// Chunk width as a power of two (4 means 16 columns per side)
    pub width_bits: u32,
    /// Number of vertical levels in every chunk
    pub height: u32,
    /// Level that corresponds to elevation zero
    pub sea_level: u32,
    /// Top levels kept free of terrain
    pub headroom: u32,
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self {
            width_bits: 4,
            height: 128,
            sea_level: 64,
            headroom: 10,
        }
    }
}

impl ChunkLayout {
    /// Columns per chunk side
    pub fn width(&self) -> u32 {
        1 << self.width_bits
    }

    /// Highest elevation a column can reach above sea level
    pub fn max_elevation(&self) -> i32 {
        self.height as i32 - self.headroom as i32 - self.sea_level as i32
    }

    /// Lowest elevation that still leaves level zero in the chunk
    pub fn min_elevation(&self) -> i32 {
        -(self.sea_level as i32)
    }

    /// Chunk holding the global column (x, z)
    pub fn chunk_of(&self, x: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(x >> self.width_bits, z >> self.width_bits)
    }

    /// In-chunk offset of the global column (x, z)
    pub fn offset_of(&self, x: i32, z: i32) -> (usize, usize) {
        let mask = self.width() as i32 - 1;
        ((x & mask) as usize, (z & mask) as usize)
    }

    /// Inverse of [`chunk_of`](Self::chunk_of) plus [`offset_of`](Self::offset_of)
    pub fn column_of(&self, chunk: ChunkCoord, lx: usize, lz: usize) -> (i32, i32) {
        (
            (chunk.x << self.width_bits) + lx as i32,
            (chunk.z << self.width_bits) + lz as i32,
        )
    }

    /// First level above the column for an elevation, clamped to the chunk
    pub fn column_top(&self, elevation: i32) -> u32 {
        let clamped = elevation.clamp(self.min_elevation(), self.max_elevation());
        (self.sea_level as i32 + clamped) as u32
    }
}

/// Integer coordinate of a chunk in the world grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// Block ids and data bytes for one chunk, laid out `[x][z][y]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelChunk {
    width: usize,
    height: usize,
    blocks: Vec<u8>,
    data: Vec<u8>,
}

impl VoxelChunk {
    /// Zero-filled chunk (all air)
    pub fn new(layout: &ChunkLayout) -> Self {
        Self::empty(layout.width() as usize, layout.height as usize)
    }

    /// Zero-filled chunk of an explicit shape
    pub fn empty(width: usize, height: usize) -> Self {
        let len = width * width * height;
        Self {
            width,
            height,
            blocks: vec![0; len],
            data: vec![0; len],
        }
    }

    /// Rebuild a chunk from raw arrays; `None` if the shapes disagree
    pub fn from_parts(width: usize, height: usize, blocks: Vec<u8>, data: Vec<u8>) -> Option<Self> {
        let len = width * width * height;
        (blocks.len() == len && data.len() == len).then_some(Self {
            width,
            height,
            blocks,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, lx: usize, lz: usize, y: usize) -> usize {
        (lx * self.width + lz) * self.height + y
    }

    fn in_bounds(&self, lx: usize, lz: usize, y: usize) -> bool {
        lx < self.width && lz < self.width && y < self.height
    }

    /// Material at an in-chunk position, `None` outside the chunk
    pub fn get(&self, lx: usize, lz: usize, y: usize) -> Option<Material> {
        self.in_bounds(lx, lz, y).then(|| {
            let i = self.index(lx, lz, y);
            Material::new(self.blocks[i], self.data[i])
        })
    }

    /// Set one block; out of range positions are ignored
    pub fn set(&mut self, lx: usize, lz: usize, y: usize, material: Material) {
        if self.in_bounds(lx, lz, y) {
            let i = self.index(lx, lz, y);
            self.blocks[i] = material.id;
            self.data[i] = material.data;
        }
    }

    /// Fill the half-open level range `[bottom, top)` of one column
    pub fn fill_column(
        &mut self,
        lx: usize,
        lz: usize,
        bottom: usize,
        top: usize,
        material: Material,
    ) {
        if lx >= self.width || lz >= self.width {
            return;
        }
        let top = top.min(self.height);
        if bottom >= top {
            return;
        }
        let start = self.index(lx, lz, bottom);
        let end = start + (top - bottom);
        self.blocks[start..end].fill(material.id);
        self.data[start..end].fill(material.data);
    }

    /// Write a layer stack whose highest block sits at `top - 1`
    pub fn write_column(&mut self, lx: usize, lz: usize, top: u32, layers: &LayerSpec) {
        for (bottom, upper, material) in layers.runs(top) {
            self.fill_column(lx, lz, bottom as usize, upper as usize, material);
        }
    }

    /// Block ids of one column, bottom to top
    pub fn column_blocks(&self, lx: usize, lz: usize) -> &[u8] {
        let start = self.index(lx, lz, 0);
        &self.blocks[start..start + self.height]
    }

    /// Data bytes of one column, bottom to top
    pub fn column_data(&self, lx: usize, lz: usize) -> &[u8] {
        let start = self.index(lx, lz, 0);
        &self.data[start..start + self.height]
    }

    /// Overwrite one column from block and data slices, bottom to top.
    /// Extra levels in the source are dropped.
    pub fn set_column(&mut self, lx: usize, lz: usize, blocks: &[u8], data: &[u8]) {
        if lx >= self.width || lz >= self.width {
            return;
        }
        let n = blocks.len().min(data.len()).min(self.height);
        let start = self.index(lx, lz, 0);
        self.blocks[start..start + n].copy_from_slice(&blocks[..n]);
        self.data[start..start + n].copy_from_slice(&data[..n]);
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.blocks, self.data)
    }

    /// True if no block has been written
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_defaults() {
        let layout = ChunkLayout::default();
        assert_eq!(layout.width(), 16);
        assert_eq!(layout.max_elevation(), 54);
        assert_eq!(layout.column_top(0), 64);
        assert_eq!(layout.column_top(1000), 118);
        assert_eq!(layout.column_top(-1000), 0);
    }

    #[test]
    fn test_addressing_bijection() {
        let layout = ChunkLayout::default();
        for x in -40..40 {
            for z in [-33, -17, -16, -1, 0, 1, 15, 16, 31, 250] {
                let chunk = layout.chunk_of(x, z);
                let (lx, lz) = layout.offset_of(x, z);
                assert!(lx < 16 && lz < 16);
                assert_eq!(layout.column_of(chunk, lx, lz), (x, z));
            }
        }
    }

    #[test]
    fn test_negative_coordinates() {
        let layout = ChunkLayout::default();
        assert_eq!(layout.chunk_of(-1, -16), ChunkCoord::new(-1, -1));
        assert_eq!(layout.offset_of(-1, -16), (15, 0));
        assert_eq!(layout.chunk_of(-17, 0), ChunkCoord::new(-2, 0));
    }

    #[test]
    fn test_write_column() {
        let layout = ChunkLayout::default();
        let mut chunk = VoxelChunk::new(&layout);
        let spec: LayerSpec = "Water:2, Sand:1, Stone".parse().unwrap();
        chunk.write_column(3, 5, 64, &spec);

        assert_eq!(chunk.get(3, 5, 63), Some(Material::WATER));
        assert_eq!(chunk.get(3, 5, 62), Some(Material::WATER));
        assert_eq!(chunk.get(3, 5, 61), Some(Material::SAND));
        assert_eq!(chunk.get(3, 5, 0), Some(Material::STONE));
        assert_eq!(chunk.get(3, 5, 64), Some(Material::AIR));
        assert_eq!(chunk.get(3, 6, 10), Some(Material::AIR));
        assert_eq!(chunk.get(16, 0, 0), None);
    }

    #[test]
    fn test_column_slices() {
        let layout = ChunkLayout::default();
        let mut chunk = VoxelChunk::new(&layout);
        chunk.fill_column(1, 2, 10, 20, Material::new(35, 4));
        let blocks = chunk.column_blocks(1, 2);
        assert_eq!(blocks.len(), 128);
        assert!(blocks[10..20].iter().all(|&b| b == 35));
        assert_eq!(blocks[9], 0);
        assert!(chunk.column_data(1, 2)[10..20].iter().all(|&d| d == 4));
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_from_parts_checks_shape() {
        assert!(VoxelChunk::from_parts(2, 4, vec![0; 16], vec![0; 16]).is_some());
        assert!(VoxelChunk::from_parts(2, 4, vec![0; 15], vec![0; 16]).is_none());
    }
}
