//! Chunk serialization and export
//!
//! Each chunk is written as an LZ4-compressed rkyv archive named
//! `<cx>x<cz>.vxc`. Coordinates in the file name are already remapped
//! into the consuming world's chunk grid (see [`ExportRemap`]); the block
//! arrays themselves keep the store's `[x][z][y]` layout and are remapped
//! per column on import.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rkyv::{Archive, Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::voxel::{ChunkCoord, ChunkLayout, ChunkStore, VoxelChunk};

/// File extension of exported chunks
pub const CHUNK_EXTENSION: &str = "vxc";

/// Serializable chunk data
#[derive(Archive, Deserialize, Serialize)]
pub struct ChunkData {
    pub cx: i32,
    pub cz: i32,
    pub width: u32,
    pub height: u32,
    pub blocks: Vec<u8>,
    pub data: Vec<u8>,
}

/// Serialize a chunk to bytes (uncompressed)
pub fn serialize_chunk(coord: ChunkCoord, chunk: &VoxelChunk) -> Result<Vec<u8>> {
    let data = ChunkData {
        cx: coord.x,
        cz: coord.z,
        width: chunk.width() as u32,
        height: chunk.height() as u32,
        blocks: chunk.blocks().to_vec(),
        data: chunk.data().to_vec(),
    };

    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&data)
        .map_err(|e| Error::Serialization(e.to_string()))?;

    Ok(bytes.to_vec())
}

/// Deserialize a chunk from bytes (uncompressed)
pub fn deserialize_chunk(data: &[u8]) -> Result<(ChunkCoord, VoxelChunk)> {
    let archived = rkyv::access::<ArchivedChunkData, rkyv::rancor::Error>(data)
        .map_err(|e| Error::Serialization(e.to_string()))?;

    let chunk_data: ChunkData = rkyv::deserialize::<ChunkData, rkyv::rancor::Error>(archived)
        .map_err(|e| Error::Serialization(e.to_string()))?;

    let coord = ChunkCoord::new(chunk_data.cx, chunk_data.cz);
    let chunk = VoxelChunk::from_parts(
        chunk_data.width as usize,
        chunk_data.height as usize,
        chunk_data.blocks,
        chunk_data.data,
    )
    .ok_or_else(|| {
        Error::Serialization(format!("chunk {}x{} has mismatched arrays", coord.x, coord.z))
    })?;

    Ok((coord, chunk))
}

/// Compress a serialized chunk using LZ4
pub fn compress_chunk(coord: ChunkCoord, chunk: &VoxelChunk) -> Result<Vec<u8>> {
    let serialized = serialize_chunk(coord, chunk)?;
    Ok(lz4_flex::compress_prepend_size(&serialized))
}

/// Decompress and deserialize a chunk
pub fn decompress_chunk(data: &[u8]) -> Result<(ChunkCoord, VoxelChunk)> {
    let decompressed = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| Error::Serialization(format!("LZ4 decompression failed: {}", e)))?;
    deserialize_chunk(&decompressed)
}

/// Get the file path for a chunk
pub fn chunk_path(base_dir: &Path, coord: ChunkCoord) -> PathBuf {
    base_dir.join(format!("{}x{}.{}", coord.x, coord.z, CHUNK_EXTENSION))
}

/// Parse a chunk coordinate back out of a chunk file name
pub fn parse_chunk_path(path: &Path) -> Option<ChunkCoord> {
    if path.extension()? != CHUNK_EXTENSION {
        return None;
    }
    let (x, z) = path.file_stem()?.to_str()?.split_once('x')?;
    Some(ChunkCoord::new(x.parse().ok()?, z.parse().ok()?))
}

/// Save one chunk to disk (compressed)
pub fn save_chunk(base_dir: &Path, coord: ChunkCoord, chunk: &VoxelChunk) -> Result<PathBuf> {
    let path = chunk_path(base_dir, coord);
    fs::write(&path, compress_chunk(coord, chunk)?)?;
    Ok(path)
}

/// Load one chunk file
pub fn load_chunk(path: &Path) -> Result<(ChunkCoord, VoxelChunk)> {
    let compressed = fs::read(path)?;
    decompress_chunk(&compressed)
}

/// Chunk files in a directory, sorted by name
pub fn list_chunk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && parse_chunk_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Store-to-world chunk coordinate mapping used on export
///
/// A store chunk `(ocx, ocz)` becomes world chunk `(ocz, max_cz - ocx)`
/// where `max_cz = (max_x - min_x) >> width_bits`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportRemap {
    pub max_cz: i32,
}

impl ExportRemap {
    pub fn new(layout: &ChunkLayout, min_x: i32, max_x: i32) -> Self {
        Self {
            max_cz: (max_x - min_x) >> layout.width_bits,
        }
    }

    pub fn apply(&self, coord: ChunkCoord) -> ChunkCoord {
        ChunkCoord::new(coord.z, self.max_cz - coord.x)
    }
}

/// Write every chunk of the store into `dir`, replacing any chunk files
/// already there. Returns the paths written.
pub fn export_store(
    store: &ChunkStore,
    dir: &Path,
    min_x: i32,
    max_x: i32,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let stale = list_chunk_files(dir)?;
    for path in &stale {
        fs::remove_file(path)?;
    }
    if !stale.is_empty() {
        log::debug!("Removed {} stale chunk files from {}", stale.len(), dir.display());
    }

    let remap = ExportRemap::new(store.layout(), min_x, max_x);
    let chunks = store.snapshot()?;
    let mut written = chunks
        .par_iter()
        .map(|(coord, chunk)| save_chunk(dir, remap.apply(*coord), chunk))
        .collect::<Result<Vec<_>>>()?;
    written.sort();

    log::info!("Exported {} chunks to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::{LayerSpec, Material};
    use tempfile::TempDir;

    #[test]
    fn test_chunk_path() {
        let path = chunk_path(Path::new("/tmp/arrays"), ChunkCoord::new(-2, 7));
        assert_eq!(path, PathBuf::from("/tmp/arrays/-2x7.vxc"));
        assert_eq!(parse_chunk_path(&path), Some(ChunkCoord::new(-2, 7)));
        assert_eq!(parse_chunk_path(Path::new("notes.txt")), None);
        assert_eq!(parse_chunk_path(Path::new("ax1.vxc")), None);
    }

    #[test]
    fn test_compress_decompress_chunk() {
        let layout = ChunkLayout::default();
        let mut chunk = VoxelChunk::new(&layout);
        let spec: LayerSpec = "Water:3, Sand:2, Stone".parse().unwrap();
        chunk.write_column(4, 9, 70, &spec);
        chunk.set(0, 0, 5, Material::new(35, 14));

        let compressed = compress_chunk(ChunkCoord::new(3, -1), &chunk).unwrap();
        let (coord, restored) = decompress_chunk(&compressed).unwrap();

        assert_eq!(coord, ChunkCoord::new(3, -1));
        assert_eq!(restored, chunk);
    }

    #[test]
    fn test_compression_ratio() {
        let layout = ChunkLayout::default();
        let mut chunk = VoxelChunk::new(&layout);
        for lx in 0..16 {
            for lz in 0..16 {
                chunk.write_column(lx, lz, 64, &LayerSpec::solid(Material::STONE));
            }
        }
        let raw = serialize_chunk(ChunkCoord::new(0, 0), &chunk).unwrap();
        let compressed = compress_chunk(ChunkCoord::new(0, 0), &chunk).unwrap();
        assert!(compressed.len() * 10 < raw.len());
    }

    #[test]
    fn test_corrupt_data_is_rejected() {
        assert!(decompress_chunk(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_remap() {
        let layout = ChunkLayout::default();
        let remap = ExportRemap::new(&layout, 0, 63);
        assert_eq!(remap.max_cz, 3);
        assert_eq!(remap.apply(ChunkCoord::new(0, 0)), ChunkCoord::new(0, 3));
        assert_eq!(remap.apply(ChunkCoord::new(2, 5)), ChunkCoord::new(5, 1));
    }

    #[test]
    fn test_export_replaces_old_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("99x99.vxc"), b"stale").unwrap();
        fs::write(dir.join("keep.txt"), b"other").unwrap();

        let store = ChunkStore::new(ChunkLayout::default());
        store.write_column(0, 0, 0, &LayerSpec::solid(Material::STONE)).unwrap();
        store.write_column(20, 0, 0, &LayerSpec::solid(Material::STONE)).unwrap();

        let written = export_store(&store, dir, 0, 31).unwrap();
        assert_eq!(written.len(), 2);
        assert!(!dir.join("99x99.vxc").exists());
        assert!(dir.join("keep.txt").exists());
        // store chunks (0,0) and (1,0) with max_cz 1
        assert!(dir.join("0x1.vxc").exists());
        assert!(dir.join("0x0.vxc").exists());
        assert_eq!(list_chunk_files(dir).unwrap().len(), 2);
    }
}
