//! Chunk-addressed block storage shared by tile workers
//!
//! The chunk map sits behind an `RwLock` and every chunk behind its own
//! `Mutex`, so workers writing different chunks never contend and two
//! workers touching the same chunk are serialized per batch.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::chunk::{ChunkCoord, ChunkLayout, VoxelChunk};
use super::column::{BlockColumn, LayerSpec};
use super::material::Material;
use crate::core::{Error, Result};

/// Shared handle to one chunk
pub type ChunkHandle = Arc<Mutex<VoxelChunk>>;

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::Poisoned("chunk store lock".into())
}

/// Registry of chunks keyed by chunk coordinate
pub struct ChunkStore {
    layout: ChunkLayout,
    chunks: RwLock<HashMap<ChunkCoord, ChunkHandle>>,
    /// Allocate unknown chunks on first write instead of failing
    lazy: bool,
}

impl ChunkStore {
    /// Empty store that allocates chunks on demand
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            chunks: RwLock::new(HashMap::new()),
            lazy: true,
        }
    }

    /// Store holding every chunk covering the column range plus one chunk of
    /// margin on each side. Writes outside that set fail.
    pub fn preallocated(
        layout: ChunkLayout,
        min_x: i32,
        min_z: i32,
        max_x: i32,
        max_z: i32,
    ) -> Self {
        let bits = layout.width_bits;
        let mut chunks = HashMap::new();
        for cx in (min_x >> bits) - 1..=(max_x >> bits) + 1 {
            for cz in (min_z >> bits) - 1..=(max_z >> bits) + 1 {
                chunks.insert(
                    ChunkCoord::new(cx, cz),
                    Arc::new(Mutex::new(VoxelChunk::new(&layout))),
                );
            }
        }
        log::debug!("Preallocated {} chunks", chunks.len());
        Self {
            layout,
            chunks: RwLock::new(chunks),
            lazy: false,
        }
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Handle to a chunk, allocating it if the store is lazy
    pub fn create_or_get(&self, coord: ChunkCoord) -> Result<ChunkHandle> {
        if let Some(handle) = self.chunks.read().map_err(poisoned)?.get(&coord) {
            return Ok(Arc::clone(handle));
        }
        if !self.lazy {
            return Err(Error::ChunkNotAllocated {
                x: coord.x,
                z: coord.z,
            });
        }
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        let handle = chunks
            .entry(coord)
            .or_insert_with(|| Arc::new(Mutex::new(VoxelChunk::new(&self.layout))));
        Ok(Arc::clone(handle))
    }

    /// Run `f` with exclusive access to one chunk
    pub fn with_chunk<R>(
        &self,
        coord: ChunkCoord,
        f: impl FnOnce(&mut VoxelChunk) -> R,
    ) -> Result<R> {
        let handle = self.create_or_get(coord)?;
        let mut chunk = handle.lock().map_err(poisoned)?;
        Ok(f(&mut chunk))
    }

    /// Write one column from `sea_level + elevation` down to level zero
    pub fn write_column(&self, x: i32, z: i32, elevation: i32, layers: &LayerSpec) -> Result<()> {
        let top = self.layout.column_top(elevation);
        let (lx, lz) = self.layout.offset_of(x, z);
        self.with_chunk(self.layout.chunk_of(x, z), |chunk| {
            chunk.write_column(lx, lz, top, layers)
        })
    }

    /// Write many columns taking each chunk lock once. Returns the number
    /// of columns written.
    pub fn write_columns(&self, columns: &[BlockColumn]) -> Result<usize> {
        let mut by_chunk: BTreeMap<ChunkCoord, Vec<&BlockColumn>> = BTreeMap::new();
        for column in columns {
            by_chunk
                .entry(self.layout.chunk_of(column.x, column.z))
                .or_default()
                .push(column);
        }

        for (coord, batch) in by_chunk {
            self.with_chunk(coord, |chunk| {
                for column in batch {
                    let (lx, lz) = self.layout.offset_of(column.x, column.z);
                    let top = self.layout.column_top(column.elevation);
                    chunk.write_column(lx, lz, top, &column.layers);
                }
            })?;
        }
        Ok(columns.len())
    }

    /// Fill a box of blocks. Returns the number of columns touched.
    pub fn fill(
        &self,
        x: Range<i32>,
        y: Range<u32>,
        z: Range<i32>,
        material: Material,
    ) -> Result<usize> {
        let mut touched = 0;
        for gx in x {
            for gz in z.clone() {
                let (lx, lz) = self.layout.offset_of(gx, gz);
                let (bottom, top) = (y.start as usize, y.end as usize);
                self.with_chunk(self.layout.chunk_of(gx, gz), |chunk| {
                    chunk.fill_column(lx, lz, bottom, top, material)
                })?;
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Material at a global position, `None` if unallocated or out of range
    pub fn material_at(&self, x: i32, y: u32, z: i32) -> Result<Option<Material>> {
        let coord = self.layout.chunk_of(x, z);
        let handle = match self.chunks.read().map_err(poisoned)?.get(&coord) {
            Some(handle) => Arc::clone(handle),
            None => return Ok(None),
        };
        let chunk = handle.lock().map_err(poisoned)?;
        let (lx, lz) = self.layout.offset_of(x, z);
        Ok(chunk.get(lx, lz, y as usize))
    }

    /// Block id at a global position
    pub fn block_at(&self, x: i32, y: u32, z: i32) -> Result<Option<u8>> {
        Ok(self.material_at(x, y, z)?.map(|m| m.id))
    }

    pub fn chunk_count(&self) -> Result<usize> {
        Ok(self.chunks.read().map_err(poisoned)?.len())
    }

    /// Allocated chunk coordinates in sorted order
    pub fn coords(&self) -> Result<Vec<ChunkCoord>> {
        let mut coords: Vec<_> = self.chunks.read().map_err(poisoned)?.keys().copied().collect();
        coords.sort();
        Ok(coords)
    }

    /// Copy of every chunk, ordered by coordinate
    pub fn snapshot(&self) -> Result<BTreeMap<ChunkCoord, VoxelChunk>> {
        let chunks = self.chunks.read().map_err(poisoned)?;
        let mut out = BTreeMap::new();
        for (coord, handle) in chunks.iter() {
            out.insert(*coord, handle.lock().map_err(poisoned)?.clone());
        }
        Ok(out)
    }

    /// Tear the store down into its chunks
    pub fn into_chunks(self) -> Result<BTreeMap<ChunkCoord, VoxelChunk>> {
        let chunks = self.chunks.into_inner().map_err(poisoned)?;
        let mut out = BTreeMap::new();
        for (coord, handle) in chunks {
            let chunk = match Arc::try_unwrap(handle) {
                Ok(mutex) => mutex.into_inner().map_err(poisoned)?,
                Err(shared) => {
                    let guard = shared.lock().map_err(poisoned)?;
                    guard.clone()
                }
            };
            out.insert(coord, chunk);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn spec(s: &str) -> LayerSpec {
        s.parse().unwrap()
    }

    #[test]
    fn test_write_then_read() {
        let store = ChunkStore::new(ChunkLayout::default());
        store
            .write_column(-3, 20, 5, &spec("Grass:1, Dirt:2, Stone"))
            .unwrap();

        assert_eq!(store.material_at(-3, 68, 20).unwrap(), Some(Material::GRASS));
        assert_eq!(store.material_at(-3, 67, 20).unwrap(), Some(Material::DIRT));
        assert_eq!(store.material_at(-3, 66, 20).unwrap(), Some(Material::DIRT));
        assert_eq!(store.material_at(-3, 65, 20).unwrap(), Some(Material::STONE));
        assert_eq!(store.material_at(-3, 0, 20).unwrap(), Some(Material::STONE));
        assert_eq!(store.material_at(-3, 69, 20).unwrap(), Some(Material::AIR));
        assert_eq!(store.block_at(100, 0, 100).unwrap(), None);
        assert_eq!(store.chunk_count().unwrap(), 1);
    }

    #[test]
    fn test_elevation_clamped() {
        let store = ChunkStore::new(ChunkLayout::default());
        store.write_column(0, 0, 500, &spec("Stone")).unwrap();
        assert_eq!(store.block_at(0, 117, 0).unwrap(), Some(1));
        assert_eq!(store.block_at(0, 118, 0).unwrap(), Some(0));
    }

    #[test]
    fn test_preallocated_is_strict() {
        let store = ChunkStore::preallocated(ChunkLayout::default(), 0, 0, 31, 15);
        // chunks -1..=2 by -1..=1
        assert_eq!(store.chunk_count().unwrap(), 12);
        assert!(store.write_column(-16, -16, 0, &spec("Stone")).is_ok());
        match store.write_column(100, 0, 0, &spec("Stone")) {
            Err(Error::ChunkNotAllocated { x, z }) => assert_eq!((x, z), (6, 0)),
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn test_write_columns_batches() {
        let store = ChunkStore::new(ChunkLayout::default());
        let columns: Vec<_> = (0..40)
            .map(|x| BlockColumn::new(x, x / 2, x % 7, spec("Sand:1, Stone")))
            .collect();
        assert_eq!(store.write_columns(&columns).unwrap(), 40);
        for c in &columns {
            let top = 64 + c.elevation as u32;
            assert_eq!(store.material_at(c.x, top - 1, c.z).unwrap(), Some(Material::SAND));
        }
    }

    #[test]
    fn test_fill_box() {
        let store = ChunkStore::new(ChunkLayout::default());
        let touched = store.fill(-2..2, 10..12, 14..18, Material::COBBLESTONE).unwrap();
        assert_eq!(touched, 16);
        assert_eq!(store.chunk_count().unwrap(), 4);
        assert_eq!(store.material_at(-1, 11, 17).unwrap(), Some(Material::COBBLESTONE));
        assert_eq!(store.material_at(-1, 12, 17).unwrap(), Some(Material::AIR));
    }

    #[test]
    fn test_concurrent_writes_same_chunk() {
        let store = Arc::new(ChunkStore::new(ChunkLayout::default()));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for z in 0..16 {
                        store.write_column(t, z, t, &LayerSpec::solid(Material::STONE)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.chunk_count().unwrap(), 1);
        for t in 0..4 {
            assert_eq!(store.block_at(t, 63 + t as u32, 15).unwrap(), Some(1));
            assert_eq!(store.block_at(t, 64 + t as u32, 15).unwrap(), Some(0));
        }
    }

    #[test]
    fn test_snapshot_and_teardown() {
        let store = ChunkStore::new(ChunkLayout::default());
        store.write_column(20, 3, 0, &spec("Stone")).unwrap();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(store.coords().unwrap(), vec![ChunkCoord::new(1, 0)]);
        let chunks = store.into_chunks().unwrap();
        assert_eq!(snapshot, chunks);
    }

    #[test]
    fn test_poisoned_chunk_reports_error() {
        let store = Arc::new(ChunkStore::new(ChunkLayout::default()));
        store.write_column(0, 0, 5, &spec("Stone")).unwrap();
        let writer = Arc::clone(&store);
        let result = thread::spawn(move || {
            let _: Result<()> = writer.with_chunk(ChunkCoord::new(0, 0), |_| panic!("writer died"));
        })
        .join();
        assert!(result.is_err());

        assert!(matches!(store.material_at(0, 0, 0), Err(Error::Poisoned(_))));
        assert!(matches!(store.block_at(3, 1, 3), Err(Error::Poisoned(_))));
        // other chunks and the map itself are unaffected
        assert_eq!(store.material_at(40, 0, 40).unwrap(), None);
        assert_eq!(store.chunk_count().unwrap(), 1);
    }
}
