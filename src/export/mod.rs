//! Output: chunk files, world import and preview images

pub mod disk_io;
pub mod preview;
pub mod world;

pub use disk_io::{
    chunk_path, compress_chunk, decompress_chunk, export_store, list_chunk_files, load_chunk,
    save_chunk, ExportRemap, CHUNK_EXTENSION,
};
pub use preview::{write_preview, PreviewKind};
pub use world::{load_chunks, ChunkSink, MemoryWorld};
