//! Decoder for World of Warcraft map and terrain tile containers
//!
//! This crate turns the bytes of a map file (WDT) or terrain tile file (ADT)
//! into a structured value tree: record tags and offsets, terrain heights and
//! normals, texture layers with their alpha maps, shadow maps, and both
//! generations of liquid data.
//!
//! ## Supported Layouts
//!
//! - Alpha (0.5.x): single-file maps with `MDNM`/`MONM` name lists, headers
//!   relative to their end, heights and normals stored untagged
//! - Retail (1.x - 3.x): byte-reversed tags, `MMDX`/`MWMO` name lists,
//!   `MCLQ` per-chunk liquid and the `MH2O` liquid table
//!
//! ## Features
//!
//! - Zero-copy walking of tagged records, tolerant of truncated files
//! - Tag orientation and dialect detection
//! - Partial decoding: a damaged sub-record is reported, everything else decodes
//! - Alpha map run-length decoding and encoding
//! - Optional `serde` support for every decoded type
//!
//! ## Example
//!
//! ```no_run
//! use wow_terrain::MapFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("Azeroth_32_48.adt")?;
//! let file = MapFile::decode(&data);
//!
//! log::info!("{} dialect, {} terrain chunks", file.dialect, file.terrain_chunks.len());
//! let textures = file.texture_table();
//! for chunk in &file.terrain_chunks {
//!     for name in chunk.texture_names(&textures).into_iter().flatten() {
//!         log::info!("chunk {},{} uses {name}", chunk.header.index_x, chunk.header.index_y);
//!     }
//! }
//! for error in &file.errors {
//!     log::warn!("{} at {}: {}", error.tag, error.offset, error.error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## References
//!
//! - <https://wowdev.wiki/ADT/v18>
//! - <https://wowdev.wiki/Alpha>
//! - <https://wowdev.wiki/WDT>

pub mod alpha;
pub mod chunk_id;
pub mod cursor;
pub mod error;
pub mod format;
pub mod headers;
pub mod liquid;
pub mod map;
pub mod names;
pub mod options;
pub mod placement;
pub mod terrain;
pub mod tile_table;
pub mod walker;

#[cfg(feature = "serde")]
mod serde_arrays;

pub use alpha::{ALPHA_MAP_SIDE, ALPHA_MAP_SIZE, AlphaGrid, AlphaMapCodec};
pub use chunk_id::ChunkId;
pub use cursor::{ByteCursor, FixedSize};
pub use error::{DecodeError, FieldError, LiquidError, RecordError, Result};
pub use format::{DEFAULT_DETECTION_WINDOW, Dialect, Orientation, detect, detect_dialect, detect_with_window};
pub use headers::{MapFlags, MapHeader, TileHeader, TileOffsets};
pub use liquid::{
    LegacyLiquid, LegacyLiquidType, LegacyLiquidVertex, LiquidAttributes, LiquidDecoder,
    LiquidInstance, LiquidTable, LiquidVertexFormat,
};
pub use map::{MapFile, MapRecord};
pub use names::{NameList, TextureTable};
pub use options::DecodeOptions;
pub use placement::{DoodadPlacement, ObjectPlacement};
pub use terrain::{
    HeightMap, HoleMask, LayerFlags, NormalMap, ObjectReferences, ShadowMap, SubRecordRef,
    TerrainChunk, TerrainChunkFlags, TerrainChunkHeader, TerrainContext, TerrainField,
    TerrainSubRecord, TextureLayer, VertexColors,
};
pub use tile_table::{TileEntryLayout, TileLocator, TileTable, TileTableDecoder};
pub use walker::{ChunkWalker, RawChunk};
