//! Whole-file decoding of map (WDT) and tile (ADT) containers.
//!
//! [`MapFile::decode`] detects the tag orientation and dialect, walks the
//! top-level records and decodes each one into a [`MapRecord`]. A record that
//! fails is kept as a [`RecordError`] and the walk continues.

use crate::chunk_id::ChunkId;
use crate::error::{RecordError, Result};
use crate::format::{Dialect, Orientation, detect_dialect, detect_with_window};
use crate::headers::{MapHeader, TileHeader};
use crate::liquid::LiquidTable;
use crate::names::{NameList, TextureTable};
use crate::options::DecodeOptions;
use crate::placement::{DoodadPlacement, ObjectPlacement, decode_placements};
use crate::terrain::{TerrainChunk, TerrainContext};
use crate::tile_table::TileTable;
use crate::walker::{ChunkWalker, RawChunk};

/// One decoded top-level record.
#[derive(Debug)]
pub enum MapRecord<'a> {
    /// MVER
    Version(u32),
    /// MPHD
    MapHeader(MapHeader),
    /// MHDR
    TileHeader(TileHeader),
    /// MAIN
    TileTable(TileTable),
    /// MCIN
    ChunkIndex(TileTable),
    /// MTEX
    TextureNames(NameList),
    /// MMDX or MDNM
    ModelNames(NameList),
    /// MWMO or MONM
    ObjectNames(NameList),
    /// MMID
    ModelIndices(Vec<u32>),
    /// MWID
    ObjectIndices(Vec<u32>),
    /// MDDF
    DoodadPlacements(Vec<DoodadPlacement>),
    /// MODF
    ObjectPlacements(Vec<ObjectPlacement>),
    /// MCNK
    TerrainChunk(Box<TerrainChunk<'a>>),
    /// MH2O
    Liquid(LiquidTable<'a>),
    /// Unknown tags and records switched off in the options.
    Unknown(RawChunk<'a>),
}

impl<'a> MapRecord<'a> {
    /// Decode one top-level record.
    pub fn decode(
        record: RawChunk<'a>,
        context: TerrainContext,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let payload = record.payload;
        let dialect = context.dialect;

        Ok(match record.tag {
            ChunkId::MVER => Self::Version(record.cursor().read_u32(0)?),
            ChunkId::MPHD => Self::MapHeader(MapHeader::decode(payload, dialect)?),
            ChunkId::MHDR => Self::TileHeader(TileHeader::decode(payload, dialect)?),
            ChunkId::MAIN => Self::TileTable(TileTable::decode(record.tag, payload)?),
            ChunkId::MCIN => Self::ChunkIndex(TileTable::decode(record.tag, payload)?),
            ChunkId::MTEX => Self::TextureNames(NameList::decode(payload)),
            ChunkId::MMDX | ChunkId::MDNM => Self::ModelNames(NameList::decode(payload)),
            ChunkId::MWMO | ChunkId::MONM => Self::ObjectNames(NameList::decode(payload)),
            ChunkId::MMID => Self::ModelIndices(index_list(&record)?),
            ChunkId::MWID => Self::ObjectIndices(index_list(&record)?),
            ChunkId::MDDF => Self::DoodadPlacements(decode_placements(record.tag, payload)?),
            ChunkId::MODF => Self::ObjectPlacements(decode_placements(record.tag, payload)?),
            ChunkId::MCNK if options.decode_terrain => {
                let mut chunk = TerrainChunk::decode_record(&record, context)?;
                if !options.decode_liquids {
                    chunk.liquids.clear();
                }
                Self::TerrainChunk(Box::new(chunk))
            }
            ChunkId::MH2O if options.decode_liquids => Self::Liquid(LiquidTable::decode(payload)),
            _ => Self::Unknown(record),
        })
    }
}

fn index_list(record: &RawChunk<'_>) -> Result<Vec<u32>> {
    record.cursor().read_u32_vec(0, record.len() / 4)
}

/// Decoded map or tile file.
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MapFile<'a> {
    /// Tag orientation used.
    pub orientation: Orientation,
    /// Dialect used.
    pub dialect: Dialect,
    /// Format version.
    pub version: Option<u32>,
    /// Map header (WDT).
    pub map_header: Option<MapHeader>,
    /// Tile header (ADT).
    pub tile_header: Option<TileHeader>,
    /// Map tile grid.
    pub tile_table: Option<TileTable>,
    /// Terrain chunk index of the last tile header seen.
    pub chunk_index: Option<TileTable>,
    /// Texture names.
    pub texture_names: Option<NameList>,
    /// Model names.
    pub model_names: Option<NameList>,
    /// Object names.
    pub object_names: Option<NameList>,
    /// Model name offsets.
    pub model_indices: Option<Vec<u32>>,
    /// Object name offsets.
    pub object_indices: Option<Vec<u32>>,
    /// Doodad placements.
    pub doodad_placements: Vec<DoodadPlacement>,
    /// Object placements.
    pub object_placements: Vec<ObjectPlacement>,
    /// Terrain chunks in file order.
    pub terrain_chunks: Vec<TerrainChunk<'a>>,
    /// Tile-wide liquid table.
    pub liquid: Option<LiquidTable<'a>>,
    /// Records not decoded.
    pub unknown: Vec<RawChunk<'a>>,
    /// Records that failed to decode.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub errors: Vec<RecordError>,
}

impl<'a> MapFile<'a> {
    /// Decode a whole file with default options.
    pub fn decode(buffer: &'a [u8]) -> Self {
        Self::decode_with(buffer, &DecodeOptions::default())
    }

    /// Decode a whole file.
    ///
    /// Never fails as a whole: records that fail to decode end up in
    /// [`MapFile::errors`].
    pub fn decode_with(buffer: &'a [u8], options: &DecodeOptions) -> Self {
        let (orientation, dialect) = resolve_format(buffer, options);
        let context = TerrainContext {
            orientation,
            dialect,
        };

        let mut file = Self {
            orientation,
            dialect,
            ..Self::default()
        };

        for record in ChunkWalker::new(buffer, orientation) {
            let (tag, offset) = (record.tag, record.offset);
            log::trace!("{tag} at {offset}, {} bytes", record.len());
            match MapRecord::decode(record, context, options) {
                Ok(decoded) => file.push(decoded),
                Err(error) => {
                    log::warn!("Skipping {tag} record at offset {offset}: {error}");
                    file.errors.push(RecordError { tag, offset, error });
                }
            }
        }

        log::debug!(
            "Decoded {dialect} file: {} terrain chunks, {} errors",
            file.terrain_chunks.len(),
            file.errors.len()
        );
        file
    }

    /// Store a decoded record in its field.
    pub fn push(&mut self, record: MapRecord<'a>) {
        match record {
            MapRecord::Version(version) => self.version = Some(version),
            MapRecord::MapHeader(header) => self.map_header = Some(header),
            MapRecord::TileHeader(header) => self.tile_header = Some(header),
            MapRecord::TileTable(table) => self.tile_table = Some(table),
            MapRecord::ChunkIndex(table) => self.chunk_index = Some(table),
            MapRecord::TextureNames(names) => self.texture_names = Some(names),
            MapRecord::ModelNames(names) => self.model_names = Some(names),
            MapRecord::ObjectNames(names) => self.object_names = Some(names),
            MapRecord::ModelIndices(indices) => self.model_indices = Some(indices),
            MapRecord::ObjectIndices(indices) => self.object_indices = Some(indices),
            MapRecord::DoodadPlacements(placements) => self.doodad_placements.extend(placements),
            MapRecord::ObjectPlacements(placements) => self.object_placements.extend(placements),
            MapRecord::TerrainChunk(chunk) => self.terrain_chunks.push(*chunk),
            MapRecord::Liquid(table) => self.liquid = Some(table),
            MapRecord::Unknown(record) => self.unknown.push(record),
        }
    }

    /// Texture lookup built from the texture names.
    pub fn texture_table(&self) -> TextureTable {
        self.texture_names
            .as_ref()
            .map(TextureTable::from)
            .unwrap_or_default()
    }

    /// Model name of a doodad placement.
    pub fn doodad_name(&self, placement: &DoodadPlacement) -> Option<&str> {
        let names = self.model_names.as_ref()?;
        match &self.model_indices {
            Some(indices) => names.resolve(indices, placement.name_id),
            None => names.get(placement.name_id as usize),
        }
    }

    /// Object name of an object placement.
    pub fn object_name(&self, placement: &ObjectPlacement) -> Option<&str> {
        let names = self.object_names.as_ref()?;
        match &self.object_indices {
            Some(indices) => names.resolve(indices, placement.name_id),
            None => names.get(placement.name_id as usize),
        }
    }

    /// Terrain chunk at grid position (`x`, `y`).
    pub fn terrain_chunk(&self, x: u32, y: u32) -> Option<&TerrainChunk<'a>> {
        self.terrain_chunks
            .iter()
            .find(|chunk| chunk.header.index_x == x && chunk.header.index_y == y)
    }

    /// Whether every record decoded cleanly.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Orientation and dialect from the options, detecting whatever is not forced.
fn resolve_format(buffer: &[u8], options: &DecodeOptions) -> (Orientation, Dialect) {
    match (options.orientation, options.dialect) {
        (Some(orientation), Some(dialect)) => (orientation, dialect),
        (Some(orientation), None) => (orientation, detect_dialect(buffer, orientation)),
        (None, forced) => {
            let (orientation, detected) = detect_with_window(buffer, options.detection_window);
            (orientation, forced.unwrap_or(detected))
        }
    }
}
