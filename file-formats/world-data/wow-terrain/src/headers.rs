//! Map header (MPHD) and tile header (MHDR).
//!
//! Both exist in two layouts. Retail map headers carry feature flags, alpha map
//! headers point at the model and object name lists. Retail tile headers list
//! the offset of every top-level record, alpha tile headers only the chunk
//! index, textures and placements.

use bitflags::bitflags;

use crate::chunk_id::ChunkId;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::format::Dialect;
use crate::terrain::SubRecordRef;

bitflags! {
    /// Map-wide feature flags of a retail map header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MapFlags: u32 {
        /// Map is a single global object, no terrain
        const GLOBAL_MAP_OBJECT           = 0x0001;
        /// Tiles carry vertex colors (MCCV)
        const HAS_VERTEX_COLORS           = 0x0002;
        /// Alpha maps are 8-bit (4096 bytes) instead of 4-bit
        const BIG_ALPHA                   = 0x0004;
        /// Doodad references sorted by size category
        const DOODAD_REFS_SORTED_BY_SIZE  = 0x0008;
        /// Tiles carry vertex lighting (MCLV)
        const HAS_VERTEX_LIGHTING         = 0x0010;
        /// Ground is displayed upside down
        const UPSIDE_DOWN_GROUND          = 0x0020;
        /// Set on most maps from 4.3 on
        const UNKNOWN_0X40                = 0x0040;
        /// Height-based texture blending
        const HEIGHT_TEXTURING            = 0x0080;
        /// Load LOD tiles
        const LOAD_LOD                    = 0x0100;
        /// File data ids follow the flags
        const HAS_FILE_DATA_IDS           = 0x0200;
    }
}

/// Size of a retail map header.
pub const MODERN_MAP_HEADER_SIZE: usize = 32;

/// Bytes of an alpha map header that carry data (the rest is padding).
pub const LEGACY_MAP_HEADER_SIZE: usize = 16;

/// Size of a retail tile header.
pub const MODERN_TILE_HEADER_SIZE: usize = 48;

/// Bytes of an alpha tile header that carry data.
pub const LEGACY_TILE_HEADER_SIZE: usize = 28;

/// Map header (MPHD).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MapHeader {
    /// Retail layout.
    Modern {
        /// Feature flags.
        #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_map_flags"))]
        flags: MapFlags,
        /// Words after the flags; file data ids when [`MapFlags::HAS_FILE_DATA_IDS`] is set.
        data: [u32; 7],
    },
    /// Alpha layout.
    Legacy {
        /// Number of model names (MDNM).
        doodad_name_count: u32,
        /// File offset of the model name list.
        doodad_names_offset: u32,
        /// Number of object names (MONM).
        object_name_count: u32,
        /// File offset of the object name list.
        object_names_offset: u32,
    },
}

impl MapHeader {
    /// Decode a map header in `dialect`'s layout.
    pub fn decode(payload: &[u8], dialect: Dialect) -> Result<Self> {
        if dialect.uses_legacy_layout() {
            let c = checked(ChunkId::MPHD, payload, LEGACY_MAP_HEADER_SIZE)?;
            Ok(Self::Legacy {
                doodad_name_count: c.read_u32(0)?,
                doodad_names_offset: c.read_u32(4)?,
                object_name_count: c.read_u32(8)?,
                object_names_offset: c.read_u32(12)?,
            })
        } else {
            let c = checked(ChunkId::MPHD, payload, MODERN_MAP_HEADER_SIZE)?;
            let mut data = [0u32; 7];
            for (index, word) in data.iter_mut().enumerate() {
                *word = c.read_u32(4 + index * 4)?;
            }
            Ok(Self::Modern {
                flags: MapFlags::from_bits_retain(c.read_u32(0)?),
                data,
            })
        }
    }

    /// Retail feature flags; empty for alpha headers.
    pub fn flags(&self) -> MapFlags {
        match self {
            Self::Modern { flags, .. } => *flags,
            Self::Legacy { .. } => MapFlags::empty(),
        }
    }

    /// Whether alpha maps of this map's tiles are stored 8-bit.
    pub fn has_big_alpha(&self) -> bool {
        self.flags().contains(MapFlags::BIG_ALPHA)
    }
}

/// Tile header (MHDR).
///
/// Retail offsets are relative to the start of the header payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TileHeader {
    /// Retail layout.
    Modern {
        /// Tile flags; bit 0 marks a flight bounds record.
        flags: u32,
        /// Offset of each top-level record.
        offsets: TileOffsets,
    },
    /// Alpha layout.
    Legacy {
        /// Chunk index (MCIN); its size is always 256 entries.
        chunk_index: u32,
        /// Texture names.
        textures: SubRecordRef,
        /// Doodad placements.
        doodad_placements: SubRecordRef,
        /// Object placements.
        object_placements: SubRecordRef,
    },
}

/// Record offsets of a retail tile header, 0 when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TileOffsets {
    /// MCIN chunk index
    pub chunk_index: u32,
    /// MTEX texture names
    pub textures: u32,
    /// MMDX model names
    pub models: u32,
    /// MMID model name offsets
    pub model_indices: u32,
    /// MWMO world object names
    pub objects: u32,
    /// MWID world object name offsets
    pub object_indices: u32,
    /// MDDF doodad placements
    pub doodad_placements: u32,
    /// MODF world object placements
    pub object_placements: u32,
    /// MFBO flight bounds
    pub flight_bounds: u32,
    /// MH2O tile liquids
    pub liquid: u32,
    /// MTXF texture flags
    pub texture_flags: u32,
}

impl TileHeader {
    /// Decode a tile header in `dialect`'s layout.
    pub fn decode(payload: &[u8], dialect: Dialect) -> Result<Self> {
        if dialect.uses_legacy_layout() {
            let c = checked(ChunkId::MHDR, payload, LEGACY_TILE_HEADER_SIZE)?;
            let span = |at: usize| -> Result<SubRecordRef> {
                Ok(SubRecordRef {
                    offset: c.read_u32(at)?,
                    size: c.read_u32(at + 4)?,
                })
            };
            Ok(Self::Legacy {
                chunk_index: c.read_u32(0)?,
                textures: span(4)?,
                doodad_placements: span(12)?,
                object_placements: span(20)?,
            })
        } else {
            let c = checked(ChunkId::MHDR, payload, MODERN_TILE_HEADER_SIZE)?;
            let word = |index: usize| c.read_u32(4 + index * 4);
            Ok(Self::Modern {
                flags: c.read_u32(0)?,
                offsets: TileOffsets {
                    chunk_index: word(0)?,
                    textures: word(1)?,
                    models: word(2)?,
                    model_indices: word(3)?,
                    objects: word(4)?,
                    object_indices: word(5)?,
                    doodad_placements: word(6)?,
                    object_placements: word(7)?,
                    flight_bounds: word(8)?,
                    liquid: word(9)?,
                    texture_flags: word(10)?,
                },
            })
        }
    }

    /// Whether the tile has a liquid table.
    pub fn has_liquid(&self) -> bool {
        matches!(self, Self::Modern { offsets, .. } if offsets.liquid != 0)
    }
}

fn checked<'a>(tag: ChunkId, payload: &'a [u8], expected: usize) -> Result<ByteCursor<'a>> {
    if payload.len() < expected {
        return Err(DecodeError::TruncatedHeader {
            tag,
            expected,
            actual: payload.len(),
        });
    }
    Ok(ByteCursor::new(payload))
}

#[cfg(feature = "serde")]
fn serialize_map_flags<S: serde::Serializer>(
    flags: &MapFlags,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u32(flags.bits())
}
