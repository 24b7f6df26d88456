//! Fixed 128-byte terrain chunk header.
//!
//! # Binary Layout (retail)
//!
//! ```text
//! Offset | Size | Field              | Description
//! -------|------|--------------------|-----------------------------------------
//! 0x00   |  4   | flags              | TerrainChunkFlags
//! 0x04   |  4   | index_x            | Column within the tile (0..16)
//! 0x08   |  4   | index_y            | Row within the tile (0..16)
//! 0x0C   |  4   | n_layers           | Texture layer count
//! 0x10   |  4   | n_doodad_refs      | Doodad references in MCRF
//! 0x14   |  8   | ofs_height/normal  | Two offsets, or 64-bit holes (flag 0x10000)
//! 0x1C   |  4   | ofs_layer          | MCLY
//! 0x20   |  4   | ofs_refs           | MCRF
//! 0x24   |  4   | ofs_alpha          | MCAL
//! 0x28   |  4   | size_alpha         |
//! 0x2C   |  4   | ofs_shadow         | MCSH
//! 0x30   |  4   | size_shadow        |
//! 0x34   |  4   | area_id            |
//! 0x38   |  4   | n_map_obj_refs     | Object references in MCRF
//! 0x3C   |  2   | holes_low_res      | 4×4 hole bits
//! 0x3E   |  2   | unknown            |
//! 0x40   | 16   | low_quality_tex    | 2 bits per cell, 8×8
//! 0x50   |  8   | no_effect_doodad   | 1 bit per cell, 8×8
//! 0x58   |  4   | ofs_snd_emitters   | MCSE
//! 0x5C   |  4   | n_snd_emitters     |
//! 0x60   |  4   | ofs_liquid         | MCLQ
//! 0x64   |  4   | size_liquid        |
//! 0x68   | 12   | position           | World position (X, Y, Z)
//! 0x74   |  4   | ofs_mccv           | MCCV
//! 0x78   |  4   | ofs_mclv           | MCLV
//! 0x7C   |  4   | unused             |
//! ```
//!
//! Retail offsets count from the start of the terrain chunk record, including its
//! 8-byte tag and length.
//!
//! # Binary Layout (alpha)
//!
//! ```text
//! Offset | Size | Field              | Description
//! -------|------|--------------------|-----------------------------------------
//! 0x00   |  4   | flags              | TerrainChunkFlags
//! 0x04   |  4   | index_x            |
//! 0x08   |  4   | index_y            |
//! 0x0C   |  4   | radius             | Bounding radius
//! 0x10   |  4   | n_layers           |
//! 0x14   |  4   | n_doodad_refs      |
//! 0x18   |  4   | ofs_height         | Untagged, 145 floats
//! 0x1C   |  4   | ofs_normal         | Untagged, 145 × 3 bytes
//! 0x20   |  4   | ofs_layer          |
//! 0x24   |  4   | ofs_refs           |
//! 0x28   |  4   | ofs_alpha          |
//! 0x2C   |  4   | size_alpha         |
//! 0x30   |  4   | ofs_shadow         |
//! 0x34   |  4   | size_shadow        |
//! 0x38   |  4   | area_id            |
//! 0x3C   |  4   | n_map_obj_refs     |
//! 0x40   |  2   | holes              | 4×4 hole bits
//! 0x42   |  2   | padding            |
//! 0x44   | 16   | low_quality_tex    |
//! 0x54   |  8   | no_effect_doodad   |
//! 0x5C   |  4   | ofs_snd_emitters   |
//! 0x60   |  4   | n_snd_emitters     |
//! 0x64   |  4   | ofs_liquid         |
//! 0x68   | 24   | padding            |
//! ```
//!
//! Alpha offsets count from the end of the header.
//!
//! Reference: <https://wowdev.wiki/ADT/v18#MCNK_chunk>,
//! <https://wowdev.wiki/Alpha#MCNK_chunk>

use bitflags::bitflags;

use crate::chunk_id::ChunkId;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::liquid::LegacyLiquidType;

/// Size of the terrain chunk header in both dialects.
pub const TERRAIN_HEADER_SIZE: usize = 128;

bitflags! {
    /// Terrain chunk flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TerrainChunkFlags: u32 {
        /// Shadow map present
        const HAS_SHADOW            = 0x0000_0001;
        /// Impassable terrain
        const IMPASSABLE            = 0x0000_0002;
        /// River liquid in MCLQ
        const LIQUID_RIVER          = 0x0000_0004;
        /// Ocean liquid in MCLQ
        const LIQUID_OCEAN          = 0x0000_0008;
        /// Magma liquid in MCLQ
        const LIQUID_MAGMA          = 0x0000_0010;
        /// Slime liquid in MCLQ
        const LIQUID_SLIME          = 0x0000_0020;
        /// Vertex colors present
        const HAS_VERTEX_COLORS     = 0x0000_0040;
        /// Alpha maps carry the full 64×64 grid
        const DO_NOT_FIX_ALPHA_MAP  = 0x0000_8000;
        /// Bytes 0x14..0x1C hold a 64-bit hole map instead of height/normal offsets
        const HIGH_RES_HOLES        = 0x0001_0000;
    }
}

impl TerrainChunkFlags {
    /// Liquid types present in the legacy per-chunk liquid record, in storage order.
    pub fn liquid_types(self) -> Vec<LegacyLiquidType> {
        [
            (Self::LIQUID_RIVER, LegacyLiquidType::Water),
            (Self::LIQUID_OCEAN, LegacyLiquidType::Ocean),
            (Self::LIQUID_MAGMA, LegacyLiquidType::Magma),
            (Self::LIQUID_SLIME, LegacyLiquidType::Slime),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, liquid)| liquid)
        .collect()
    }

    /// Whether alpha maps need their last row and column replicated.
    pub fn fixes_alpha_edges(self) -> bool {
        !self.contains(Self::DO_NOT_FIX_ALPHA_MAP)
    }
}

/// Terrain holes, in one of two mutually exclusive resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum HoleMask {
    /// 4×4 bits, each covering 2×2 cells.
    LowRes(u16),
    /// 8×8 bits, one byte per row.
    HighRes(u64),
}

impl HoleMask {
    /// Whether the cell at (`x`, `y`) in the 8×8 cell grid is a hole.
    pub fn is_hole(&self, x: usize, y: usize) -> bool {
        if x >= 8 || y >= 8 {
            return false;
        }
        match *self {
            Self::LowRes(bits) => bits & (1 << ((y / 2) * 4 + x / 2)) != 0,
            Self::HighRes(bits) => bits & (1 << (y * 8 + x)) != 0,
        }
    }

    /// Whether any cell is a hole.
    pub fn has_holes(&self) -> bool {
        match *self {
            Self::LowRes(bits) => bits != 0,
            Self::HighRes(bits) => bits != 0,
        }
    }
}

impl Default for HoleMask {
    fn default() -> Self {
        Self::LowRes(0)
    }
}

/// Offset and size of a sub-record as stored in the header.
///
/// An offset of 0 marks the sub-record absent. Size is 0 for sub-records whose
/// header slot carries no size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SubRecordRef {
    /// Offset as stored; its base depends on the dialect.
    pub offset: u32,
    /// Size as stored, including the sub-record's own 8-byte header in retail files.
    pub size: u32,
}

impl SubRecordRef {
    fn at(offset: u32) -> Self {
        Self { offset, size: 0 }
    }

    /// Whether the header marks the sub-record as present.
    pub fn is_present(&self) -> bool {
        self.offset != 0
    }
}

/// Decoded terrain chunk header.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TerrainChunkHeader {
    /// Raw flags.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_flags"))]
    pub flags: TerrainChunkFlags,
    /// Column within the tile.
    pub index_x: u32,
    /// Row within the tile.
    pub index_y: u32,
    /// Texture layer count.
    pub layer_count: u32,
    /// Doodad references at the start of the reference list.
    pub doodad_ref_count: u32,
    /// Object references after the doodad references.
    pub object_ref_count: u32,
    /// Zone the chunk belongs to.
    pub area_id: u32,
    /// Hole mask, resolution chosen by [`TerrainChunkFlags::HIGH_RES_HOLES`].
    pub holes: HoleMask,
    /// World position; zero in alpha files, which do not store one.
    pub position: [f32; 3],
    /// Bounding radius (alpha only).
    pub radius: Option<f32>,
    /// 2-bit low-detail texture index per cell, 8×8 cells.
    pub low_quality_textures: [u8; 16],
    /// 1 bit per cell disabling ground effect doodads, 8×8 cells.
    pub no_effect_doodad: [u8; 8],
    /// Sound emitter count.
    pub sound_emitter_count: u32,
    /// Heights (`None` when the slot holds high-res holes).
    pub heights: Option<SubRecordRef>,
    /// Normals (`None` when the slot holds high-res holes).
    pub normals: Option<SubRecordRef>,
    /// Texture layer table.
    pub layers: SubRecordRef,
    /// Doodad and object references.
    pub references: SubRecordRef,
    /// Alpha maps.
    pub alpha_maps: SubRecordRef,
    /// Shadow map.
    pub shadow: SubRecordRef,
    /// Sound emitters.
    pub sound_emitters: SubRecordRef,
    /// Legacy liquid.
    pub liquid: SubRecordRef,
    /// Vertex colors (retail only).
    pub vertex_colors: SubRecordRef,
    /// Vertex lighting (retail only).
    pub vertex_lighting: SubRecordRef,
}

#[cfg(feature = "serde")]
fn serialize_flags<S: serde::Serializer>(
    flags: &TerrainChunkFlags,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u32(flags.bits())
}

impl TerrainChunkHeader {
    /// Decode the retail header layout.
    pub fn decode_modern(payload: &[u8]) -> Result<Self> {
        let c = header_cursor(payload)?;
        let flags = TerrainChunkFlags::from_bits_retain(c.read_u32(0x00)?);

        let (holes, heights, normals) = if flags.contains(TerrainChunkFlags::HIGH_RES_HOLES) {
            (HoleMask::HighRes(c.read_u64(0x14)?), None, None)
        } else {
            (
                HoleMask::LowRes(c.read_u16(0x3C)?),
                Some(SubRecordRef::at(c.read_u32(0x14)?)),
                Some(SubRecordRef::at(c.read_u32(0x18)?)),
            )
        };

        Ok(Self {
            flags,
            index_x: c.read_u32(0x04)?,
            index_y: c.read_u32(0x08)?,
            layer_count: c.read_u32(0x0C)?,
            doodad_ref_count: c.read_u32(0x10)?,
            object_ref_count: c.read_u32(0x38)?,
            area_id: c.read_u32(0x34)?,
            holes,
            position: c.read_f32_array(0x68)?,
            radius: None,
            low_quality_textures: byte_array(&c, 0x40)?,
            no_effect_doodad: byte_array(&c, 0x50)?,
            sound_emitter_count: c.read_u32(0x5C)?,
            heights,
            normals,
            layers: SubRecordRef::at(c.read_u32(0x1C)?),
            references: SubRecordRef::at(c.read_u32(0x20)?),
            alpha_maps: pair(&c, 0x24)?,
            shadow: pair(&c, 0x2C)?,
            sound_emitters: SubRecordRef::at(c.read_u32(0x58)?),
            liquid: pair(&c, 0x60)?,
            vertex_colors: SubRecordRef::at(c.read_u32(0x74)?),
            vertex_lighting: SubRecordRef::at(c.read_u32(0x78)?),
        })
    }

    /// Decode the alpha header layout.
    pub fn decode_legacy(payload: &[u8]) -> Result<Self> {
        let c = header_cursor(payload)?;
        Ok(Self {
            flags: TerrainChunkFlags::from_bits_retain(c.read_u32(0x00)?),
            index_x: c.read_u32(0x04)?,
            index_y: c.read_u32(0x08)?,
            radius: Some(c.read_f32(0x0C)?),
            layer_count: c.read_u32(0x10)?,
            doodad_ref_count: c.read_u32(0x14)?,
            heights: Some(SubRecordRef::at(c.read_u32(0x18)?)),
            normals: Some(SubRecordRef::at(c.read_u32(0x1C)?)),
            layers: SubRecordRef::at(c.read_u32(0x20)?),
            references: SubRecordRef::at(c.read_u32(0x24)?),
            alpha_maps: pair(&c, 0x28)?,
            shadow: pair(&c, 0x30)?,
            area_id: c.read_u32(0x38)?,
            object_ref_count: c.read_u32(0x3C)?,
            holes: HoleMask::LowRes(c.read_u16(0x40)?),
            low_quality_textures: byte_array(&c, 0x44)?,
            no_effect_doodad: byte_array(&c, 0x54)?,
            sound_emitters: SubRecordRef::at(c.read_u32(0x5C)?),
            sound_emitter_count: c.read_u32(0x60)?,
            liquid: SubRecordRef::at(c.read_u32(0x64)?),
            position: [0.0; 3],
            vertex_colors: SubRecordRef::default(),
            vertex_lighting: SubRecordRef::default(),
        })
    }

    /// Low-detail texture index (0..4) for the cell at (`x`, `y`).
    pub fn low_quality_texture(&self, x: usize, y: usize) -> Option<u8> {
        if x >= 8 || y >= 8 {
            return None;
        }
        let bit = (y * 8 + x) * 2;
        Some((self.low_quality_textures[bit / 8] >> (bit % 8)) & 0b11)
    }

    /// Whether ground effect doodads are disabled for the cell at (`x`, `y`).
    pub fn effect_doodads_disabled(&self, x: usize, y: usize) -> bool {
        x < 8 && y < 8 && self.no_effect_doodad[y] & (1 << x) != 0
    }
}

fn header_cursor(payload: &[u8]) -> Result<ByteCursor<'_>> {
    if payload.len() < TERRAIN_HEADER_SIZE {
        return Err(DecodeError::TruncatedHeader {
            tag: ChunkId::MCNK,
            expected: TERRAIN_HEADER_SIZE,
            actual: payload.len(),
        });
    }
    Ok(ByteCursor::new(&payload[..TERRAIN_HEADER_SIZE]))
}

fn pair(c: &ByteCursor<'_>, at: usize) -> Result<SubRecordRef> {
    Ok(SubRecordRef {
        offset: c.read_u32(at)?,
        size: c.read_u32(at + 4)?,
    })
}

fn byte_array<const N: usize>(c: &ByteCursor<'_>, at: usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(c.slice(at, N)?);
    Ok(out)
}
