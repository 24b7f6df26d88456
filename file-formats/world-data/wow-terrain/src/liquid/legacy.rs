//! Per-terrain-chunk liquid (MCLQ), used before the tile-wide liquid table.
//!
//! # Binary Layout
//!
//! ```text
//! Offset | Size | Field       | Description
//! -------|------|-------------|-------------------------------------------
//! 0x000  |  8   | height_range| Min and max height (stripped by the caller)
//! ------ body passed to LegacyLiquid::decode starts here ------
//! 0x000  | 648  | vertices    | 9×9 vertices, 8 bytes each
//! 0x288  |  64  | tiles       | 8×8 tile flags
//! 0x2C8  |  4   | n_flowvs    | Stated flow count
//! 0x2CC  |  80  | flows       | Always two 40-byte flow records
//! ```
//!
//! Vertex layout depends on the liquid type:
//!
//! ```text
//! Type         | Bytes 0-3                    | Bytes 4-7
//! -------------|------------------------------|-----------
//! Water, Slime | depth, flow0, flow1, filler  | height f32
//! Ocean        | depth, foam, wet, filler     | unused
//! Magma        | s u16, t u16                 | height f32
//! ```
//!
//! Reference: <https://wowdev.wiki/ADT/v18#MCLQ_sub-chunk>

use binrw::BinRead;

use crate::cursor::{ByteCursor, FixedSize};

/// Vertices per legacy liquid record.
pub const LEGACY_VERTEX_COUNT: usize = 81;

/// Tile flags per legacy liquid record.
pub const LEGACY_TILE_COUNT: usize = 64;

/// Flow records always present after the flow count.
pub const LEGACY_FLOW_SLOTS: usize = 2;

const VERTEX_STRIDE: usize = 8;
const TILES_OFFSET: usize = LEGACY_VERTEX_COUNT * VERTEX_STRIDE;
const FLOW_COUNT_OFFSET: usize = TILES_OFFSET + LEGACY_TILE_COUNT;
const FLOWS_OFFSET: usize = FLOW_COUNT_OFFSET + 4;

/// Size of one liquid body, without the 8-byte height range.
pub const LEGACY_BODY_SIZE: usize = FLOWS_OFFSET + LEGACY_FLOW_SLOTS * LiquidFlow::SIZE;

/// Tile flag value marking a tile without liquid.
const TILE_NO_LIQUID: u8 = 0x0F;

/// Liquid kind selected by the owning terrain chunk's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LegacyLiquidType {
    /// River water
    Water,
    /// Ocean
    Ocean,
    /// Magma
    Magma,
    /// Slime (water vertex layout)
    Slime,
}

/// One liquid vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LegacyLiquidVertex {
    /// Water and slime.
    Water {
        /// Depth below the surface
        depth: u8,
        /// First flow weight
        flow0: u8,
        /// Second flow weight
        flow1: u8,
        /// Surface height
        height: f32,
    },
    /// Ocean; no stored height.
    Ocean {
        /// Depth below the surface
        depth: u8,
        /// Foam amount
        foam: u8,
        /// Wetness
        wet: u8,
    },
    /// Magma with texture coordinates.
    Magma {
        /// Texture coordinate S
        s: u16,
        /// Texture coordinate T
        t: u16,
        /// Surface height
        height: f32,
    },
}

impl LegacyLiquidVertex {
    /// Surface height, if this layout stores one.
    pub fn height(&self) -> Option<f32> {
        match *self {
            Self::Water { height, .. } | Self::Magma { height, .. } => Some(height),
            Self::Ocean { .. } => None,
        }
    }

    fn decode(raw: &[u8], liquid_type: LegacyLiquidType) -> Self {
        let height = f32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        match liquid_type {
            LegacyLiquidType::Water | LegacyLiquidType::Slime => Self::Water {
                depth: raw[0],
                flow0: raw[1],
                flow1: raw[2],
                height,
            },
            LegacyLiquidType::Ocean => Self::Ocean {
                depth: raw[0],
                foam: raw[1],
                wet: raw[2],
            },
            LegacyLiquidType::Magma => Self::Magma {
                s: u16::from_le_bytes([raw[0], raw[1]]),
                t: u16::from_le_bytes([raw[2], raw[3]]),
                height,
            },
        }
    }
}

/// Flow descriptor, 40 bytes.
#[derive(Debug, Clone, Copy, PartialEq, BinRead)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LiquidFlow {
    /// Center of the influence sphere
    pub sphere_center: [f32; 3],
    /// Radius of the influence sphere
    pub sphere_radius: f32,
    /// Flow direction
    pub direction: [f32; 3],
    /// Flow speed
    pub velocity: f32,
    /// Wave amplitude
    pub amplitude: f32,
    /// Wave frequency
    pub frequency: f32,
}

impl FixedSize for LiquidFlow {
    const SIZE: usize = 40;
}

/// Decoded legacy liquid record.
///
/// Short payloads leave the later fields empty; decoding never fails.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LegacyLiquid {
    /// Liquid kind used to pick the vertex layout.
    pub liquid_type: LegacyLiquidType,
    /// Min and max height, when the record carried them.
    pub height_range: Option<(f32, f32)>,
    /// Up to 81 vertices, row-major 9×9.
    pub vertices: Vec<LegacyLiquidVertex>,
    /// 8×8 tile flags.
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::serde_arrays::serialize_option")
    )]
    pub tiles: Option<[u8; LEGACY_TILE_COUNT]>,
    /// Flow count as stored.
    pub flow_count: Option<u32>,
    /// Zero to two flow records.
    pub flows: Vec<LiquidFlow>,
}

impl LegacyLiquid {
    /// Decode a liquid body (everything after the height range).
    pub fn decode(payload: &[u8], liquid_type: LegacyLiquidType) -> Self {
        let cursor = ByteCursor::new(payload);

        let vertices = payload
            .chunks_exact(VERTEX_STRIDE)
            .take(LEGACY_VERTEX_COUNT)
            .map(|raw| LegacyLiquidVertex::decode(raw, liquid_type))
            .collect();

        let tiles = cursor.slice(TILES_OFFSET, LEGACY_TILE_COUNT).ok().map(|raw| {
            let mut tiles = [0u8; LEGACY_TILE_COUNT];
            tiles.copy_from_slice(raw);
            tiles
        });

        let flow_count = cursor.read_u32(FLOW_COUNT_OFFSET).ok();

        // The client reads both slots whatever the stated count says.
        let flows = (0..LEGACY_FLOW_SLOTS)
            .map_while(|slot| cursor.read_record(FLOWS_OFFSET + slot * LiquidFlow::SIZE).ok())
            .collect();

        Self {
            liquid_type,
            height_range: None,
            vertices,
            tiles,
            flow_count,
            flows,
        }
    }

    /// Decode a full record: 8-byte height range followed by the body.
    pub fn decode_with_range(payload: &[u8], liquid_type: LegacyLiquidType) -> Self {
        let cursor = ByteCursor::new(payload);
        let height_range = cursor
            .read_f32(0)
            .and_then(|min| Ok((min, cursor.read_f32(4)?)))
            .ok();
        let body = payload.get(8..).unwrap_or_default();
        Self {
            height_range,
            ..Self::decode(body, liquid_type)
        }
    }

    /// Raw flag byte of tile (`x`, `y`), both in 0..8.
    pub fn tile(&self, x: usize, y: usize) -> Option<u8> {
        if x >= 8 || y >= 8 {
            return None;
        }
        self.tiles.map(|tiles| tiles[y * 8 + x])
    }

    /// Whether tile (`x`, `y`) holds liquid.
    pub fn has_liquid(&self, x: usize, y: usize) -> bool {
        self.tile(x, y)
            .is_some_and(|flags| flags & 0x0F != TILE_NO_LIQUID)
    }

    /// Whether tile (`x`, `y`) is marked fishable.
    pub fn is_fishable(&self, x: usize, y: usize) -> bool {
        self.tile(x, y).is_some_and(|flags| flags & 0x40 != 0)
    }
}
