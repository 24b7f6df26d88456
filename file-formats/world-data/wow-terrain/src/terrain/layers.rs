use binrw::BinRead;
use bitflags::bitflags;

use crate::alpha::AlphaGrid;
use crate::cursor::FixedSize;
use crate::names::TextureTable;

bitflags! {
    /// Texture layer flags.
    ///
    /// Bits 0-2 hold the animation rotation and bits 3-5 the animation speed;
    /// see [`LayerFlags::animation_rotation`] and [`LayerFlags::animation_speed`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerFlags: u32 {
        /// Rotation bits (45° steps)
        const ANIMATION_ROTATION      = 0x007;
        /// Speed bits
        const ANIMATION_SPEED         = 0x038;
        /// Texture animation enabled
        const ANIMATION_ENABLED       = 0x040;
        /// Render brighter
        const OVERBRIGHT              = 0x080;
        /// Layer blends through an alpha map
        const USE_ALPHA_MAP           = 0x100;
        /// Alpha map is run-length compressed
        const ALPHA_MAP_COMPRESSED    = 0x200;
        /// Skybox reflection
        const USE_CUBE_MAP_REFLECTION = 0x400;
    }
}

impl LayerFlags {
    /// Animation rotation in 45° steps (0..8).
    pub fn animation_rotation(self) -> u8 {
        (self.bits() & Self::ANIMATION_ROTATION.bits()) as u8
    }

    /// Animation speed (0..8).
    pub fn animation_speed(self) -> u8 {
        ((self.bits() & Self::ANIMATION_SPEED.bits()) >> 3) as u8
    }
}

/// One entry of the texture layer table (MCLY), 16 bytes.
///
/// # Binary Layout
///
/// ```text
/// Offset | Size | Field        | Description
/// -------|------|--------------|---------------------------------------
/// 0x00   |  4   | texture_id   | Index into the texture name list
/// 0x04   |  4   | flags        | LayerFlags
/// 0x08   |  4   | offset_mcal  | Start of this layer's alpha data in MCAL
/// 0x0C   |  4   | effect_id    | Ground effect (alpha files: u16 + pad)
/// ```
///
/// Layer 0 is the opaque base and never has an alpha map.
///
/// Reference: <https://wowdev.wiki/ADT/v18#MCLY_sub-chunk>
#[derive(Debug, Clone, PartialEq, BinRead)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureLayer {
    /// Index into the texture name list.
    pub texture_id: u32,

    /// Layer flags.
    #[br(map = |bits: u32| LayerFlags::from_bits_retain(bits))]
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_layer_flags"))]
    pub flags: LayerFlags,

    /// Offset of this layer's alpha data within the alpha map record.
    pub alpha_map_offset: u32,

    /// Ground effect id.
    pub effect_id: u32,

    /// Decoded 64×64 blend weights, filled in by the terrain chunk decoder.
    #[br(ignore)]
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::serde_arrays::serialize_boxed_option")
    )]
    pub alpha_map: Option<Box<AlphaGrid>>,
}

impl FixedSize for TextureLayer {
    const SIZE: usize = 16;
}

impl TextureLayer {
    /// Whether this layer's flags ask for an alpha map.
    pub fn uses_alpha_map(&self) -> bool {
        self.flags.contains(LayerFlags::USE_ALPHA_MAP)
    }

    /// Resolve the texture name through a file's texture table.
    pub fn texture_name<'t>(&self, textures: &'t TextureTable) -> Option<&'t str> {
        textures.name(self.texture_id)
    }

    /// Blend weight at (`x`, `y`) of the 64×64 grid.
    pub fn alpha(&self, x: usize, y: usize) -> Option<u8> {
        if x >= 64 || y >= 64 {
            return None;
        }
        self.alpha_map.as_ref().map(|grid| grid[y * 64 + x])
    }
}

#[cfg(feature = "serde")]
fn serialize_layer_flags<S: serde::Serializer>(
    flags: &LayerFlags,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u32(flags.bits())
}
