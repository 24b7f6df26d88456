//! Doodad (MDDF) and object (MODF) placements.
//!
//! Both are arrays of fixed-size records. A trailing partial record is ignored.

use binrw::BinRead;

use crate::chunk_id::ChunkId;
use crate::cursor::{ByteCursor, FixedSize};
use crate::error::Result;

/// Doodad placement, 36 bytes.
///
/// ```text
/// Offset | Size | Field
/// -------|------|------------------------------
/// 0x00   |  4   | name id (MMID entry)
/// 0x04   |  4   | unique id
/// 0x08   | 12   | position (X, Y, Z)
/// 0x14   | 12   | rotation in degrees
/// 0x20   |  2   | scale, 1024 = 1.0
/// 0x22   |  2   | flags
/// ```
#[derive(Debug, Clone, Copy, PartialEq, BinRead)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DoodadPlacement {
    /// Index into the model index table.
    pub name_id: u32,
    /// Unique across loaded tiles.
    pub unique_id: u32,
    /// World position.
    pub position: [f32; 3],
    /// Rotation in degrees.
    pub rotation: [f32; 3],
    /// Scale, 1024 = 1.0.
    pub scale: u16,
    /// Placement flags.
    pub flags: u16,
}

impl FixedSize for DoodadPlacement {
    const SIZE: usize = 36;
}

impl DoodadPlacement {
    /// Scale as a factor.
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        f32::from(self.scale) / 1024.0
    }
}

/// Object placement, 64 bytes.
///
/// ```text
/// Offset | Size | Field
/// -------|------|------------------------------
/// 0x00   |  4   | name id (MWID entry)
/// 0x04   |  4   | unique id
/// 0x08   | 12   | position
/// 0x14   | 12   | rotation in degrees
/// 0x20   | 12   | bounds min
/// 0x2C   | 12   | bounds max
/// 0x38   |  2   | flags
/// 0x3A   |  2   | doodad set
/// 0x3C   |  2   | name set
/// 0x3E   |  2   | scale (padding before Legion)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, BinRead)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectPlacement {
    /// Index into the object index table.
    pub name_id: u32,
    /// Unique across loaded tiles.
    pub unique_id: u32,
    /// World position.
    pub position: [f32; 3],
    /// Rotation in degrees.
    pub rotation: [f32; 3],
    /// Bounding box minimum.
    pub extents_min: [f32; 3],
    /// Bounding box maximum.
    pub extents_max: [f32; 3],
    /// Placement flags.
    pub flags: u16,
    /// Doodad set to show.
    pub doodad_set: u16,
    /// Name set.
    pub name_set: u16,
    /// Scale, 1024 = 1.0; 0 in files that predate it.
    pub scale: u16,
}

impl FixedSize for ObjectPlacement {
    const SIZE: usize = 64;
}

impl ObjectPlacement {
    /// Scale as a factor; files without a scale field read as 1.0.
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        if self.scale == 0 {
            1.0
        } else {
            f32::from(self.scale) / 1024.0
        }
    }
}

/// Decode a placement array, warning about a trailing partial record.
pub(crate) fn decode_placements<T>(tag: ChunkId, payload: &[u8]) -> Result<Vec<T>>
where
    T: BinRead + FixedSize,
    for<'b> T::Args<'b>: Default,
{
    let (records, trailing) = ByteCursor::new(payload).read_records::<T>(0)?;
    if trailing != 0 {
        log::warn!(
            "{tag} has {trailing} trailing bytes after {} records of {} bytes",
            records.len(),
            T::SIZE
        );
    }
    Ok(records)
}
