//! Fixed-format per-vertex and per-cell terrain samples.
//!
//! Heights, normals and vertex colors all use the same 145-vertex layout: a 9×9
//! outer grid and an 8×8 inner grid, interleaved row by row.
//!
//! ```text
//! Row 0:  O O O O O O O O O      (9 outer)
//! Row 1:   I I I I I I I I       (8 inner)
//! Row 2:  O O O O O O O O O
//! ...
//! Row 16: O O O O O O O O O
//! ```
//!
//! Alpha files store the 81 outer vertices first and the 64 inner ones after;
//! decoders here always return the interleaved order.

use crate::chunk_id::ChunkId;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};

/// Vertices per terrain chunk.
pub const VERTEX_COUNT: usize = 145;

/// Bytes in a height record.
pub const HEIGHTS_SIZE: usize = VERTEX_COUNT * 4;

/// Bytes in a normal record without padding.
pub const NORMALS_SIZE: usize = VERTEX_COUNT * 3;

/// Bytes in a normal record including the trailing 13 padding bytes.
pub const NORMALS_PADDED_SIZE: usize = NORMALS_SIZE + 13;

/// Bytes in a shadow map.
pub const SHADOW_SIZE: usize = 512;

const OUTER_SIDE: usize = 9;
const INNER_SIDE: usize = 8;
const ROW_STRIDE: usize = OUTER_SIDE + INNER_SIDE;

/// Index of outer vertex (`x`, `y`) in interleaved order.
pub fn outer_index(x: usize, y: usize) -> usize {
    y * ROW_STRIDE + x
}

/// Index of inner vertex (`x`, `y`) in interleaved order.
pub fn inner_index(x: usize, y: usize) -> usize {
    y * ROW_STRIDE + OUTER_SIDE + x
}

/// Reorder 81-outer-then-64-inner samples into interleaved order.
pub fn interleave<T: Copy + Default>(split: &[T; VERTEX_COUNT]) -> [T; VERTEX_COUNT] {
    let mut out = [T::default(); VERTEX_COUNT];
    for y in 0..OUTER_SIDE {
        for x in 0..OUTER_SIDE {
            out[outer_index(x, y)] = split[y * OUTER_SIDE + x];
        }
    }
    let inner_start = OUTER_SIDE * OUTER_SIDE;
    for y in 0..INNER_SIDE {
        for x in 0..INNER_SIDE {
            out[inner_index(x, y)] = split[inner_start + y * INNER_SIDE + x];
        }
    }
    out
}

/// Heights (MCVT), relative to the chunk's world position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HeightMap {
    /// 145 heights in interleaved order.
    #[cfg_attr(feature = "serde", serde(serialize_with = "crate::serde_arrays::serialize"))]
    pub heights: [f32; VERTEX_COUNT],
}

impl HeightMap {
    /// Decode an interleaved height record; exactly 580 bytes.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            heights: read_heights(payload)?,
        })
    }

    /// Decode an alpha height record (outer grid first).
    pub fn decode_split(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            heights: interleave(&read_heights(payload)?),
        })
    }

    /// Number of samples; always 145.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Always false.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Height of outer vertex (`x`, `y`), both in 0..9.
    pub fn outer(&self, x: usize, y: usize) -> Option<f32> {
        (x < OUTER_SIDE && y < OUTER_SIDE).then(|| self.heights[outer_index(x, y)])
    }

    /// Height of inner vertex (`x`, `y`), both in 0..8.
    pub fn inner(&self, x: usize, y: usize) -> Option<f32> {
        (x < INNER_SIDE && y < INNER_SIDE).then(|| self.heights[inner_index(x, y)])
    }

    /// Lowest and highest sample.
    pub fn range(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            })
    }
}

fn read_heights(payload: &[u8]) -> Result<[f32; VERTEX_COUNT]> {
    if payload.len() != HEIGHTS_SIZE {
        return Err(DecodeError::InvalidRecordSize {
            tag: ChunkId::MCVT,
            expected: HEIGHTS_SIZE,
            actual: payload.len(),
        });
    }
    ByteCursor::new(payload).read_f32_array(0)
}

/// Normals (MCNR) as unit-ish vectors in (X, Y, Z) order.
///
/// Stored as signed bytes in X, Z, Y order, scaled by 1/127.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NormalMap {
    /// 145 normals in interleaved order.
    #[cfg_attr(feature = "serde", serde(serialize_with = "crate::serde_arrays::serialize"))]
    pub normals: [[f32; 3]; VERTEX_COUNT],
}

impl NormalMap {
    /// Decode an interleaved normal record (435 bytes, usually padded to 448).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            normals: read_normals(payload)?,
        })
    }

    /// Decode an alpha normal record (outer grid first).
    pub fn decode_split(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            normals: interleave(&read_normals(payload)?),
        })
    }
}

fn read_normals(payload: &[u8]) -> Result<[[f32; 3]; VERTEX_COUNT]> {
    if payload.len() < NORMALS_SIZE {
        return Err(DecodeError::InvalidRecordSize {
            tag: ChunkId::MCNR,
            expected: NORMALS_SIZE,
            actual: payload.len(),
        });
    }
    let mut normals = [[0.0f32; 3]; VERTEX_COUNT];
    for (normal, raw) in normals.iter_mut().zip(payload.chunks_exact(3)) {
        let [x, z, y] = [raw[0], raw[1], raw[2]].map(|b| f32::from(b as i8) / 127.0);
        *normal = [x, y, z];
    }
    Ok(normals)
}

/// Baked shadow map (MCSH), 64×64 bits.
///
/// Each row is 8 bytes, least significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShadowMap {
    /// One 64-bit mask per row; bit `x` set means shadowed.
    #[cfg_attr(feature = "serde", serde(serialize_with = "crate::serde_arrays::serialize"))]
    pub rows: [u64; 64],
}

impl ShadowMap {
    /// Decode a 512-byte shadow map; trailing bytes are ignored.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < SHADOW_SIZE {
            return Err(DecodeError::InvalidRecordSize {
                tag: ChunkId::MCSH,
                expected: SHADOW_SIZE,
                actual: payload.len(),
            });
        }
        let cursor = ByteCursor::new(payload);
        let mut rows = [0u64; 64];
        for (y, row) in rows.iter_mut().enumerate() {
            *row = cursor.read_u64(y * 8)?;
        }
        Ok(Self { rows })
    }

    /// Whether sample (`x`, `y`) is shadowed.
    pub fn is_shadowed(&self, x: usize, y: usize) -> bool {
        x < 64 && y < 64 && (self.rows[y] >> x) & 1 != 0
    }

    /// Expand to one byte per sample (0 or 1), row-major.
    pub fn to_grid(&self) -> Vec<u8> {
        (0..64)
            .flat_map(|y| (0..64).map(move |x| (y, x)))
            .map(|(y, x)| u8::from(self.is_shadowed(x, y)))
            .collect()
    }
}

/// Vertex colors (MCCV), one BGRA entry per vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexColors {
    /// 145 colors as stored: blue, green, red, alpha.
    #[cfg_attr(feature = "serde", serde(serialize_with = "crate::serde_arrays::serialize"))]
    pub colors: [[u8; 4]; VERTEX_COUNT],
}

impl VertexColors {
    /// Decode 145 × 4 bytes.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let bytes = ByteCursor::new(payload).slice(0, VERTEX_COUNT * 4)?;
        let mut colors = [[0u8; 4]; VERTEX_COUNT];
        for (color, raw) in colors.iter_mut().zip(bytes.chunks_exact(4)) {
            color.copy_from_slice(raw);
        }
        Ok(Self { colors })
    }
}

/// Doodad and object references (MCRF) into the tile's placement tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectReferences {
    /// Indices into the doodad placements.
    pub doodads: Vec<u32>,
    /// Indices into the object placements.
    pub objects: Vec<u32>,
}

impl ObjectReferences {
    /// Split `payload` into `doodad_count` then `object_count` indices.
    pub fn decode(payload: &[u8], doodad_count: u32, object_count: u32) -> Result<Self> {
        let cursor = ByteCursor::new(payload);
        let doodad_count = doodad_count as usize;
        Ok(Self {
            doodads: cursor.read_u32_vec(0, doodad_count)?,
            objects: cursor.read_u32_vec(doodad_count * 4, object_count as usize)?,
        })
    }
}
