//! Tile-wide liquid table (MH2O).
//!
//! The payload starts with 256 chunk headers (one per terrain chunk), followed by a
//! shared data area that the headers index into. All offsets are relative to the
//! start of the payload.
//!
//! ```text
//! MH2O payload
//! ├── 256 × chunk header (12 bytes)
//! │   ├── offset_instances ──► instance[layer_count] (24 bytes each)
//! │   │                         ├── offset_exists_bitmap ──► w*h bits
//! │   │                         └── offset_vertex_data   ──► (w+1)*(h+1) vertices
//! │   └── offset_attributes ──► fishable/deep masks (16 bytes)
//! └── data area
//! ```
//!
//! The vertex format is not stored for every client version, so it is inferred
//! from how many bytes each vertex takes. The vertex region of an instance ends at
//! the nearest offset referenced by anything else in the table, or at the end of
//! the payload.
//!
//! Reference: <https://wowdev.wiki/ADT/v18#MH2O_chunk_(WotLK+)>

use std::collections::BTreeSet;

use binrw::BinRead;

use crate::cursor::{ByteCursor, FixedSize};
use crate::error::{DecodeError, LiquidError, Result};

/// Terrain chunks covered by one liquid table.
pub const LIQUID_CHUNK_COUNT: usize = 256;

/// Per-chunk entry of the header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
struct ChunkEntry {
    offset_instances: u32,
    layer_count: u32,
    offset_attributes: u32,
}

impl FixedSize for ChunkEntry {
    const SIZE: usize = 12;
}

/// Instance record as stored, 24 bytes.
#[derive(Debug, Clone, Copy, PartialEq, BinRead)]
#[br(little)]
struct InstanceRecord {
    liquid_type: u16,
    liquid_object: u16,
    min_height: f32,
    max_height: f32,
    x_offset: u8,
    y_offset: u8,
    width: u8,
    height: u8,
    offset_exists_bitmap: u32,
    offset_vertex_data: u32,
}

impl FixedSize for InstanceRecord {
    const SIZE: usize = 24;
}

/// Fishable and deep-water masks for one terrain chunk, one bit per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LiquidAttributes {
    /// Cells where fishing is possible.
    pub fishable: u64,
    /// Cells with fatigue (deep water).
    pub deep: u64,
}

impl FixedSize for LiquidAttributes {
    const SIZE: usize = 16;
}

impl LiquidAttributes {
    /// Whether cell (`x`, `y`) is fishable.
    pub fn is_fishable(&self, x: usize, y: usize) -> bool {
        x < 8 && y < 8 && self.fishable & (1 << (y * 8 + x)) != 0
    }

    /// Whether cell (`x`, `y`) is deep water.
    pub fn is_deep(&self, x: usize, y: usize) -> bool {
        x < 8 && y < 8 && self.deep & (1 << (y * 8 + x)) != 0
    }
}

fn instance_offset(entry: &ChunkEntry, layer: usize) -> usize {
    (entry.offset_instances as usize).saturating_add(layer.saturating_mul(InstanceRecord::SIZE))
}

/// Per-vertex layout of an instance's vertex data.
///
/// | Bytes | Format          | Arrays (each `vertex_count` long) |
/// |-------|-----------------|-----------------------------------|
/// | 5     | `HeightOnly`    | heights f32, depths u8            |
/// | 8     | `HeightUv`      | heights f32, uvs (u16, u16)       |
/// | 1     | `DepthOnly`     | depths u8                         |
/// | 9     | `HeightUvDepth` | heights f32, uvs, depths u8       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LiquidVertexFormat {
    /// Heights plus depths, 5 bytes per vertex.
    HeightOnly,
    /// Heights plus texture coordinates, 8 bytes per vertex.
    HeightUv,
    /// Depths only, 1 byte per vertex.
    DepthOnly,
    /// Heights, texture coordinates and depths, 9 bytes per vertex.
    HeightUvDepth,
    /// Payload size matches no known layout.
    Unknown,
}

impl LiquidVertexFormat {
    /// Infer the format from the vertex region size.
    ///
    /// Sizes that are not an exact multiple of `vertex_count` are `Unknown`.
    pub fn infer(payload_len: usize, vertex_count: usize) -> Self {
        if vertex_count == 0 || payload_len % vertex_count != 0 {
            return Self::Unknown;
        }
        match payload_len / vertex_count {
            5 => Self::HeightOnly,
            8 => Self::HeightUv,
            1 => Self::DepthOnly,
            9 => Self::HeightUvDepth,
            _ => Self::Unknown,
        }
    }

    /// Bytes per vertex, `None` for `Unknown`.
    pub fn bytes_per_vertex(self) -> Option<usize> {
        match self {
            Self::HeightOnly => Some(5),
            Self::HeightUv => Some(8),
            Self::DepthOnly => Some(1),
            Self::HeightUvDepth => Some(9),
            Self::Unknown => None,
        }
    }

    fn has_heights(self) -> bool {
        matches!(self, Self::HeightOnly | Self::HeightUv | Self::HeightUvDepth)
    }

    fn has_uvs(self) -> bool {
        matches!(self, Self::HeightUv | Self::HeightUvDepth)
    }

    fn has_depths(self) -> bool {
        matches!(self, Self::HeightOnly | Self::DepthOnly | Self::HeightUvDepth)
    }
}

/// One liquid layer over a rectangle of a terrain chunk's 8×8 cells.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LiquidInstance<'a> {
    /// Liquid type id (LiquidType.dbc).
    pub liquid_type: u16,
    /// Liquid object id, or the vertex format on early clients.
    pub liquid_object: u16,
    /// `None` when the instance has no vertex data (a flat surface at the minimum height).
    pub vertex_format: Option<LiquidVertexFormat>,
    /// Min and max surface height.
    pub height_range: (f32, f32),
    /// Covered cells: x, y, width, height.
    pub region: (u8, u8, u8, u8),
    /// One bit per covered cell; `None` means every cell is covered.
    pub exists_bitmap: Option<&'a [u8]>,
    /// Raw vertex region.
    pub vertex_payload: Option<&'a [u8]>,
    /// Heights, when the format stores them.
    pub heights: Option<Vec<f32>>,
    /// Texture coordinates, when the format stores them.
    pub uvs: Option<Vec<[u16; 2]>>,
    /// Depths, when the format stores them.
    pub depths: Option<Vec<u8>>,
}

impl LiquidInstance<'_> {
    /// Vertices covered by the region, `(width + 1) * (height + 1)`.
    pub fn vertex_count(&self) -> usize {
        let (_, _, width, height) = self.region;
        (usize::from(width) + 1) * (usize::from(height) + 1)
    }

    /// Whether cell (`x`, `y`) of the region holds liquid.
    pub fn exists(&self, x: usize, y: usize) -> bool {
        let (_, _, width, height) = self.region;
        let (width, height) = (usize::from(width), usize::from(height));
        if x >= width || y >= height {
            return false;
        }
        match self.exists_bitmap {
            None => true,
            Some(bits) => {
                let bit = y * width + x;
                bits.get(bit / 8).is_some_and(|byte| byte & (1 << (bit % 8)) != 0)
            }
        }
    }
}

/// Decoded liquid table.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LiquidTable<'a> {
    /// Instances per terrain chunk; `None` for chunks without liquid.
    pub chunks: Vec<Option<Vec<LiquidInstance<'a>>>>,
    /// Attribute masks per terrain chunk.
    pub attributes: Vec<Option<LiquidAttributes>>,
    /// Instances and chunk headers that failed to decode.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub errors: Vec<LiquidError>,
}

impl<'a> LiquidTable<'a> {
    /// Decode a liquid table payload.
    pub fn decode(payload: &'a [u8]) -> Self {
        let cursor = ByteCursor::new(payload);
        let mut errors = Vec::new();

        let entries: Vec<Option<ChunkEntry>> = (0..LIQUID_CHUNK_COUNT)
            .map(|chunk| match cursor.read_record::<ChunkEntry>(chunk * ChunkEntry::SIZE) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    errors.push(LiquidError {
                        chunk,
                        layer: None,
                        error,
                    });
                    None
                }
            })
            .collect();

        let records: Vec<Vec<Option<InstanceRecord>>> = entries
            .iter()
            .map(|entry| match entry {
                Some(entry) if entry.layer_count > 0 && entry.offset_instances != 0 => {
                    // a count larger than the payload can hold stops at the first missing record
                    let count = (entry.layer_count as usize)
                        .min(payload.len() / InstanceRecord::SIZE + 1);
                    (0..count)
                        .map(|layer| {
                            let offset = instance_offset(entry, layer);
                            cursor.read_record::<InstanceRecord>(offset).ok()
                        })
                        .collect()
                }
                _ => Vec::new(),
            })
            .collect();

        let boundaries = Self::boundaries(payload.len(), &entries, &records);

        let mut chunks = Vec::with_capacity(LIQUID_CHUNK_COUNT);
        let mut attributes = Vec::with_capacity(LIQUID_CHUNK_COUNT);

        for (chunk, (entry, chunk_records)) in entries.iter().zip(&records).enumerate() {
            let Some(entry) = entry.filter(|e| e.layer_count > 0 && e.offset_instances != 0)
            else {
                chunks.push(None);
                attributes.push(None);
                continue;
            };

            attributes.push(if entry.offset_attributes == 0 {
                None
            } else {
                match cursor.read_record::<LiquidAttributes>(entry.offset_attributes as usize) {
                    Ok(attrs) => Some(attrs),
                    Err(error) => {
                        errors.push(LiquidError {
                            chunk,
                            layer: None,
                            error,
                        });
                        None
                    }
                }
            });

            let mut instances = Vec::with_capacity(chunk_records.len());
            for (layer, record) in chunk_records.iter().enumerate() {
                let result = match record {
                    Some(record) => Self::instance(&cursor, record, &boundaries),
                    None => Err(DecodeError::OutOfBounds {
                        offset: instance_offset(&entry, layer),
                        len: InstanceRecord::SIZE,
                        available: payload.len(),
                    }),
                };
                match result {
                    Ok(instance) => instances.push(instance),
                    Err(error) => {
                        log::warn!("Liquid instance {layer} of chunk {chunk} skipped: {error}");
                        errors.push(LiquidError {
                            chunk,
                            layer: Some(layer),
                            error,
                        });
                    }
                }
            }
            chunks.push(Some(instances));
        }

        Self {
            chunks,
            attributes,
            errors,
        }
    }

    /// Instances per terrain chunk as a fixed array.
    pub fn into_chunks(self) -> [Option<Vec<LiquidInstance<'a>>>; LIQUID_CHUNK_COUNT] {
        let mut chunks = self.chunks.into_iter();
        std::array::from_fn(|_| chunks.next().flatten())
    }

    /// Instances of terrain chunk `index`.
    pub fn chunk(&self, index: usize) -> Option<&[LiquidInstance<'a>]> {
        self.chunks.get(index)?.as_deref()
    }

    /// Number of terrain chunks with liquid.
    pub fn liquid_chunk_count(&self) -> usize {
        self.chunks.iter().filter(|chunk| chunk.is_some()).count()
    }

    fn boundaries(
        payload_len: usize,
        entries: &[Option<ChunkEntry>],
        records: &[Vec<Option<InstanceRecord>>],
    ) -> BTreeSet<usize> {
        let mut set = BTreeSet::new();
        set.insert(payload_len);
        for entry in entries.iter().flatten() {
            set.insert(entry.offset_instances as usize);
            set.insert(entry.offset_attributes as usize);
        }
        for record in records.iter().flatten().flatten() {
            set.insert(record.offset_exists_bitmap as usize);
            set.insert(record.offset_vertex_data as usize);
        }
        set.remove(&0);
        set
    }

    fn instance(
        cursor: &ByteCursor<'a>,
        record: &InstanceRecord,
        boundaries: &BTreeSet<usize>,
    ) -> Result<LiquidInstance<'a>> {
        let cells = usize::from(record.width) * usize::from(record.height);

        let exists_bitmap = match record.offset_exists_bitmap {
            0 => None,
            offset => Some(cursor.slice(offset as usize, cells.div_ceil(8))?),
        };

        let mut instance = LiquidInstance {
            liquid_type: record.liquid_type,
            liquid_object: record.liquid_object,
            vertex_format: None,
            height_range: (record.min_height, record.max_height),
            region: (record.x_offset, record.y_offset, record.width, record.height),
            exists_bitmap,
            vertex_payload: None,
            heights: None,
            uvs: None,
            depths: None,
        };

        if record.offset_vertex_data == 0 {
            return Ok(instance);
        }

        let start = record.offset_vertex_data as usize;
        let end = boundaries
            .range(start + 1..)
            .next()
            .copied()
            .unwrap_or(cursor.len());
        let vertices = cursor.slice(start, end.saturating_sub(start))?;
        let vertex_count = instance.vertex_count();
        let format = LiquidVertexFormat::infer(vertices.len(), vertex_count);

        instance.vertex_payload = Some(vertices);
        instance.vertex_format = Some(format);

        if format == LiquidVertexFormat::Unknown {
            log::debug!(
                "Liquid vertex region of {} bytes for {vertex_count} vertices matches no format",
                vertices.len()
            );
            return Ok(instance);
        }

        let data = ByteCursor::new(vertices);
        let mut at = 0;
        if format.has_heights() {
            instance.heights = Some(
                (0..vertex_count)
                    .map(|i| data.read_f32(at + i * 4))
                    .collect::<Result<_>>()?,
            );
            at += vertex_count * 4;
        }
        if format.has_uvs() {
            instance.uvs = Some(
                (0..vertex_count)
                    .map(|i| Ok([data.read_u16(at + i * 4)?, data.read_u16(at + i * 4 + 2)?]))
                    .collect::<Result<_>>()?,
            );
            at += vertex_count * 4;
        }
        if format.has_depths() {
            instance.depths = Some(data.slice(at, vertex_count)?.to_vec());
        }

        Ok(instance)
    }
}
