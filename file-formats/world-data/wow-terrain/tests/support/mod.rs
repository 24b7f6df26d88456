//! In-memory builders for map files, tile files and terrain chunks.

#![allow(dead_code)]

use wow_terrain::{ChunkId, Orientation};

/// Install a test logger once; later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Append one `[tag][len][payload]` record.
pub fn push_record(out: &mut Vec<u8>, orientation: Orientation, tag: ChunkId, payload: &[u8]) {
    out.extend_from_slice(&tag.to_disk(orientation));
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// Little-endian bytes of a list of words.
pub fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Little-endian bytes of a list of floats.
pub fn floats(values: impl IntoIterator<Item = f32>) -> Vec<u8> {
    values.into_iter().flat_map(f32::to_le_bytes).collect()
}

/// One 16-byte texture layer entry.
pub fn layer(texture_id: u32, flags: u32, alpha_offset: u32) -> Vec<u8> {
    words(&[texture_id, flags, alpha_offset, 0])
}

/// Header slots of the retail terrain chunk layout.
pub mod slot {
    pub const FLAGS: usize = 0x00;
    pub const INDEX_X: usize = 0x04;
    pub const INDEX_Y: usize = 0x08;
    pub const LAYER_COUNT: usize = 0x0C;
    pub const DOODAD_REFS: usize = 0x10;
    pub const HEIGHTS: usize = 0x14;
    pub const NORMALS: usize = 0x18;
    pub const LAYERS: usize = 0x1C;
    pub const REFERENCES: usize = 0x20;
    pub const ALPHA: usize = 0x24;
    pub const ALPHA_SIZE: usize = 0x28;
    pub const SHADOW: usize = 0x2C;
    pub const SHADOW_SIZE: usize = 0x30;
    pub const AREA_ID: usize = 0x34;
    pub const OBJECT_REFS: usize = 0x38;
    pub const LIQUID: usize = 0x60;
    pub const LIQUID_SIZE: usize = 0x64;
    pub const VERTEX_COLORS: usize = 0x74;
}

/// Builds a retail terrain chunk payload with correct header offsets.
///
/// Offsets are written relative to the start of the record, tag included.
#[derive(Debug, Clone)]
pub struct TerrainChunkBuilder {
    header: [u8; 128],
    body: Vec<u8>,
    orientation: Orientation,
}

impl Default for TerrainChunkBuilder {
    fn default() -> Self {
        Self {
            header: [0; 128],
            body: Vec::new(),
            orientation: Orientation::Reversed,
        }
    }
}

impl TerrainChunkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, at: usize, value: u32) -> Self {
        self.header[at..at + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn flags(self, flags: u32) -> Self {
        self.set(slot::FLAGS, flags)
    }

    pub fn index(self, x: u32, y: u32) -> Self {
        self.set(slot::INDEX_X, x).set(slot::INDEX_Y, y)
    }

    /// Append a tagged sub-record and point `offset_slot` (and `size_slot`) at it.
    pub fn sub_record(
        mut self,
        offset_slot: usize,
        size_slot: Option<usize>,
        tag: ChunkId,
        data: &[u8],
    ) -> Self {
        let offset = (8 + 128 + self.body.len()) as u32;
        push_record(&mut self.body, self.orientation, tag, data);
        self = self.set(offset_slot, offset);
        if let Some(size_slot) = size_slot {
            self = self.set(size_slot, data.len() as u32 + 8);
        }
        self
    }

    /// Append a tagged sub-record that no header slot points at.
    pub fn trailing_record(mut self, tag: ChunkId, data: &[u8]) -> Self {
        push_record(&mut self.body, self.orientation, tag, data);
        self
    }

    pub fn heights(self, heights: &[f32]) -> Self {
        self.sub_record(slot::HEIGHTS, None, ChunkId::MCVT, &floats(heights.iter().copied()))
    }

    pub fn normals(self, normals: &[u8]) -> Self {
        self.sub_record(slot::NORMALS, None, ChunkId::MCNR, normals)
    }

    pub fn layers(self, layers: &[Vec<u8>]) -> Self {
        let data: Vec<u8> = layers.concat();
        self.set(slot::LAYER_COUNT, layers.len() as u32)
            .sub_record(slot::LAYERS, None, ChunkId::MCLY, &data)
    }

    pub fn alpha(self, data: &[u8]) -> Self {
        self.sub_record(slot::ALPHA, Some(slot::ALPHA_SIZE), ChunkId::MCAL, data)
    }

    pub fn shadow(self, data: &[u8]) -> Self {
        self.sub_record(slot::SHADOW, Some(slot::SHADOW_SIZE), ChunkId::MCSH, data)
    }

    pub fn liquid(self, data: &[u8]) -> Self {
        self.sub_record(slot::LIQUID, Some(slot::LIQUID_SIZE), ChunkId::MCLQ, data)
    }

    /// Liquid sub-record with a zero length field, as shipped files store it.
    /// The size slot still carries the real size.
    pub fn liquid_zero_length(mut self, data: &[u8]) -> Self {
        let offset = (8 + 128 + self.body.len()) as u32;
        self.body.extend_from_slice(&ChunkId::MCLQ.to_disk(self.orientation));
        self.body.extend_from_slice(&0u32.to_le_bytes());
        self.body.extend_from_slice(data);
        self.set(slot::LIQUID, offset)
            .set(slot::LIQUID_SIZE, data.len() as u32 + 8)
    }

    pub fn build(self) -> Vec<u8> {
        let mut payload = self.header.to_vec();
        payload.extend_from_slice(&self.body);
        payload
    }
}

/// 145 distinct heights, value = index.
pub fn ramp_heights() -> Vec<f32> {
    (0..145).map(|i| i as f32).collect()
}

/// 448 bytes of normals, all pointing up (stored X, Z, Y).
pub fn flat_normals() -> Vec<u8> {
    let mut normals: Vec<u8> = (0..145).flat_map(|_| [0u8, 127, 0]).collect();
    normals.resize(448, 0);
    normals
}

/// A legacy liquid record: height range, 81 vertices, 64 tiles, flow count, 2 flows.
pub fn legacy_liquid_record(min: f32, max: f32, vertex_height: f32) -> Vec<u8> {
    let mut data = floats([min, max]);
    for _ in 0..81 {
        data.extend_from_slice(&[10, 0, 0, 0]);
        data.extend_from_slice(&vertex_height.to_le_bytes());
    }
    data.extend(std::iter::repeat_n(0x04u8, 64));
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend(std::iter::repeat_n(0u8, 80));
    data
}
