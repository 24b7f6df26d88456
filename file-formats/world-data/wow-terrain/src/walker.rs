//! Lazy iteration over tagged records.
//!
//! Map, tile and terrain chunk payloads all share one framing:
//!
//! ```text
//! Offset | Size   | Field   | Description
//! -------|--------|---------|----------------------------------
//! 0x00   | 4      | tag     | Record tag (possibly byte-reversed)
//! 0x04   | 4      | length  | Payload length, little-endian
//! 0x08   | length | payload | Record payload
//! ```
//!
//! Real files are regularly cut off mid-record. A record whose payload would run
//! past the end of the buffer ends the walk silently; nothing after it is yielded.

use crate::chunk_id::ChunkId;
use crate::cursor::ByteCursor;
use crate::format::Orientation;

/// Size of a record header (tag + length).
pub const RECORD_HEADER_SIZE: usize = 8;

/// One record borrowed from its source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawChunk<'a> {
    /// Tag in reading order.
    pub tag: ChunkId,
    /// Offset of the record header, relative to the walked buffer plus its base.
    pub offset: u32,
    /// Payload bytes, without the 8-byte header.
    pub payload: &'a [u8],
}

impl<'a> RawChunk<'a> {
    /// Payload length.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Offset of the first payload byte.
    pub fn payload_offset(&self) -> u32 {
        self.offset.saturating_add(RECORD_HEADER_SIZE as u32)
    }

    /// Cursor over the payload.
    pub fn cursor(&self) -> ByteCursor<'a> {
        ByteCursor::new(self.payload)
    }
}

/// Restartable iterator over the records of a buffer.
///
/// Cloning a walker restarts from the clone's current position; [`ChunkWalker::new`]
/// always starts from the beginning.
///
/// ```rust
/// use wow_terrain::{ChunkId, ChunkWalker, Orientation};
///
/// let mut data = Vec::new();
/// data.extend_from_slice(b"REVM");
/// data.extend_from_slice(&4u32.to_le_bytes());
/// data.extend_from_slice(&18u32.to_le_bytes());
///
/// let records: Vec<_> = ChunkWalker::new(&data, Orientation::Reversed).collect();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].tag, ChunkId::MVER);
/// ```
#[derive(Debug, Clone)]
pub struct ChunkWalker<'a> {
    cursor: ByteCursor<'a>,
    orientation: Orientation,
    position: usize,
    base: u32,
    finished: bool,
}

impl<'a> ChunkWalker<'a> {
    /// Walk `data` from its first byte.
    pub fn new(data: &'a [u8], orientation: Orientation) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            orientation,
            position: 0,
            base: 0,
            finished: false,
        }
    }

    /// Walk `data` starting at `start`.
    pub fn starting_at(data: &'a [u8], orientation: Orientation, start: usize) -> Self {
        Self {
            position: start,
            ..Self::new(data, orientation)
        }
    }

    /// Add `base` to every reported record offset.
    ///
    /// Used for nested walks so that offsets stay absolute to the file.
    pub fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    /// Tag orientation used by this walker.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Position of the next record header.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read the single record whose header starts at `position`.
    ///
    /// Returns `None` when the header or payload does not fit the buffer.
    pub fn record_at(&self, position: usize) -> Option<RawChunk<'a>> {
        let tag = self.cursor.read_tag_bytes(position).ok()?;
        let length = self.cursor.read_u32(position.checked_add(4)?).ok()? as usize;
        let payload = self
            .cursor
            .slice(position.checked_add(RECORD_HEADER_SIZE)?, length)
            .ok()?;
        let offset = u32::try_from(position).ok()?.checked_add(self.base)?;
        Some(RawChunk {
            tag: ChunkId::from_disk(tag, self.orientation),
            offset,
            payload,
        })
    }
}

impl<'a> Iterator for ChunkWalker<'a> {
    type Item = RawChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.position >= self.cursor.len() {
            return None;
        }

        match self.record_at(self.position) {
            Some(record) => {
                self.position += RECORD_HEADER_SIZE + record.payload.len();
                Some(record)
            }
            None => {
                self.finished = true;
                log::warn!(
                    "Truncated record at offset {} ({} bytes remain), ending walk",
                    u64::from(self.base) + self.position as u64,
                    self.cursor.len() - self.position
                );
                None
            }
        }
    }
}

impl std::iter::FusedIterator for ChunkWalker<'_> {}
