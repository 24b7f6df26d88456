//! Tile tables: the map's 64×64 tile grid (MAIN) and a tile's 16×16 chunk index
//! (MCIN).
//!
//! Both are square grids of fixed-size entries. Retail and alpha files use
//! 16-byte entries (offset, size, flags, async id); retail map files that keep
//! their tiles in separate files use 8-byte entries (flags, async id).
//!
//! Only occupied cells become locators.

use crate::chunk_id::ChunkId;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};

/// Flag bit marking an occupied cell in 8-byte entries.
pub const TILE_EXISTS: u32 = 0x1;

/// Entry layout of a tile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TileEntryLayout {
    /// Offset, size, flags, async id.
    Located,
    /// Flags, async id; tiles live in their own files.
    FlagsOnly,
}

impl TileEntryLayout {
    /// Entry size in bytes.
    pub fn entry_size(self) -> usize {
        match self {
            Self::Located => 16,
            Self::FlagsOnly => 8,
        }
    }
}

/// One occupied cell of a tile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TileLocator {
    /// Column.
    pub grid_x: u8,
    /// Row.
    pub grid_y: u8,
    /// Absolute file offset of the tile or chunk record; 0 for flags-only entries.
    pub offset: u32,
    /// Record size; 0 for flags-only entries.
    pub size: u32,
    /// Entry flags.
    pub flags: u32,
    /// Runtime async id.
    pub async_id: u32,
}

/// Decoded tile table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TileTable {
    /// Grid width (64 for MAIN, 16 for MCIN).
    pub width: usize,
    /// Entry layout found.
    pub layout: TileEntryLayout,
    /// Occupied cells in row-major order.
    pub locators: Vec<TileLocator>,
}

impl TileTable {
    /// Decode a tile table payload. See [`TileTableDecoder::decode`].
    pub fn decode(tag: ChunkId, payload: &[u8]) -> Result<Self> {
        TileTableDecoder::decode(tag, payload)
    }

    /// Locator of the cell at (`x`, `y`), if occupied.
    pub fn get(&self, x: usize, y: usize) -> Option<&TileLocator> {
        self.locators
            .iter()
            .find(|locator| usize::from(locator.grid_x) == x && usize::from(locator.grid_y) == y)
    }

    /// Whether the cell at (`x`, `y`) is occupied.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some()
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Whether no cell is occupied.
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

/// Decoder for square tile tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileTableDecoder;

impl TileTableDecoder {
    /// Decode a tile table.
    ///
    /// The entry layout is the one whose entry count is a perfect square, trying
    /// 16-byte entries first. A payload matching neither is
    /// [`DecodeError::UnrecognizedLayout`].
    pub fn decode(tag: ChunkId, payload: &[u8]) -> Result<TileTable> {
        let (layout, width) = [TileEntryLayout::Located, TileEntryLayout::FlagsOnly]
            .into_iter()
            .find_map(|layout| square_width(payload.len(), layout.entry_size()).map(|w| (layout, w)))
            .ok_or_else(|| DecodeError::UnrecognizedLayout {
                tag,
                detail: format!("{} bytes is not a square grid of 16- or 8-byte entries", payload.len()),
            })?;

        let cursor = ByteCursor::new(payload);
        let entry_size = layout.entry_size();
        let mut locators = Vec::new();

        for index in 0..width * width {
            let at = index * entry_size;
            let (offset, size, flags, async_id) = match layout {
                TileEntryLayout::Located => (
                    cursor.read_u32(at)?,
                    cursor.read_u32(at + 4)?,
                    cursor.read_u32(at + 8)?,
                    cursor.read_u32(at + 12)?,
                ),
                TileEntryLayout::FlagsOnly => (0, 0, cursor.read_u32(at)?, cursor.read_u32(at + 4)?),
            };
            let occupied = match layout {
                TileEntryLayout::Located => offset != 0,
                TileEntryLayout::FlagsOnly => flags & TILE_EXISTS != 0,
            };
            if occupied {
                locators.push(TileLocator {
                    grid_x: (index % width) as u8,
                    grid_y: (index / width) as u8,
                    offset,
                    size,
                    flags,
                    async_id,
                });
            }
        }

        log::debug!(
            "{tag}: {width}x{width} grid, {} occupied, {layout:?} entries",
            locators.len()
        );
        Ok(TileTable {
            width,
            layout,
            locators,
        })
    }
}

/// Width of a square grid of `entry_size` entries filling `len` bytes exactly.
fn square_width(len: usize, entry_size: usize) -> Option<usize> {
    if len == 0 || len % entry_size != 0 {
        return None;
    }
    let count = len / entry_size;
    let width = count.isqrt();
    (width * width == count && width <= 256).then_some(width)
}
