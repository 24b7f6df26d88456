//! Tag orientation and container dialect detection.
//!
//! Two facts decide how a buffer is decoded:
//!
//! - **Orientation**: whether tags are stored byte-reversed (retail) or as read
//!   (some early and converted files).
//! - **Dialect**: whether the container follows the alpha layouts (model and
//!   object names in `MDNM`/`MONM`, untagged heights, header-relative offsets) or
//!   the retail layouts (`MMDX`/`MWMO`, tagged sub-records, chunk-relative offsets).
//!
//! Detection only reads record headers, never payloads, so it is cheap enough to
//! run on every buffer.

use crate::chunk_id::ChunkId;
use crate::walker::ChunkWalker;

/// Default number of records examined per orientation.
pub const DEFAULT_DETECTION_WINDOW: usize = 10;

/// Tags that only appear at the top level of map and tile containers.
const WELL_KNOWN_TAGS: [ChunkId; 5] = [
    ChunkId::MVER,
    ChunkId::MHDR,
    ChunkId::MPHD,
    ChunkId::MAIN,
    ChunkId::MTEX,
];

/// Byte order of 4-byte tags on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Orientation {
    /// Tags stored in reading order ("MVER").
    #[default]
    Forward,
    /// Tags stored byte-reversed ("REVM").
    Reversed,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reversed => write!(f, "reversed"),
        }
    }
}

/// Container dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Dialect {
    /// Alpha layouts: `MDNM`/`MONM` name lists, terrain chunks embedded in the map.
    Legacy,
    /// Retail layouts: `MMDX`/`MWMO` name lists.
    Modern,
    /// No dialect-specific name list was found; decoded with the legacy layouts.
    #[default]
    Unknown,
}

impl Dialect {
    /// Whether field layouts follow the alpha format.
    pub fn uses_legacy_layout(self) -> bool {
        matches!(self, Self::Legacy | Self::Unknown)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Modern => write!(f, "modern"),
            Self::Unknown => write!(f, "legacy-unknown"),
        }
    }
}

/// Detect orientation and dialect using the default detection window.
///
/// ```rust
/// use wow_terrain::{detect, Dialect, Orientation};
///
/// let mut data = Vec::new();
/// for (tag, payload) in [(b"REVM", &[18u8, 0, 0, 0][..]), (b"XDMM", &[][..])] {
///     data.extend_from_slice(tag);
///     data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
///     data.extend_from_slice(payload);
/// }
/// assert_eq!(detect(&data), (Orientation::Reversed, Dialect::Modern));
/// ```
pub fn detect(buffer: &[u8]) -> (Orientation, Dialect) {
    detect_with_window(buffer, DEFAULT_DETECTION_WINDOW)
}

/// Detect orientation from the first `window` records, then the dialect.
///
/// Each orientation walks the buffer and counts well-known top-level tags.
/// The higher count wins and a tie goes to reversed, the retail orientation.
/// With no known tag either way the buffer is taken as forward with an
/// unknown dialect.
pub fn detect_with_window(buffer: &[u8], window: usize) -> (Orientation, Dialect) {
    let forward = known_tag_count(buffer, Orientation::Forward, window);
    let reversed = known_tag_count(buffer, Orientation::Reversed, window);

    let orientation = match (forward, reversed) {
        (0, 0) => {
            log::warn!("No well-known tag in the first {window} records, assuming forward legacy layout");
            return (Orientation::Forward, Dialect::Unknown);
        }
        (f, r) if f > r => Orientation::Forward,
        _ => Orientation::Reversed,
    };

    let dialect = detect_dialect(buffer, orientation);
    log::debug!("Detected {orientation:?} tags, {dialect} dialect");
    (orientation, dialect)
}

/// Decide the dialect from the first dialect-specific name list tag.
pub fn detect_dialect(buffer: &[u8], orientation: Orientation) -> Dialect {
    ChunkWalker::new(buffer, orientation)
        .find_map(|record| match record.tag {
            ChunkId::MDNM | ChunkId::MONM => Some(Dialect::Legacy),
            ChunkId::MMDX | ChunkId::MWMO => Some(Dialect::Modern),
            _ => None,
        })
        .unwrap_or(Dialect::Unknown)
}

fn known_tag_count(buffer: &[u8], orientation: Orientation, window: usize) -> usize {
    ChunkWalker::new(buffer, orientation)
        .take(window)
        .filter(|record| WELL_KNOWN_TAGS.contains(&record.tag))
        .count()
}
