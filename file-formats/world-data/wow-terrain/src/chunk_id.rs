use crate::format::Orientation;

/// 4-byte record tag.
///
/// Tags are kept in their conventional reading order ("MVER", "MCNK"), no matter
/// how they were stored. Retail files store tags byte-reversed, so the bytes for
/// "MVER" on disk read "REVM"; some early files store them as written. Use
/// [`ChunkId::from_disk`] with the buffer's [`Orientation`] to normalize.
///
/// # Usage
///
/// ```rust
/// use wow_terrain::{ChunkId, Orientation};
///
/// let tag = ChunkId::from_disk(*b"REVM", Orientation::Reversed);
/// assert_eq!(tag, ChunkId::MVER);
/// assert_eq!(tag.as_str(), "MVER");
///
/// assert_eq!(ChunkId::from_str("MCNK"), Some(ChunkId::MCNK));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    // Top-level records

    /// Format version
    pub const MVER: Self = Self(*b"MVER");

    /// Map header (WDT)
    pub const MPHD: Self = Self(*b"MPHD");

    /// Tile table (WDT)
    pub const MAIN: Self = Self(*b"MAIN");

    /// Tile header (ADT)
    pub const MHDR: Self = Self(*b"MHDR");

    /// Terrain chunk index (ADT)
    pub const MCIN: Self = Self(*b"MCIN");

    /// Texture file names
    pub const MTEX: Self = Self(*b"MTEX");

    /// Model file names (retail)
    pub const MMDX: Self = Self(*b"MMDX");

    /// Model name offsets into MMDX
    pub const MMID: Self = Self(*b"MMID");

    /// World object file names (retail)
    pub const MWMO: Self = Self(*b"MWMO");

    /// World object name offsets into MWMO
    pub const MWID: Self = Self(*b"MWID");

    /// Model file names (alpha)
    pub const MDNM: Self = Self(*b"MDNM");

    /// World object file names (alpha)
    pub const MONM: Self = Self(*b"MONM");

    /// Model placements
    pub const MDDF: Self = Self(*b"MDDF");

    /// World object placements
    pub const MODF: Self = Self(*b"MODF");

    /// Liquid table covering a whole tile (WotLK+)
    pub const MH2O: Self = Self(*b"MH2O");

    /// Terrain chunk
    pub const MCNK: Self = Self(*b"MCNK");

    // Terrain sub-records

    /// Heights
    pub const MCVT: Self = Self(*b"MCVT");

    /// Normals
    pub const MCNR: Self = Self(*b"MCNR");

    /// Texture layers
    pub const MCLY: Self = Self(*b"MCLY");

    /// Doodad and object references
    pub const MCRF: Self = Self(*b"MCRF");

    /// Alpha maps
    pub const MCAL: Self = Self(*b"MCAL");

    /// Shadow map
    pub const MCSH: Self = Self(*b"MCSH");

    /// Per-chunk liquid (pre-WotLK)
    pub const MCLQ: Self = Self(*b"MCLQ");

    /// Vertex colors
    pub const MCCV: Self = Self(*b"MCCV");

    /// Sound emitters
    pub const MCSE: Self = Self(*b"MCSE");

    /// Build a tag from the bytes stored on disk.
    pub fn from_disk(mut bytes: [u8; 4], orientation: Orientation) -> Self {
        if orientation == Orientation::Reversed {
            bytes.reverse();
        }
        Self(bytes)
    }

    /// Bytes as they would be stored on disk.
    pub fn to_disk(self, orientation: Orientation) -> [u8; 4] {
        let mut bytes = self.0;
        if orientation == Orientation::Reversed {
            bytes.reverse();
        }
        bytes
    }

    /// Tag as text, lossy for non-ASCII bytes.
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Parse a 4-character tag in reading order.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let bytes: [u8; 4] = s.as_bytes().try_into().ok()?;
        Some(Self(bytes))
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ChunkId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}
