//! Name lists (MTEX, MMDX, MWMO, MDNM, MONM) and texture lookup.
//!
//! Name lists store NUL-terminated file names back to back with no padding.
//! Placements refer to names through index tables (MMID, MWID) holding byte
//! offsets into the list, so each name keeps the offset it was found at.
//!
//! Some files carry non-ASCII bytes in names; they are converted lossily.

/// NUL-delimited list of file names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NameList {
    /// Names in on-disk order.
    pub names: Vec<String>,
    /// Byte offset of each name within the list.
    pub offsets: Vec<u32>,
}

impl NameList {
    /// Split a name list payload. Empty entries (double NULs, trailing padding)
    /// are skipped, and a final name without terminator is kept.
    pub fn decode(payload: &[u8]) -> Self {
        let mut list = Self::default();
        let mut start = 0usize;

        for part in payload.split(|&b| b == 0) {
            if !part.is_empty() {
                list.names.push(String::from_utf8_lossy(part).into_owned());
                list.offsets.push(start as u32);
            }
            start += part.len() + 1;
        }

        list
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the list holds no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Name starting at byte `offset`, as referenced by MMID/MWID entries.
    pub fn name_at_offset(&self, offset: u32) -> Option<&str> {
        self.offsets
            .binary_search(&offset)
            .ok()
            .and_then(|index| self.get(index))
    }

    /// Resolve an index table entry (MMID/MWID) to its name.
    pub fn resolve(&self, indices: &[u32], entry: u32) -> Option<&str> {
        indices
            .get(entry as usize)
            .and_then(|&offset| self.name_at_offset(offset))
    }

    /// Iterate over the names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Texture names of one file, used to resolve layer texture ids.
///
/// Built once per file and passed to whoever needs the names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureTable {
    names: Vec<String>,
}

impl TextureTable {
    /// Table over `names`, indexed by texture id.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Name of texture `id`.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Number of textures.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<&NameList> for TextureTable {
    fn from(list: &NameList) -> Self {
        Self::new(list.names.clone())
    }
}
