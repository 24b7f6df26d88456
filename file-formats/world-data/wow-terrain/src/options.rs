//! Decode options for whole map and tile files.

use crate::format::{DEFAULT_DETECTION_WINDOW, Dialect, Orientation};

/// Options for [`MapFile::decode_with`](crate::MapFile::decode_with).
///
/// ```rust
/// use wow_terrain::{DecodeOptions, Dialect, Orientation};
///
/// let options = DecodeOptions::new()
///     .with_orientation(Orientation::Forward)
///     .with_dialect(Dialect::Legacy)
///     .with_terrain(false);
/// assert!(!options.decode_terrain);
/// assert!(options.decode_liquids);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Tag orientation to use instead of detecting it.
    pub orientation: Option<Orientation>,
    /// Dialect to use instead of detecting it.
    pub dialect: Option<Dialect>,
    /// Records examined per orientation during detection.
    pub detection_window: usize,
    /// Decode terrain chunk records (MCNK).
    pub decode_terrain: bool,
    /// Decode liquid tables (MH2O) and keep terrain chunk liquids (MCLQ).
    pub decode_liquids: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            orientation: None,
            dialect: None,
            detection_window: DEFAULT_DETECTION_WINDOW,
            decode_terrain: true,
            decode_liquids: true,
        }
    }
}

impl DecodeOptions {
    /// Default options: detect everything, decode everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the tag orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Force the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Set how many records detection looks at per orientation.
    #[must_use]
    pub fn with_detection_window(mut self, window: usize) -> Self {
        self.detection_window = window;
        self
    }

    /// Switch terrain chunk decoding on or off.
    #[must_use]
    pub fn with_terrain(mut self, enabled: bool) -> Self {
        self.decode_terrain = enabled;
        self
    }

    /// Switch liquid decoding on or off.
    #[must_use]
    pub fn with_liquids(mut self, enabled: bool) -> Self {
        self.decode_liquids = enabled;
        self
    }
}
