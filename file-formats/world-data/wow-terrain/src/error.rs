//! Error types for map container and terrain chunk decoding.
//!
//! Decoding never aborts a whole buffer because one record is damaged. Errors are
//! fatal only to the smallest record that contains them:
//!
//! - A top-level record that fails becomes a [`RecordError`] on the decoded map.
//! - A terrain sub-record that fails becomes a [`FieldError`] on its terrain chunk,
//!   and the chunk keeps every other field.
//! - A liquid instance that fails becomes a [`LiquidError`] next to its siblings.
//!
//! # Error Kinds
//!
//! - [`DecodeError::OutOfBounds`] - a read or slice would leave the buffer
//! - [`DecodeError::TruncatedHeader`] - payload shorter than a fixed-size header
//! - [`DecodeError::UnrecognizedLayout`] - payload shape matches no known layout
//! - [`DecodeError::MalformedRunLength`] - alpha stream ended before 4096 samples
//! - [`DecodeError::InvalidRecordSize`] - fixed-format payload has the wrong size
//! - [`DecodeError::InvalidMagic`] - a header offset points at a different tag
//! - [`DecodeError::Binrw`] - fixed record rejected by the binary reader

use thiserror::Error;

use crate::chunk_id::ChunkId;
use crate::terrain::TerrainField;

/// Result type alias using [`DecodeError`] as the error type.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while decoding map containers and their records.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// A read or slice would exceed the buffer it operates on.
    ///
    /// Always detected before any memory is touched.
    #[error("Read of {len} bytes at offset {offset} exceeds buffer of {available} bytes")]
    OutOfBounds {
        /// Start of the attempted read.
        offset: usize,
        /// Number of bytes requested.
        len: usize,
        /// Length of the buffer.
        available: usize,
    },

    /// Payload is shorter than the fixed-size header it must start with.
    ///
    /// Fatal for the record only.
    #[error("Truncated {tag} header: expected at least {expected} bytes, got {actual}")]
    TruncatedHeader {
        /// Record whose header is short.
        tag: ChunkId,
        /// Minimum header size in bytes.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Payload does not match any layout known for its record kind.
    ///
    /// Downgrades the affected field to absent or unknown.
    #[error("Unrecognized {tag} layout: {detail}")]
    UnrecognizedLayout {
        /// Record with the unknown layout.
        tag: ChunkId,
        /// What did not match.
        detail: String,
    },

    /// Alpha map run-length stream ran out of input before the grid was full.
    ///
    /// The decoded grid is still returned, zero-padded after `produced` samples.
    #[error("Run-length stream ended after {produced} samples ({consumed} input bytes)")]
    MalformedRunLength {
        /// Samples written before input ran out.
        produced: usize,
        /// Input bytes consumed.
        consumed: usize,
    },

    /// Fixed-format payload has a size that does not match its layout.
    #[error("Invalid {tag} size: expected {expected} bytes, got {actual}")]
    InvalidRecordSize {
        /// Record with the wrong size.
        tag: ChunkId,
        /// Size the layout requires.
        expected: usize,
        /// Size found.
        actual: usize,
    },

    /// A header offset lands on a record with an unexpected tag.
    #[error("Invalid magic: expected {expected}, found {found} at offset {offset}")]
    InvalidMagic {
        /// Tag the header offset should point at.
        expected: ChunkId,
        /// Tag actually found.
        found: ChunkId,
        /// Payload offset of the record.
        offset: usize,
    },

    /// Binary reader error for fixed-layout records.
    #[error("Binary parse error: {0}")]
    Binrw(#[from] binrw::Error),
}

impl DecodeError {
    /// Whether the error only downgrades a field instead of discarding a record.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedLayout { .. } | Self::MalformedRunLength { .. }
        )
    }
}

/// A terrain sub-record that failed while the rest of its chunk decoded.
#[derive(Debug)]
pub struct FieldError {
    /// Which field failed.
    pub field: TerrainField,
    /// Why it failed.
    pub error: DecodeError,
}

/// A liquid instance that failed inside the modern liquid table.
#[derive(Debug)]
pub struct LiquidError {
    /// Terrain chunk index (0..256).
    pub chunk: usize,
    /// Instance index within the chunk, `None` when the chunk header itself failed.
    pub layer: Option<usize>,
    /// Why it failed.
    pub error: DecodeError,
}

/// A top-level record that could not be decoded.
#[derive(Debug)]
pub struct RecordError {
    /// Tag of the failing record.
    pub tag: ChunkId,
    /// Buffer offset of the record header.
    pub offset: u32,
    /// Why it failed.
    pub error: DecodeError,
}
