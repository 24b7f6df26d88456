//! Alpha map (texture blend weight) codec.
//!
//! Every texture layer above the base layer blends through a 64×64 grid of byte
//! weights. On disk a grid is stored in one of three forms:
//!
//! - **Uncompressed 8-bit**: 4096 bytes, one per sample.
//! - **Uncompressed 4-bit**: 2048 bytes, two samples per byte, low nibble first.
//!   Each nibble is scaled by 16.
//! - **Run-length compressed**: a stream of control bytes. Bit 7 selects the mode,
//!   bits 0-6 hold the count.
//!
//! ```text
//! Control | Mode | Followed by
//! --------|------|--------------------------------------------
//! 1nnnnnn | fill | one byte, repeated n times
//! 0nnnnnn | copy | n bytes, copied verbatim
//! ```
//!
//! Decoding always yields exactly 4096 samples. A stream that ends early leaves
//! the rest of the grid zero and reports [`DecodeError::MalformedRunLength`].
//!
//! Reference: <https://wowdev.wiki/ADT/v18#MCAL_sub-chunk>

use crate::chunk_id::ChunkId;
use crate::error::DecodeError;

/// Width and height of an alpha grid.
pub const ALPHA_MAP_SIDE: usize = 64;

/// Samples in an alpha grid.
pub const ALPHA_MAP_SIZE: usize = ALPHA_MAP_SIDE * ALPHA_MAP_SIDE;

/// Bytes in a 4-bit packed grid.
pub const PACKED_4BIT_SIZE: usize = ALPHA_MAP_SIZE / 2;

/// Longest run a single control byte can describe.
const MAX_RUN: usize = 0x7F;

/// Shortest run the encoder emits as a fill.
const MIN_FILL_RUN: usize = 2;

const FILL_FLAG: u8 = 0x80;

/// Fully expanded 64×64 blend weights, row-major.
pub type AlphaGrid = [u8; ALPHA_MAP_SIZE];

/// Stateless encoder and decoder for alpha grids.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaMapCodec;

impl AlphaMapCodec {
    /// Decode a layer's alpha payload into a full grid.
    ///
    /// Total over any input: short or malformed payloads yield a zero-padded grid.
    pub fn decode(payload: &[u8], compressed: bool, fix_edges: bool) -> AlphaGrid {
        Self::decode_checked(payload, compressed, fix_edges).0
    }

    /// Decode a layer's alpha payload, also reporting anything that went wrong.
    ///
    /// The grid is usable even when an error is returned next to it.
    pub fn decode_checked(
        payload: &[u8],
        compressed: bool,
        fix_edges: bool,
    ) -> (AlphaGrid, Option<DecodeError>) {
        let mut grid = [0u8; ALPHA_MAP_SIZE];

        let issue = if compressed {
            Self::expand_runs(payload, &mut grid)
        } else if payload.len() >= ALPHA_MAP_SIZE {
            grid.copy_from_slice(&payload[..ALPHA_MAP_SIZE]);
            None
        } else {
            Self::unpack_4bit(payload, &mut grid);
            (payload.len() != PACKED_4BIT_SIZE).then(|| DecodeError::UnrecognizedLayout {
                tag: ChunkId::MCAL,
                detail: format!(
                    "uncompressed alpha map of {} bytes (expected {PACKED_4BIT_SIZE} or {ALPHA_MAP_SIZE})",
                    payload.len()
                ),
            })
        };

        if fix_edges {
            Self::fix_edges(&mut grid);
        }

        (grid, issue)
    }

    /// Run-length encode a grid.
    ///
    /// Runs of two or more equal samples become fills, everything else copies.
    pub fn encode(grid: &AlphaGrid) -> Vec<u8> {
        let mut out = Vec::with_capacity(ALPHA_MAP_SIZE / 4);
        let mut i = 0;

        while i < grid.len() {
            let run = run_length(grid, i);
            if run >= MIN_FILL_RUN {
                out.push(FILL_FLAG | run as u8);
                out.push(grid[i]);
                i += run;
                continue;
            }

            let start = i;
            while i < grid.len() && i - start < MAX_RUN && run_length(grid, i) < MIN_FILL_RUN {
                i += 1;
            }
            out.push((i - start) as u8);
            out.extend_from_slice(&grid[start..i]);
        }

        out
    }

    /// Pack a grid into 4-bit samples, dropping the low nibble of each weight.
    pub fn pack_4bit(grid: &AlphaGrid) -> Vec<u8> {
        grid.chunks_exact(2)
            .map(|pair| (pair[0] >> 4) | (pair[1] & 0xF0))
            .collect()
    }

    /// Replicate the second-to-last row and column over the last ones.
    ///
    /// Chunks without the "do not fix alpha map" flag only carry 63×63 meaningful
    /// samples; the client copies row 62 to 63 and column 62 to 63.
    pub fn fix_edges(grid: &mut AlphaGrid) {
        for row in grid.chunks_exact_mut(ALPHA_MAP_SIDE) {
            row[ALPHA_MAP_SIDE - 1] = row[ALPHA_MAP_SIDE - 2];
        }
        let last = (ALPHA_MAP_SIDE - 1) * ALPHA_MAP_SIDE;
        let previous = (ALPHA_MAP_SIDE - 2) * ALPHA_MAP_SIDE;
        grid.copy_within(previous..previous + ALPHA_MAP_SIDE, last);
    }

    fn unpack_4bit(payload: &[u8], grid: &mut AlphaGrid) {
        for (pair, byte) in grid.chunks_exact_mut(2).zip(payload) {
            pair[0] = (byte & 0x0F) * 16;
            pair[1] = (byte >> 4) * 16;
        }
    }

    fn expand_runs(payload: &[u8], grid: &mut AlphaGrid) -> Option<DecodeError> {
        let mut produced = 0;
        let mut consumed = 0;

        while produced < ALPHA_MAP_SIZE && consumed < payload.len() {
            let control = payload[consumed];
            consumed += 1;
            let count = usize::from(control & 0x7F).min(ALPHA_MAP_SIZE - produced);

            if control & FILL_FLAG != 0 {
                let Some(&value) = payload.get(consumed) else {
                    break;
                };
                consumed += 1;
                grid[produced..produced + count].fill(value);
                produced += count;
            } else {
                let available = count.min(payload.len() - consumed);
                grid[produced..produced + available]
                    .copy_from_slice(&payload[consumed..consumed + available]);
                produced += available;
                consumed += available;
                if available < count {
                    break;
                }
            }
        }

        (produced < ALPHA_MAP_SIZE).then(|| {
            log::debug!("Alpha stream ended after {produced} samples");
            DecodeError::MalformedRunLength { produced, consumed }
        })
    }
}

fn run_length(grid: &[u8], start: usize) -> usize {
    let value = grid[start];
    grid[start..]
        .iter()
        .take(MAX_RUN)
        .take_while(|&&sample| sample == value)
        .count()
}
