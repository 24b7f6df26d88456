//! Bounds-checked little-endian reads over a borrowed buffer.
//!
//! Every offset computation in the crate goes through [`ByteCursor`]. Reads
//! validate `offset + size <= len` with checked arithmetic first, so a hostile
//! offset produces [`DecodeError::OutOfBounds`] instead of a panic.

use std::io::Cursor;

use binrw::BinRead;

use crate::error::{DecodeError, Result};

/// Records with a fixed on-disk size, read through [`ByteCursor::read_record`].
pub trait FixedSize {
    /// Size in bytes.
    const SIZE: usize;
}

/// Random-access reader over an immutable byte slice.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    /// Wrap a buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => Ok(&self.data[offset..end]),
            None => Err(DecodeError::OutOfBounds {
                offset,
                len,
                available: self.data.len(),
            }),
        }
    }

    /// Borrow up to `len` bytes starting at `offset`, stopping at the end of the buffer.
    ///
    /// Only `offset` itself must be in bounds.
    pub fn slice_clamped(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        if offset > self.data.len() {
            return Err(DecodeError::OutOfBounds {
                offset,
                len,
                available: self.data.len(),
            });
        }
        let end = offset.saturating_add(len).min(self.data.len());
        Ok(&self.data[offset..end])
    }

    /// Everything from `offset` to the end of the buffer.
    pub fn tail(&self, offset: usize) -> Result<&'a [u8]> {
        self.slice_clamped(offset, usize::MAX)
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let bytes = self.slice(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a `u8`.
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&self, offset: usize) -> Result<i8> {
        Ok(i8::from_le_bytes(self.array(offset)?))
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array(offset)?))
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array(offset)?))
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array(offset)?))
    }

    /// Read a little-endian `f32`.
    pub fn read_f32(&self, offset: usize) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array(offset)?))
    }

    /// Read four raw bytes, as used for tags.
    pub fn read_tag_bytes(&self, offset: usize) -> Result<[u8; 4]> {
        self.array(offset)
    }

    /// Read `N` consecutive little-endian `f32` values.
    pub fn read_f32_array<const N: usize>(&self, offset: usize) -> Result<[f32; N]> {
        let bytes = self.slice(offset, N * 4)?;
        let mut out = [0.0f32; N];
        for (value, raw) in out.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
        Ok(out)
    }

    /// Read `count` little-endian `u32` values.
    pub fn read_u32_vec(&self, offset: usize, count: usize) -> Result<Vec<u32>> {
        let len = count.checked_mul(4).ok_or(DecodeError::OutOfBounds {
            offset,
            len: usize::MAX,
            available: self.data.len(),
        })?;
        let bytes = self.slice(offset, len)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|raw| u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            .collect())
    }

    /// Read a fixed-layout record with binrw after bounds-checking its span.
    pub fn read_record<T>(&self, offset: usize) -> Result<T>
    where
        T: BinRead + FixedSize,
        for<'b> T::Args<'b>: Default,
    {
        let bytes = self.slice(offset, T::SIZE)?;
        Ok(T::read_le(&mut Cursor::new(bytes))?)
    }

    /// Read as many whole records as fit in the buffer from `offset` on.
    ///
    /// Returns the records plus the number of trailing bytes that did not form a
    /// complete record.
    pub fn read_records<T>(&self, offset: usize) -> Result<(Vec<T>, usize)>
    where
        T: BinRead + FixedSize,
        for<'b> T::Args<'b>: Default,
    {
        let tail = self.tail(offset)?;
        let count = tail.len() / T::SIZE;
        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            records.push(self.read_record(offset + index * T::SIZE)?);
        }
        Ok((records, tail.len() % T::SIZE))
    }
}
