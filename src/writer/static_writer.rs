use super::BinaryWrite;
use crate::error::{check, enforce, EncodingError, Reason, Result};
use alloc::vec;
use alloc::vec::Vec;

/// A writer over a buffer allocated up front.
///
/// Writes past the end fail with [`Reason::OutOfBoundsWrite`]. `render` fails with
/// [`Reason::SizeMismatch`] unless exactly `size` bytes were written, which catches size
/// calculations that disagree with what was actually encoded.
#[derive(Clone, Debug)]
pub struct StaticWriter {
    data: Vec<u8>,
    offset: usize,
}

impl StaticWriter {
    /// Allocates a zero-filled buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            offset: 0,
        }
    }

    /// Size of the buffer.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The bytes written so far.
    pub fn slice(&self) -> &[u8] {
        &self.data[..self.offset]
    }
}

impl BinaryWrite for StaticWriter {
    type Output = Vec<u8>;

    fn offset(&self) -> usize {
        self.offset
    }

    fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        check(
            self.data.len(),
            self.offset,
            bytes.len(),
            Reason::OutOfBoundsWrite,
            "put_slice",
        )?;
        self.data[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
        Ok(())
    }

    fn render(&mut self) -> Result<Vec<u8>> {
        enforce(
            self.offset == self.data.len(),
            self.offset,
            Reason::SizeMismatch,
            "render",
        )?;
        self.offset = 0;
        Ok(core::mem::take(&mut self.data))
    }

    fn destroy(&mut self) {
        self.data = Vec::new();
        self.offset = 0;
    }

    fn written(&self) -> Option<&[u8]> {
        Some(self.slice())
    }

    fn seek(&mut self, delta: isize) -> Result<&mut Self> {
        self.offset = self
            .offset
            .checked_add_signed(delta)
            .filter(|&target| target <= self.data.len())
            .ok_or(EncodingError::new(self.offset, Reason::OutOfBoundsWrite, "seek"))?;
        Ok(self)
    }
}
