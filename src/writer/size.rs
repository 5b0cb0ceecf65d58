use super::BinaryWrite;
use crate::error::{EncodingError, Reason, Result};
use crate::text::Encoding;

/// A writer that only counts bytes.
///
/// Nothing is stored, so encoding a value through a `SizeWriter` gives its exact size
/// without allocating. `render` returns the count and resets it.
#[derive(Copy, Clone, Debug, Default)]
pub struct SizeWriter {
    size: usize,
}

impl SizeWriter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BinaryWrite for SizeWriter {
    type Output = usize;

    fn offset(&self) -> usize {
        self.size
    }

    fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.size += bytes.len();
        Ok(())
    }

    fn put_str(&mut self, s: &str, enc: Encoding) -> Result<()> {
        let len = enc
            .byte_len(s)
            .map_err(|reason| EncodingError::new(self.size, reason, "write_string"))?;
        self.size += len;
        Ok(())
    }

    fn put_fill(&mut self, _value: u8, size: usize) -> Result<()> {
        self.size += size;
        Ok(())
    }

    fn render(&mut self) -> Result<usize> {
        Ok(core::mem::take(&mut self.size))
    }

    fn destroy(&mut self) {
        self.size = 0;
    }

    /// Adjusts the count by `delta`. The count cannot go below zero.
    fn seek(&mut self, delta: isize) -> Result<&mut Self> {
        self.size = self
            .size
            .checked_add_signed(delta)
            .ok_or(EncodingError::new(self.size, Reason::OutOfBoundsWrite, "seek"))?;
        Ok(self)
    }
}
