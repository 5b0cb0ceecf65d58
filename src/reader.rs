use crate::bytes::{self, HASH_SIZE};
use crate::error::{check, enforce, EncodingError, Reason, Result};
use crate::fixed::{self, Endian};
use crate::text::Encoding;
use crate::varint;
use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

/// Reads values from a slice of bytes.
///
/// The reader keeps an offset into `data` and advances it by the width of each value it
/// decodes. Every `read_*` method checks that enough bytes remain before touching the input,
/// so a failed read leaves the offset where it was.
///
/// Byte strings are returned as `Cow<'a, [u8]>`. In zero-copy mode they borrow from the
/// source slice; otherwise each one is copied into its own `Vec<u8>`, which lets the caller
/// drop the source buffer early.
///
/// Spans measure what was consumed between two points: [`start`](Self::start) pushes the
/// current offset, [`end`](Self::end) or [`end_data`](Self::end_data) pops it. Checksums are
/// computed over the innermost open span, or from the start of the buffer if none is open.
#[derive(Clone, Debug)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    offset: usize,
    stack: Vec<usize>,
    zero_copy: bool,
}

// Each entry expands to a method that decodes one fixed-width value with `fixed::$f` and
// advances past it.
macro_rules! fixed_reads {
    ($($(#[$meta:meta])* $name:ident -> $ty:ty = $f:ident($width:literal, $endian:ident);)*) => {
        $(
            $(#[$meta])*
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                let value = fixed::$f(self.data, self.offset, $width, Endian::$endian)?;
                self.offset += $width;
                Ok(value as $ty)
            }
        )*
    };
}

impl<'a> BinaryReader<'a> {
    /// Constructor. With `zero_copy` set, byte strings borrow from `data` instead of being
    /// copied.
    pub fn new(data: &'a [u8], zero_copy: bool) -> Self {
        Self {
            data,
            offset: 0,
            stack: Vec::new(),
            zero_copy,
        }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the input.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes left to read.
    pub fn left(&self) -> usize {
        self.data.len() - self.offset
    }

    /// The bytes that have not been read yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    /// Returns `true` if byte strings borrow from the input.
    pub fn is_zero_copy(&self) -> bool {
        self.zero_copy
    }

    /// Fails unless at least `size` bytes remain.
    pub fn check(&self, size: usize) -> Result<()> {
        check(self.data.len(), self.offset, size, Reason::OutOfBoundsRead, "check")
    }

    /// Moves the offset by `delta` bytes in either direction and returns the new offset.
    pub fn seek(&mut self, delta: isize) -> Result<usize> {
        let target = self
            .offset
            .checked_add_signed(delta)
            .filter(|&target| target <= self.data.len())
            .ok_or(EncodingError::new(self.offset, Reason::OutOfBoundsRead, "seek"))?;
        self.offset = target;
        Ok(target)
    }

    /// Opens a span at the current offset and returns that offset.
    pub fn start(&mut self) -> usize {
        self.stack.push(self.offset);
        self.offset
    }

    /// Closes the innermost span and returns how many bytes were consumed since it opened.
    pub fn end(&mut self) -> Result<usize> {
        let start = self.pop_span("end")?;
        Ok(self.offset.saturating_sub(start))
    }

    /// Closes the innermost span and returns the bytes consumed since it opened.
    pub fn end_data(&mut self) -> Result<Cow<'a, [u8]>> {
        const OP: &str = "end_data";
        let start = self.pop_span(OP)?;
        let Some(span) = self.data.get(start..self.offset) else {
            return Err(EncodingError::new(start, Reason::OutOfBoundsRead, OP));
        };
        Ok(self.share(span))
    }

    fn pop_span(&mut self, op: &'static str) -> Result<usize> {
        self.stack
            .pop()
            .ok_or(EncodingError::new(self.offset, Reason::NoOpenSpan, op))
    }

    /// Drops the reference to the input and resets all state.
    pub fn destroy(&mut self) {
        self.data = &[];
        self.offset = 0;
        self.stack.clear();
    }

    fn share(&self, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        if self.zero_copy {
            Cow::Borrowed(bytes)
        } else {
            Cow::Owned(bytes.to_vec())
        }
    }

    fn take(&mut self, size: usize, op: &'static str) -> Result<&'a [u8]> {
        check(self.data.len(), self.offset, size, Reason::OutOfBoundsRead, op)?;
        let bytes = &self.data[self.offset..self.offset + size];
        self.offset += size;
        Ok(bytes)
    }

    fixed_reads! {
        /// Reads a `u8`.
        read_u8 -> u8 = read_u(1, Little);
        /// Reads a little-endian `u16`.
        read_u16 -> u16 = read_u(2, Little);
        /// Reads a big-endian `u16`.
        read_u16_be -> u16 = read_u(2, Big);
        /// Reads a little-endian 24-bit unsigned integer.
        read_u24 -> u32 = read_u(3, Little);
        /// Reads a big-endian 24-bit unsigned integer.
        read_u24_be -> u32 = read_u(3, Big);
        /// Reads a little-endian `u32`.
        read_u32 -> u32 = read_u(4, Little);
        /// Reads a big-endian `u32`.
        read_u32_be -> u32 = read_u(4, Big);
        /// Reads a little-endian 40-bit unsigned integer.
        read_u40 -> u64 = read_u(5, Little);
        /// Reads a big-endian 40-bit unsigned integer.
        read_u40_be -> u64 = read_u(5, Big);
        /// Reads a little-endian 48-bit unsigned integer.
        read_u48 -> u64 = read_u(6, Little);
        /// Reads a big-endian 48-bit unsigned integer.
        read_u48_be -> u64 = read_u(6, Big);
        /// Reads a little-endian 56-bit unsigned integer. Fails if it exceeds 2^53-1.
        read_u56 -> u64 = read_u(7, Little);
        /// Reads a big-endian 56-bit unsigned integer. Fails if it exceeds 2^53-1.
        read_u56_be -> u64 = read_u(7, Big);
        /// Reads a little-endian `u64`. Fails if it exceeds 2^53-1.
        read_u64 -> u64 = read_u(8, Little);
        /// Reads a big-endian `u64`. Fails if it exceeds 2^53-1.
        read_u64_be -> u64 = read_u(8, Big);

        /// Reads an `i8`.
        read_i8 -> i8 = read_i(1, Little);
        /// Reads a little-endian `i16`.
        read_i16 -> i16 = read_i(2, Little);
        /// Reads a big-endian `i16`.
        read_i16_be -> i16 = read_i(2, Big);
        /// Reads a little-endian 24-bit signed integer.
        read_i24 -> i32 = read_i(3, Little);
        /// Reads a big-endian 24-bit signed integer.
        read_i24_be -> i32 = read_i(3, Big);
        /// Reads a little-endian `i32`.
        read_i32 -> i32 = read_i(4, Little);
        /// Reads a big-endian `i32`.
        read_i32_be -> i32 = read_i(4, Big);
        /// Reads a little-endian 40-bit signed integer.
        read_i40 -> i64 = read_i(5, Little);
        /// Reads a big-endian 40-bit signed integer.
        read_i40_be -> i64 = read_i(5, Big);
        /// Reads a little-endian 48-bit signed integer.
        read_i48 -> i64 = read_i(6, Little);
        /// Reads a big-endian 48-bit signed integer.
        read_i48_be -> i64 = read_i(6, Big);
        /// Reads a little-endian 56-bit signed integer. Fails if its magnitude exceeds 2^53-1.
        read_i56 -> i64 = read_i(7, Little);
        /// Reads a big-endian 56-bit signed integer. Fails if its magnitude exceeds 2^53-1.
        read_i56_be -> i64 = read_i(7, Big);
        /// Reads a little-endian `i64`. Fails if its magnitude exceeds 2^53-1.
        read_i64 -> i64 = read_i(8, Little);
        /// Reads a big-endian `i64`. Fails if its magnitude exceeds 2^53-1.
        read_i64_be -> i64 = read_i(8, Big);

        /// Reads a little-endian `u64` over its full range.
        read_big_u64 -> u64 = read_big_u(8, Little);
        /// Reads a big-endian `u64` over its full range.
        read_big_u64_be -> u64 = read_big_u(8, Big);
        /// Reads a little-endian `i64` over its full range.
        read_big_i64 -> i64 = read_big_i(8, Little);
        /// Reads a big-endian `i64` over its full range.
        read_big_i64_be -> i64 = read_big_i(8, Big);
    }

    /// Reads an unsigned integer of any width from 1 to 8 bytes.
    pub fn read_uint(&mut self, width: usize, endian: Endian) -> Result<u64> {
        let value = fixed::read_u(self.data, self.offset, width, endian)?;
        self.offset += width;
        Ok(value)
    }

    /// Reads a signed integer of any width from 1 to 8 bytes.
    pub fn read_int(&mut self, width: usize, endian: Endian) -> Result<i64> {
        let value = fixed::read_i(self.data, self.offset, width, endian)?;
        self.offset += width;
        Ok(value)
    }

    /// Reads a little-endian IEEE-754 single.
    pub fn read_f32(&mut self) -> Result<f32> {
        let value = fixed::read_f32(self.data, self.offset, Endian::Little)?;
        self.offset += 4;
        Ok(value)
    }

    /// Reads a big-endian IEEE-754 single.
    pub fn read_f32_be(&mut self) -> Result<f32> {
        let value = fixed::read_f32(self.data, self.offset, Endian::Big)?;
        self.offset += 4;
        Ok(value)
    }

    /// Reads a little-endian IEEE-754 double.
    pub fn read_f64(&mut self) -> Result<f64> {
        let value = fixed::read_f64(self.data, self.offset, Endian::Little)?;
        self.offset += 8;
        Ok(value)
    }

    /// Reads a big-endian IEEE-754 double.
    pub fn read_f64_be(&mut self) -> Result<f64> {
        let value = fixed::read_f64(self.data, self.offset, Endian::Big)?;
        self.offset += 8;
        Ok(value)
    }

    /// Reads a compact (Bitcoin-style) varint.
    pub fn read_varint(&mut self) -> Result<u64> {
        let varint = varint::read_varint(self.data, self.offset)?;
        self.offset += varint.size;
        Ok(varint.value)
    }

    /// Reads a bit-packed varint.
    pub fn read_varint2(&mut self) -> Result<u64> {
        let varint = varint::read_varint2(self.data, self.offset)?;
        self.offset += varint.size;
        Ok(varint.value)
    }

    /// Reads a small array of bytes, with a constant length.
    #[inline(always)]
    pub fn read_cbytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, "read_cbytes")?);
        Ok(out)
    }

    /// Reads `size` bytes.
    pub fn read_bytes(&mut self, size: usize) -> Result<Cow<'a, [u8]>> {
        let bytes = self.take(size, "read_bytes")?;
        Ok(self.share(bytes))
    }

    /// Reads bytes prefixed with their length as a compact varint. If `limit` is given, a
    /// payload longer than `limit` bytes fails with [`Reason::StringExceedsLimit`].
    pub fn read_var_bytes(&mut self, limit: Option<usize>) -> Result<Cow<'a, [u8]>> {
        let (bytes, end) = bytes::read_var_bytes(self.data, self.offset, limit)?;
        self.offset = end;
        Ok(self.share(bytes))
    }

    /// Returns a new reader over the next `size` bytes and skips past them. The child
    /// inherits the zero-copy setting.
    pub fn read_child(&mut self, size: usize) -> Result<BinaryReader<'a>> {
        let bytes = self.take(size, "read_child")?;
        Ok(BinaryReader::new(bytes, self.zero_copy))
    }

    /// Reads `size` bytes and decodes them as a string.
    pub fn read_string(&mut self, size: usize, enc: Encoding) -> Result<String> {
        let s = bytes::read_string(self.data, self.offset, size, enc)?;
        self.offset += size;
        Ok(s)
    }

    /// Reads a length-prefixed string. If `limit` is given, a payload longer than `limit`
    /// bytes fails with [`Reason::StringExceedsLimit`].
    pub fn read_var_string(&mut self, enc: Encoding, limit: Option<usize>) -> Result<String> {
        let (payload, end) = bytes::read_var_bytes(self.data, self.offset, limit)?;
        let s = enc
            .decode(payload)
            .map_err(|reason| EncodingError::new(self.offset, reason, "read_var_string"))?;
        self.offset = end;
        Ok(s)
    }

    /// Reads a string terminated by a zero byte and skips past the terminator.
    pub fn read_null_string(&mut self, enc: Encoding) -> Result<String> {
        let (s, end) = bytes::read_null_string(self.data, self.offset, enc)?;
        self.offset = end;
        Ok(s)
    }

    /// Reads a 32-byte hash.
    pub fn read_hash(&mut self) -> Result<[u8; HASH_SIZE]> {
        self.read_cbytes()
    }

    /// Reads a 32-byte hash and returns it as lowercase hex.
    pub fn read_hash_hex(&mut self) -> Result<String> {
        Ok(hex::encode(self.read_hash()?))
    }

    /// Reads `size` bytes as a `bstr::BStr`. This always borrows from the input.
    #[cfg(feature = "bstr")]
    pub fn read_bstr(&mut self, size: usize) -> Result<&'a bstr::BStr> {
        Ok(bstr::BStr::new(self.take(size, "read_bstr")?))
    }

    /// Reads a length-prefixed byte string as a `bstr::BStr`. This always borrows from the
    /// input.
    #[cfg(feature = "bstr")]
    pub fn read_var_bstr(&mut self, limit: Option<usize>) -> Result<&'a bstr::BStr> {
        let (bytes, end) = bytes::read_var_bytes(self.data, self.offset, limit)?;
        self.offset = end;
        Ok(bstr::BStr::new(bytes))
    }

    /// Hashes the bytes consumed since the innermost open span (or since the start of the
    /// input) and returns the first four bytes of the digest as a little-endian `u32`.
    pub fn create_checksum<F, H>(&self, hash: F) -> Result<u32>
    where
        F: FnOnce(&[u8]) -> H,
        H: AsRef<[u8]>,
    {
        const OP: &str = "create_checksum";
        let start = self.stack.last().copied().unwrap_or(0);
        let Some(covered) = self.data.get(start..self.offset) else {
            return Err(EncodingError::new(start, Reason::OutOfBoundsRead, OP));
        };
        let digest = hash(covered);
        let checksum = fixed::read_u(digest.as_ref(), 0, 4, Endian::Little)
            .map_err(|_| EncodingError::new(self.offset, Reason::InvalidHash, OP))?;
        Ok(checksum as u32)
    }

    /// Computes the checksum as [`create_checksum`](Self::create_checksum) does, reads the
    /// stored checksum that follows, and fails with [`Reason::ChecksumMismatch`] if they
    /// differ.
    pub fn verify_checksum<F, H>(&mut self, hash: F) -> Result<u32>
    where
        F: FnOnce(&[u8]) -> H,
        H: AsRef<[u8]>,
    {
        let checksum = self.create_checksum(hash)?;
        let expected = self.read_u32()?;
        enforce(
            checksum == expected,
            self.offset,
            Reason::ChecksumMismatch,
            "verify_checksum",
        )?;
        Ok(checksum)
    }
}
