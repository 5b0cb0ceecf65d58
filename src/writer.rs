use crate::bytes::{self, HASH_SIZE};
use crate::error::{enforce, EncodingError, Reason, Result};
use crate::fixed::{self, Endian};
use crate::text::Encoding;
use crate::varint;
use alloc::vec::Vec;

mod digest;
mod size;
mod static_writer;

pub use digest::{Digest, DigestWriter};
pub use size::SizeWriter;
pub use static_writer::StaticWriter;

/// Widening of a typed argument to the `i64` taken by `fixed::write_u`/`fixed::write_i`.
/// Only `u64` can fail.
trait ToI64: Copy {
    fn to_i64(self) -> Option<i64>;
}

macro_rules! lossless_to_i64 {
    ($($ty:ty),*) => {
        $(
            impl ToI64 for $ty {
                fn to_i64(self) -> Option<i64> {
                    Some(self.into())
                }
            }
        )*
    };
}

lossless_to_i64!(u8, u16, u32, i8, i16, i32);

impl ToI64 for i64 {
    fn to_i64(self) -> Option<i64> {
        Some(self)
    }
}

impl ToI64 for u64 {
    fn to_i64(self) -> Option<i64> {
        i64::try_from(self).ok()
    }
}

// Each entry expands to a provided method that encodes one fixed-width value into scratch
// space with `fixed::$f` and appends it.
macro_rules! fixed_writes {
    ($($(#[$meta:meta])* $name:ident($ty:ty) = $f:ident($width:literal, $endian:ident);)*) => {
        $(
            $(#[$meta])*
            fn $name(&mut self, value: $ty) -> Result<&mut Self> {
                let Some(value) = ToI64::to_i64(value) else {
                    return Err(EncodingError::new(
                        self.offset(),
                        Reason::NumberTooLarge,
                        stringify!($name),
                    ));
                };
                let mut scratch = [0u8; 8];
                fixed::$f(&mut scratch, value, 0, $width, Endian::$endian)
                    .map_err(|e| e.shift(self.offset()))?;
                self.put_slice(&scratch[..$width])?;
                Ok(self)
            }
        )*
    };
}

/// The contract shared by every writer.
///
/// An implementation supplies a place for bytes to go ([`put_slice`](Self::put_slice)) and
/// a way to finish ([`render`](Self::render)). The `write_*` methods are built on top of
/// those and return the writer itself, so calls can be chained:
///
/// ```
/// use binary_cursor::{BinaryWrite, BinaryWriter};
///
/// let mut w = BinaryWriter::new();
/// w.write_u8(1)?.write_u16_be(0x0203)?.write_varint(4)?;
/// assert_eq!(w.render()?, [1, 2, 3, 4]);
/// # Ok::<(), binary_cursor::EncodingError>(())
/// ```
///
/// Every write advances [`offset`](Self::offset) by exactly the number of bytes the value
/// occupies. Operations a writer cannot support fail with [`Reason::Unsupported`].
pub trait BinaryWrite {
    /// What [`render`](Self::render) produces.
    type Output;

    /// Number of bytes written so far (or the current position, after a seek).
    fn offset(&self) -> usize;

    /// Appends raw bytes.
    fn put_slice(&mut self, bytes: &[u8]) -> Result<()>;

    /// Finishes writing and returns the result. The writer is reset afterwards.
    fn render(&mut self) -> Result<Self::Output>;

    /// Drops any buffered output and resets the writer.
    fn destroy(&mut self);

    /// Everything written so far, if this writer keeps it.
    fn written(&self) -> Option<&[u8]> {
        None
    }

    /// Appends `s` in encoding `enc`.
    fn put_str(&mut self, s: &str, enc: Encoding) -> Result<()> {
        let bytes = enc
            .encode(s)
            .map_err(|reason| EncodingError::new(self.offset(), reason, "write_string"))?;
        self.put_slice(&bytes)
    }

    /// Appends `size` copies of `value`.
    fn put_fill(&mut self, value: u8, size: usize) -> Result<()> {
        let chunk = [value; 64];
        let mut left = size;
        while left > 0 {
            let n = left.min(chunk.len());
            self.put_slice(&chunk[..n])?;
            left -= n;
        }
        Ok(())
    }

    /// Moves the position by `delta` bytes.
    fn seek(&mut self, _delta: isize) -> Result<&mut Self> {
        Err(EncodingError::new(self.offset(), Reason::Unsupported, "seek"))
    }

    fixed_writes! {
        /// Writes a `u8`.
        write_u8(u8) = write_u(1, Little);
        /// Writes a little-endian `u16`.
        write_u16(u16) = write_u(2, Little);
        /// Writes a big-endian `u16`.
        write_u16_be(u16) = write_u(2, Big);
        /// Writes the low 24 bits of `value`, little-endian.
        write_u24(u32) = write_u(3, Little);
        /// Writes the low 24 bits of `value`, big-endian.
        write_u24_be(u32) = write_u(3, Big);
        /// Writes a little-endian `u32`.
        write_u32(u32) = write_u(4, Little);
        /// Writes a big-endian `u32`.
        write_u32_be(u32) = write_u(4, Big);
        /// Writes a little-endian 40-bit unsigned integer. Fails above 2^53-1.
        write_u40(u64) = write_u(5, Little);
        /// Writes a big-endian 40-bit unsigned integer. Fails above 2^53-1.
        write_u40_be(u64) = write_u(5, Big);
        /// Writes a little-endian 48-bit unsigned integer. Fails above 2^53-1.
        write_u48(u64) = write_u(6, Little);
        /// Writes a big-endian 48-bit unsigned integer. Fails above 2^53-1.
        write_u48_be(u64) = write_u(6, Big);
        /// Writes a little-endian 56-bit unsigned integer. Fails above 2^53-1.
        write_u56(u64) = write_u(7, Little);
        /// Writes a big-endian 56-bit unsigned integer. Fails above 2^53-1.
        write_u56_be(u64) = write_u(7, Big);
        /// Writes a little-endian `u64`. Fails above 2^53-1.
        write_u64(u64) = write_u(8, Little);
        /// Writes a big-endian `u64`. Fails above 2^53-1.
        write_u64_be(u64) = write_u(8, Big);

        /// Writes an `i8`.
        write_i8(i8) = write_i(1, Little);
        /// Writes a little-endian `i16`.
        write_i16(i16) = write_i(2, Little);
        /// Writes a big-endian `i16`.
        write_i16_be(i16) = write_i(2, Big);
        /// Writes the low 24 bits of `value`, little-endian.
        write_i24(i32) = write_i(3, Little);
        /// Writes the low 24 bits of `value`, big-endian.
        write_i24_be(i32) = write_i(3, Big);
        /// Writes a little-endian `i32`.
        write_i32(i32) = write_i(4, Little);
        /// Writes a big-endian `i32`.
        write_i32_be(i32) = write_i(4, Big);
        /// Writes a little-endian 40-bit signed integer. Fails if the magnitude exceeds 2^53-1.
        write_i40(i64) = write_i(5, Little);
        /// Writes a big-endian 40-bit signed integer. Fails if the magnitude exceeds 2^53-1.
        write_i40_be(i64) = write_i(5, Big);
        /// Writes a little-endian 48-bit signed integer. Fails if the magnitude exceeds 2^53-1.
        write_i48(i64) = write_i(6, Little);
        /// Writes a big-endian 48-bit signed integer. Fails if the magnitude exceeds 2^53-1.
        write_i48_be(i64) = write_i(6, Big);
        /// Writes a little-endian 56-bit signed integer. Fails if the magnitude exceeds 2^53-1.
        write_i56(i64) = write_i(7, Little);
        /// Writes a big-endian 56-bit signed integer. Fails if the magnitude exceeds 2^53-1.
        write_i56_be(i64) = write_i(7, Big);
        /// Writes a little-endian `i64`. Fails if the magnitude exceeds 2^53-1.
        write_i64(i64) = write_i(8, Little);
        /// Writes a big-endian `i64`. Fails if the magnitude exceeds 2^53-1.
        write_i64_be(i64) = write_i(8, Big);
    }

    /// Writes `value` as an unsigned integer of `width` bytes. See [`fixed::write_u`].
    fn write_uint(&mut self, value: i64, width: usize, endian: Endian) -> Result<&mut Self> {
        let mut scratch = [0u8; 8];
        let end = fixed::write_u(&mut scratch, value, 0, width, endian)
            .map_err(|e| e.shift(self.offset()))?;
        self.put_slice(&scratch[..end])?;
        Ok(self)
    }

    /// Writes `value` as a signed integer of `width` bytes. See [`fixed::write_i`].
    fn write_int(&mut self, value: i64, width: usize, endian: Endian) -> Result<&mut Self> {
        let mut scratch = [0u8; 8];
        let end = fixed::write_i(&mut scratch, value, 0, width, endian)
            .map_err(|e| e.shift(self.offset()))?;
        self.put_slice(&scratch[..end])?;
        Ok(self)
    }

    /// Writes a little-endian `u64` over its full range.
    fn write_big_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.put_slice(&value.to_le_bytes())?;
        Ok(self)
    }

    /// Writes a big-endian `u64` over its full range.
    fn write_big_u64_be(&mut self, value: u64) -> Result<&mut Self> {
        self.put_slice(&value.to_be_bytes())?;
        Ok(self)
    }

    /// Writes a little-endian `i64` over its full range.
    fn write_big_i64(&mut self, value: i64) -> Result<&mut Self> {
        self.put_slice(&value.to_le_bytes())?;
        Ok(self)
    }

    /// Writes a big-endian `i64` over its full range.
    fn write_big_i64_be(&mut self, value: i64) -> Result<&mut Self> {
        self.put_slice(&value.to_be_bytes())?;
        Ok(self)
    }

    /// Writes a little-endian IEEE-754 single.
    fn write_f32(&mut self, value: f32) -> Result<&mut Self> {
        let mut scratch = [0u8; 4];
        fixed::write_f32(&mut scratch, value, 0, Endian::Little)?;
        self.put_slice(&scratch)?;
        Ok(self)
    }

    /// Writes a big-endian IEEE-754 single.
    fn write_f32_be(&mut self, value: f32) -> Result<&mut Self> {
        let mut scratch = [0u8; 4];
        fixed::write_f32(&mut scratch, value, 0, Endian::Big)?;
        self.put_slice(&scratch)?;
        Ok(self)
    }

    /// Writes a little-endian IEEE-754 double.
    fn write_f64(&mut self, value: f64) -> Result<&mut Self> {
        let mut scratch = [0u8; 8];
        fixed::write_f64(&mut scratch, value, 0, Endian::Little)?;
        self.put_slice(&scratch)?;
        Ok(self)
    }

    /// Writes a big-endian IEEE-754 double.
    fn write_f64_be(&mut self, value: f64) -> Result<&mut Self> {
        let mut scratch = [0u8; 8];
        fixed::write_f64(&mut scratch, value, 0, Endian::Big)?;
        self.put_slice(&scratch)?;
        Ok(self)
    }

    /// Writes a compact (Bitcoin-style) varint.
    fn write_varint(&mut self, value: u64) -> Result<&mut Self> {
        let mut scratch = [0u8; 9];
        let end =
            varint::write_varint(&mut scratch, value, 0).map_err(|e| e.shift(self.offset()))?;
        self.put_slice(&scratch[..end])?;
        Ok(self)
    }

    /// Writes a bit-packed varint.
    fn write_varint2(&mut self, value: u64) -> Result<&mut Self> {
        let mut scratch = [0u8; varint::MAX_VARINT2_SIZE];
        let end =
            varint::write_varint2(&mut scratch, value, 0).map_err(|e| e.shift(self.offset()))?;
        self.put_slice(&scratch[..end])?;
        Ok(self)
    }

    /// Writes raw bytes.
    fn write_bytes(&mut self, value: &[u8]) -> Result<&mut Self> {
        self.put_slice(value)?;
        Ok(self)
    }

    /// Writes bytes prefixed with their length as a compact varint.
    fn write_var_bytes(&mut self, value: &[u8]) -> Result<&mut Self> {
        self.write_varint(value.len() as u64)?;
        self.put_slice(value)?;
        Ok(self)
    }

    /// Writes `value` in encoding `enc`. An empty string writes nothing.
    fn write_string(&mut self, value: &str, enc: Encoding) -> Result<&mut Self> {
        if !value.is_empty() {
            self.put_str(value, enc)?;
        }
        Ok(self)
    }

    /// Writes `value` in encoding `enc`, prefixed with its encoded length as a compact varint.
    fn write_var_string(&mut self, value: &str, enc: Encoding) -> Result<&mut Self> {
        let len = enc
            .byte_len(value)
            .map_err(|reason| EncodingError::new(self.offset(), reason, "write_var_string"))?;
        self.write_varint(len as u64)?;
        self.write_string(value, enc)
    }

    /// Writes `value` in encoding `enc` followed by a zero byte.
    fn write_null_string(&mut self, value: &str, enc: Encoding) -> Result<&mut Self> {
        self.write_string(value, enc)?;
        self.write_u8(0)
    }

    /// Writes a 32-byte hash.
    fn write_hash(&mut self, hash: &[u8; HASH_SIZE]) -> Result<&mut Self> {
        self.put_slice(hash)?;
        Ok(self)
    }

    /// Writes a 32-byte hash given as 64 hex characters. Anything that does not decode to
    /// exactly 32 bytes fails with [`Reason::InvalidHash`].
    fn write_hash_hex(&mut self, hash: &str) -> Result<&mut Self> {
        let hash = bytes::hash_from_hex(hash)
            .map_err(|reason| EncodingError::new(self.offset(), reason, "write_hash_hex"))?;
        self.write_hash(&hash)
    }

    /// Writes `size` copies of `value`.
    fn write_fill(&mut self, value: u8, size: usize) -> Result<&mut Self> {
        self.put_fill(value, size)?;
        Ok(self)
    }

    /// Hashes everything written so far and appends the first four bytes of the digest.
    ///
    /// Only writers that keep their output support this.
    fn write_checksum<F, H>(&mut self, hash: F) -> Result<&mut Self>
    where
        F: FnOnce(&[u8]) -> H,
        H: AsRef<[u8]>,
    {
        const OP: &str = "write_checksum";
        let digest = match self.written() {
            Some(data) => hash(data),
            None => return Err(EncodingError::new(self.offset(), Reason::Unsupported, OP)),
        };
        let digest = digest.as_ref();
        enforce(digest.len() >= 4, self.offset(), Reason::InvalidHash, OP)?;
        self.put_slice(&digest[..4])?;
        Ok(self)
    }
}

/// A writer that grows as needed.
///
/// `seek` may move anywhere within the bytes written so far; later writes overwrite and then
/// extend the buffer. `render` returns the bytes up to the current offset, so a backward seek
/// that is not written over truncates the output.
#[derive(Clone, Debug, Default)]
pub struct BinaryWriter {
    out: Vec<u8>,
    pos: usize,
}

impl BinaryWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `len` bytes.
    pub fn with_capacity(len: usize) -> Self {
        Self {
            out: Vec::with_capacity(len),
            pos: 0,
        }
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.out
    }

    /// Extracts the inner buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.out
    }
}

impl BinaryWrite for BinaryWriter {
    type Output = Vec<u8>;

    fn offset(&self) -> usize {
        self.pos
    }

    fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let overlap = (self.out.len() - self.pos).min(bytes.len());
        self.out[self.pos..self.pos + overlap].copy_from_slice(&bytes[..overlap]);
        self.out.extend_from_slice(&bytes[overlap..]);
        self.pos += bytes.len();
        Ok(())
    }

    fn render(&mut self) -> Result<Vec<u8>> {
        self.out.truncate(self.pos);
        self.pos = 0;
        Ok(core::mem::take(&mut self.out))
    }

    fn destroy(&mut self) {
        self.out = Vec::new();
        self.pos = 0;
    }

    fn written(&self) -> Option<&[u8]> {
        Some(&self.out[..self.pos])
    }

    fn seek(&mut self, delta: isize) -> Result<&mut Self> {
        self.pos = self
            .pos
            .checked_add_signed(delta)
            .filter(|&target| target <= self.out.len())
            .ok_or(EncodingError::new(self.pos, Reason::OutOfBoundsWrite, "seek"))?;
        Ok(self)
    }
}

/// Either a growable or a pre-sized writer, as chosen by [`new_writer`](crate::new_writer).
#[derive(Clone, Debug)]
pub enum Writer {
    /// Grows as needed.
    Growable(BinaryWriter),
    /// Allocated up front; must be filled exactly.
    Static(StaticWriter),
}

impl BinaryWrite for Writer {
    type Output = Vec<u8>;

    fn offset(&self) -> usize {
        match self {
            Self::Growable(w) => w.offset(),
            Self::Static(w) => w.offset(),
        }
    }

    fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Growable(w) => w.put_slice(bytes),
            Self::Static(w) => w.put_slice(bytes),
        }
    }

    fn render(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::Growable(w) => w.render(),
            Self::Static(w) => w.render(),
        }
    }

    fn destroy(&mut self) {
        match self {
            Self::Growable(w) => w.destroy(),
            Self::Static(w) => w.destroy(),
        }
    }

    fn written(&self) -> Option<&[u8]> {
        match self {
            Self::Growable(w) => w.written(),
            Self::Static(w) => w.written(),
        }
    }

    fn seek(&mut self, delta: isize) -> Result<&mut Self> {
        match self {
            Self::Growable(w) => {
                w.seek(delta)?;
            }
            Self::Static(w) => {
                w.seek(delta)?;
            }
        }
        Ok(self)
    }
}
