//! Cursor-based binary readers and writers.
//!
//! The codecs cover fixed-width integers of 1 to 8 bytes in either byte order, IEEE-754
//! floats, two varint formats, length-prefixed and null-terminated strings, 32-byte hashes
//! and 4-byte checksums. Integers of 5 to 8 bytes are limited to a magnitude of 2^53-1 by
//! default (see [`fixed`]), with `big` variants for the full 64-bit range.
//!
//! [`BinaryReader`] decodes from a byte slice. Writers share the [`BinaryWrite`] trait and
//! differ in where the bytes go:
//!
//! * [`BinaryWriter`] grows a `Vec<u8>`.
//! * [`StaticWriter`] fills a buffer of a size computed in advance.
//! * [`SizeWriter`] only counts.
//! * [`DigestWriter`] feeds a streaming hash.
//!
//! A common pattern is to measure with a `SizeWriter`, then encode into a `StaticWriter` of
//! exactly that size:
//!
//! ```
//! use binary_cursor::{new_reader, new_size_counter, new_writer, BinaryWrite, Encoding};
//!
//! fn encode<W: BinaryWrite>(w: &mut W) -> binary_cursor::Result<()> {
//!     w.write_u32(7)?.write_var_string("hello", Encoding::Utf8)?.write_u64(1 << 40)?;
//!     Ok(())
//! }
//!
//! let mut size = new_size_counter();
//! encode(&mut size)?;
//! let mut w = new_writer(Some(size.render()?));
//! encode(&mut w)?;
//! let data = w.render()?;
//!
//! let mut r = new_reader(&data, false);
//! assert_eq!(r.read_u32()?, 7);
//! assert_eq!(r.read_var_string(Encoding::Utf8, None)?, "hello");
//! assert_eq!(r.read_u64()?, 1 << 40);
//! # Ok::<(), binary_cursor::EncodingError>(())
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(missing_docs)]

extern crate alloc;

pub mod bytes;
mod error;
pub mod fixed;
mod reader;
pub mod text;
pub mod varint;
mod writer;


pub use error::{EncodingError, Reason, Result};
pub use fixed::{Endian, MAX_SAFE_INTEGER};
pub use reader::BinaryReader;
pub use text::Encoding;
pub use varint::Varint;
pub use writer::{
    BinaryWrite, BinaryWriter, Digest, DigestWriter, SizeWriter, StaticWriter, Writer,
};

/// Creates a reader over `data`. With `zero_copy` set, byte strings borrow from `data`
/// instead of being copied.
pub fn new_reader(data: &[u8], zero_copy: bool) -> BinaryReader<'_> {
    BinaryReader::new(data, zero_copy)
}

/// Creates a pre-sized writer if `size` is given, or a growable one otherwise.
pub fn new_writer(size: Option<usize>) -> Writer {
    match size {
        Some(size) => Writer::Static(StaticWriter::new(size)),
        None => Writer::Growable(BinaryWriter::new()),
    }
}

/// Creates a writer that only counts bytes.
pub fn new_size_counter() -> SizeWriter {
    SizeWriter::new()
}

/// Creates a writer that feeds `ctx`.
pub fn new_digest_writer<D: Digest>(ctx: &mut D) -> DigestWriter<'_, D> {
    DigestWriter::new(ctx)
}
