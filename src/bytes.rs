//! Byte and string codecs: bounds-checked copies, encoded strings, length-prefixed values,
//! null-terminated strings and 32-byte hashes.

use crate::error::{check, enforce, EncodingError, Reason, Result};
use crate::text::Encoding;
use crate::varint;
use alloc::string::String;

/// Size of a hash value in bytes.
pub const HASH_SIZE: usize = 32;

/// Returns the `size` bytes starting at `off`, without copying them.
pub fn read_bytes(data: &[u8], off: usize, size: usize) -> Result<&[u8]> {
    check(data.len(), off, size, Reason::OutOfBoundsRead, "read_bytes")?;
    Ok(&data[off..off + size])
}

/// Copies `src` into `dst` at `off` and returns the offset past it.
pub fn write_bytes(dst: &mut [u8], src: &[u8], off: usize) -> Result<usize> {
    check(dst.len(), off, src.len(), Reason::OutOfBoundsWrite, "write_bytes")?;
    dst[off..off + src.len()].copy_from_slice(src);
    Ok(off + src.len())
}

/// Decodes the `size` bytes starting at `off` as a string.
pub fn read_string(data: &[u8], off: usize, size: usize, enc: Encoding) -> Result<String> {
    const OP: &str = "read_string";
    check(data.len(), off, size, Reason::OutOfBoundsRead, OP)?;
    enc.decode(&data[off..off + size])
        .map_err(|reason| EncodingError::new(off, reason, OP))
}

/// Encodes `s` into `dst` at `off` and returns the offset past it. An empty string writes
/// nothing.
pub fn write_string(dst: &mut [u8], s: &str, off: usize, enc: Encoding) -> Result<usize> {
    const OP: &str = "write_string";
    if s.is_empty() {
        return Ok(off);
    }
    let bytes = enc
        .encode(s)
        .map_err(|reason| EncodingError::new(off, reason, OP))?;
    check(dst.len(), off, bytes.len(), Reason::OutOfBoundsWrite, OP)?;
    dst[off..off + bytes.len()].copy_from_slice(&bytes);
    Ok(off + bytes.len())
}

/// Reads a compact-varint length prefix followed by that many bytes. Returns the payload
/// and the offset past it.
///
/// If `limit` is given, a longer payload fails with [`Reason::StringExceedsLimit`].
pub fn read_var_bytes(data: &[u8], off: usize, limit: Option<usize>) -> Result<(&[u8], usize)> {
    const OP: &str = "read_var_bytes";
    let prefix = varint::read_varint(data, off)?;
    let start = off + prefix.size;
    let len = usize::try_from(prefix.value)
        .map_err(|_| EncodingError::new(start, Reason::OutOfBoundsRead, OP))?;
    if let Some(limit) = limit {
        enforce(len <= limit, start, Reason::StringExceedsLimit, OP)?;
    }
    check(data.len(), start, len, Reason::OutOfBoundsRead, OP)?;
    Ok((&data[start..start + len], start + len))
}

/// Writes `src` with a compact-varint length prefix and returns the offset past it.
pub fn write_var_bytes(dst: &mut [u8], src: &[u8], off: usize) -> Result<usize> {
    let off = varint::write_varint(dst, src.len() as u64, off)?;
    write_bytes(dst, src, off)
}

/// Scans forward from `off` for a zero byte and decodes everything before it. Returns the
/// string and the offset past the terminator.
pub fn read_null_string(data: &[u8], off: usize, enc: Encoding) -> Result<(String, usize)> {
    const OP: &str = "read_null_string";
    check(data.len(), off, 0, Reason::OutOfBoundsRead, OP)?;
    let Some(len) = data[off..].iter().position(|&b| b == 0) else {
        return Err(EncodingError::new(data.len(), Reason::OutOfBoundsRead, OP));
    };
    let s = read_string(data, off, len, enc)?;
    Ok((s, off + len + 1))
}

/// Size of a compact-varint length prefix plus a payload of `len` bytes.
pub fn size_varlen(len: usize) -> usize {
    varint::size_varint(len as u64) + len
}

/// Size of `bytes` written with a length prefix.
pub fn size_var_bytes(bytes: &[u8]) -> usize {
    size_varlen(bytes.len())
}

/// Size of `s` written with a length prefix in encoding `enc`.
pub fn size_var_string(s: &str, enc: Encoding) -> Result<usize> {
    let len = enc
        .byte_len(s)
        .map_err(|reason| EncodingError::new(0, reason, "size_var_string"))?;
    Ok(size_varlen(len))
}

/// Decodes a 64-character hex string into a hash.
pub fn hash_from_hex(s: &str) -> core::result::Result<[u8; HASH_SIZE], Reason> {
    let mut hash = [0u8; HASH_SIZE];
    hex::decode_to_slice(s, &mut hash).map_err(|_| Reason::InvalidHash)?;
    Ok(hash)
}
