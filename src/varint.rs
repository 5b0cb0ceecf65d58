//! Variable-length integer codecs.
//!
//! Two formats are provided. They produce different bytes for the same value and are not
//! interchangeable.
//!
//! * The compact format ([`read_varint`], [`write_varint`]) is the Bitcoin `CompactSize`
//!   encoding: a marker byte followed by a little-endian integer of 2, 4 or 8 bytes, or a
//!   single byte for values below `0xfd`. Decoding rejects any form longer than necessary.
//!
//! * The bit-packed format ([`read_varint2`], [`write_varint2`]) stores 7 bits per byte,
//!   most significant group first, with `0x80` marking that more bytes follow. Every group
//!   but the last is stored minus one, which removes the redundant leading-zero forms that
//!   plain base-128 has. Decoding does not check for canonical forms.
//!
//! Both formats carry values up to [`MAX_SAFE_INTEGER`].

use crate::error::{check, enforce, EncodingError, Reason, Result};
use crate::fixed::{self, Endian, MAX_SAFE_INTEGER};

/// Indicates a compact varint whose value follows as a `u16`.
pub const U16_SIGNIFIER: u8 = 0xfd;
/// Indicates a compact varint whose value follows as a `u32`.
pub const U32_SIGNIFIER: u8 = 0xfe;
/// Indicates a compact varint whose value follows as a `u64`.
pub const U64_SIGNIFIER: u8 = 0xff;

/// Longest bit-packed encoding of a value up to 2^53-1.
pub const MAX_VARINT2_SIZE: usize = 8;

const DATA_BITS_MASK: u8 = 0x7f;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// A decoded varint together with the number of bytes it occupied.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Varint {
    /// Encoded length in bytes.
    pub size: usize,
    /// Decoded value.
    pub value: u64,
}

/// Number of bytes the compact encoding of `value` occupies: 1, 3, 5 or 9.
pub fn size_varint(value: u64) -> usize {
    if value < u64::from(U16_SIGNIFIER) {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffff_ffff {
        5
    } else {
        9
    }
}

/// Writes `value` in the compact format and returns the offset past it.
///
/// Values above 2^53-1 fail with [`Reason::NumberTooLarge`].
pub fn write_varint(dst: &mut [u8], value: u64, off: usize) -> Result<usize> {
    const OP: &str = "write_varint";
    enforce(value <= MAX_SAFE_INTEGER, off, Reason::NumberTooLarge, OP)?;
    let size = size_varint(value);
    check(dst.len(), off, size, Reason::OutOfBoundsWrite, OP)?;
    let (marker, width) = match size {
        1 => {
            dst[off] = value as u8;
            return Ok(off + 1);
        }
        3 => (U16_SIGNIFIER, 2),
        5 => (U32_SIGNIFIER, 4),
        _ => (U64_SIGNIFIER, 8),
    };
    dst[off] = marker;
    // Bounded by MAX_SAFE_INTEGER above.
    fixed::write_u(dst, value as i64, off + 1, width, Endian::Little)
}

/// Reads a compact varint starting at `off`.
///
/// Fails with [`Reason::NonCanonicalVarint`] if the value would fit in a shorter form.
pub fn read_varint(data: &[u8], off: usize) -> Result<Varint> {
    const OP: &str = "read_varint";
    let Some(&first) = data.get(off) else {
        return Err(EncodingError::new(off, Reason::OutOfBoundsRead, OP));
    };
    let (size, min) = match first {
        U16_SIGNIFIER => (3, u64::from(U16_SIGNIFIER)),
        U32_SIGNIFIER => (5, 0x1_0000),
        U64_SIGNIFIER => (9, 0x1_0000_0000),
        _ => {
            return Ok(Varint {
                size: 1,
                value: u64::from(first),
            })
        }
    };
    check(data.len(), off, size, Reason::OutOfBoundsRead, OP)?;
    let value = fixed::read_u(data, off + 1, size - 1, Endian::Little)
        .map_err(|e| EncodingError::new(off, e.reason, OP))?;
    enforce(value >= min, off, Reason::NonCanonicalVarint, OP)?;
    Ok(Varint { size, value })
}

/// Number of bytes the bit-packed encoding of `value` occupies.
pub fn size_varint2(value: u64) -> usize {
    let mut num = value;
    let mut size = 1;
    while num > u64::from(DATA_BITS_MASK) {
        num = (num >> 7) - 1;
        size += 1;
    }
    size
}

/// Writes `value` in the bit-packed format and returns the offset past it.
///
/// Values above 2^53-1 fail with [`Reason::NumberTooLarge`].
pub fn write_varint2(dst: &mut [u8], value: u64, off: usize) -> Result<usize> {
    const OP: &str = "write_varint2";
    enforce(value <= MAX_SAFE_INTEGER, off, Reason::NumberTooLarge, OP)?;

    // Groups are produced least significant first and emitted in reverse.
    let mut groups = [0u8; MAX_VARINT2_SIZE];
    let mut len = 0;
    let mut num = value;
    loop {
        let more = if len > 0 { CONTINUATION_BIT_MASK } else { 0 };
        groups[len] = (num as u8 & DATA_BITS_MASK) | more;
        len += 1;
        if num <= u64::from(DATA_BITS_MASK) {
            break;
        }
        num = (num >> 7) - 1;
    }

    check(dst.len(), off, len, Reason::OutOfBoundsWrite, OP)?;
    for (out, &group) in dst[off..off + len].iter_mut().zip(groups[..len].iter().rev()) {
        *out = group;
    }
    Ok(off + len)
}

/// Reads a bit-packed varint starting at `off`.
///
/// Fails with [`Reason::NumberTooLarge`] as soon as the accumulated value would pass
/// 2^53-1.
pub fn read_varint2(data: &[u8], off: usize) -> Result<Varint> {
    const OP: &str = "read_varint2";
    let mut num: u64 = 0;
    let mut pos = off;
    loop {
        let Some(&byte) = data.get(pos) else {
            return Err(EncodingError::new(pos, Reason::OutOfBoundsRead, OP));
        };
        // num <= 2^53-1 here, so this cannot overflow a u64.
        num = num * 0x80 + u64::from(byte & DATA_BITS_MASK);
        enforce(num <= MAX_SAFE_INTEGER, pos, Reason::NumberTooLarge, OP)?;
        pos += 1;
        if byte & CONTINUATION_BIT_MASK == 0 {
            break;
        }
        enforce(num != MAX_SAFE_INTEGER, pos, Reason::NumberTooLarge, OP)?;
        num += 1;
    }
    Ok(Varint {
        size: pos - off,
        value: num,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut buf = vec![0u8; 9];
        let end = write_varint(&mut buf, value, 0).unwrap();
        buf.truncate(end);
        buf
    }

    fn encode2(value: u64) -> Vec<u8> {
        let mut buf = vec![0u8; MAX_VARINT2_SIZE];
        let end = write_varint2(&mut buf, value, 0).unwrap();
        buf.truncate(end);
        buf
    }

    #[test]
    fn compact_encoding() {
        let cases: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (0xfc, &[0xfc]),
            (0xfd, &[0xfd, 0xfd, 0x00]),
            (0xffff, &[0xfd, 0xff, 0xff]),
            (0x1_0000, &[0xfe, 0x00, 0x00, 0x01, 0x00]),
            (0xffff_ffff, &[0xfe, 0xff, 0xff, 0xff, 0xff]),
            (
                0x1_0000_0000,
                &[0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00],
            ),
            (
                MAX_SAFE_INTEGER,
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x1f, 0x00],
            ),
        ];

        for &(value, bytes) in cases {
            assert_eq!(encode(value), bytes, "value = {value:#x}");
            assert_eq!(size_varint(value), bytes.len());
            assert_eq!(
                read_varint(bytes, 0),
                Ok(Varint {
                    size: bytes.len(),
                    value
                })
            );
        }
    }

    #[test]
    fn compact_rejects_non_canonical() {
        let cases: &[&[u8]] = &[
            &[0xfd, 0x00, 0x00],
            &[0xfd, 0xfc, 0x00],
            &[0xfe, 0xff, 0xff, 0x00, 0x00],
            &[0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00],
        ];
        for bytes in cases {
            let err = read_varint(bytes, 0).unwrap_err();
            assert_eq!(err.reason, Reason::NonCanonicalVarint, "{bytes:x?}");
            assert_eq!(err.to_string(), "Non-canonical varint (offset=0)");
        }
    }

    #[test]
    fn compact_bounds_and_range() {
        assert_eq!(
            read_varint(&[0xfe, 0x00, 0x00], 0).unwrap_err().reason,
            Reason::OutOfBoundsRead
        );
        assert_eq!(read_varint(&[], 0).unwrap_err().reason, Reason::OutOfBoundsRead);

        let too_big = [0xff, 0, 0, 0, 0, 0, 0, 0x20, 0];
        assert_eq!(read_varint(&too_big, 0).unwrap_err().reason, Reason::NumberTooLarge);

        let mut buf = [0u8; 9];
        assert_eq!(
            write_varint(&mut buf, MAX_SAFE_INTEGER + 1, 0).unwrap_err().reason,
            Reason::NumberTooLarge
        );
        assert_eq!(
            write_varint(&mut buf[..2], 0xfd, 0).unwrap_err().reason,
            Reason::OutOfBoundsWrite
        );
        assert_eq!(buf, [0; 9]);
    }

    #[test]
    fn bit_packed_vectors() {
        let cases: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x00]),
            (255, &[0x80, 0x7f]),
            (16383, &[0xfe, 0x7f]),
            (16384, &[0xff, 0x00]),
            (1 << 32, &[0x8e, 0xfe, 0xfe, 0xff, 0x00]),
        ];

        for &(value, bytes) in cases {
            assert_eq!(encode2(value), bytes, "value = {value}");
            assert_eq!(size_varint2(value), bytes.len());
            assert_eq!(
                read_varint2(bytes, 0),
                Ok(Varint {
                    size: bytes.len(),
                    value
                })
            );
        }
    }

    #[test]
    fn bit_packed_boundary() {
        let bytes = encode2(MAX_SAFE_INTEGER);
        assert_eq!(bytes.len(), size_varint2(MAX_SAFE_INTEGER));
        assert_eq!(read_varint2(&bytes, 0).unwrap().value, MAX_SAFE_INTEGER);

        let mut buf = [0u8; MAX_VARINT2_SIZE];
        assert_eq!(
            write_varint2(&mut buf, MAX_SAFE_INTEGER + 1, 0).unwrap_err().reason,
            Reason::NumberTooLarge
        );

        let overlong = [0xff; 12];
        assert_eq!(read_varint2(&overlong, 0).unwrap_err().reason, Reason::NumberTooLarge);
    }

    #[test]
    fn bit_packed_truncated() {
        let err = read_varint2(&[0x80, 0x80], 0).unwrap_err();
        assert_eq!(err.reason, Reason::OutOfBoundsRead);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn round_trip_sweep() {
        let mut value = 1u64;
        while value <= MAX_SAFE_INTEGER {
            for v in [value - 1, value, value + 1] {
                assert_eq!(read_varint(&encode(v), 0).unwrap().value, v);
                assert_eq!(read_varint2(&encode2(v), 0).unwrap().value, v);
            }
            value <<= 1;
        }
    }
}
