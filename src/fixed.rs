//! Fixed-width integer and IEEE-754 codecs.
//!
//! Every function takes the buffer, an offset and (for integers) a width in bytes between 1
//! and 8. Reads return the decoded value; writes return the offset just past the written
//! bytes.
//!
//! Integers come in two flavors:
//!
//! * The "safe" functions ([`read_u`], [`read_i`], [`write_u`], [`write_i`]) restrict values
//!   of width 5 to 8 to a magnitude of at most [`MAX_SAFE_INTEGER`] (2^53-1), which is the
//!   largest integer a binary64 float holds exactly. Protocols built on this crate rely on
//!   that bound, so reads fail rather than hand back a value the other side could not
//!   represent.
//! * The "big" functions ([`read_big_u`], [`read_big_i`], [`write_big_u`], [`write_big_i`])
//!   cover the full 64-bit range with no bound.
//!
//! Values wider than 4 bytes are handled as a 32-bit low word plus a high word holding the
//! remaining bytes. The safe bound is checked on the high word alone, before the two
//! words are combined.

use crate::error::{check, enforce, EncodingError, Reason, Result};
use zerocopy::byteorder::{BE, F32, F64, LE};
use zerocopy::{FromBytes, Immutable, IntoBytes};

/// The largest magnitude accepted by the safe integer functions, 2^53-1.
pub const MAX_SAFE_INTEGER: u64 = 0x001f_ffff_ffff_ffff;

/// Bits of the high word that must be clear for a value to be within 2^53-1.
const HI_UNSAFE_BITS: u32 = 0xffe0_0000;

/// Byte order of a multi-byte value.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Default)]
pub enum Endian {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

#[inline(always)]
fn check_width(width: usize, off: usize, op: &'static str) -> Result<()> {
    enforce((1..=8).contains(&width), off, Reason::InvalidWidth, op)
}

/// Packs up to 4 bytes into a word.
fn word(bytes: &[u8], endian: Endian) -> u32 {
    match endian {
        Endian::Little => bytes.iter().rev().fold(0, |acc, &b| acc << 8 | u32::from(b)),
        Endian::Big => bytes.iter().fold(0, |acc, &b| acc << 8 | u32::from(b)),
    }
}

/// Unpacks the low `out.len()` bytes of `value`, `out.len()` being at most 4.
fn unword(value: u32, out: &mut [u8], endian: Endian) {
    let n = out.len();
    for i in 0..n {
        let byte = (value >> (8 * i)) as u8;
        match endian {
            Endian::Little => out[i] = byte,
            Endian::Big => out[n - 1 - i] = byte,
        }
    }
}

/// Loads `width` bytes as a `(high, low)` pair. For widths up to 4 the high word is zero.
fn load(
    data: &[u8],
    off: usize,
    width: usize,
    endian: Endian,
    op: &'static str,
) -> Result<(u32, u32)> {
    check(data.len(), off, width, Reason::OutOfBoundsRead, op)?;
    let bytes = &data[off..off + width];
    if width <= 4 {
        return Ok((0, word(bytes, endian)));
    }
    let (hi, lo) = match endian {
        Endian::Little => (&bytes[4..], &bytes[..4]),
        Endian::Big => bytes.split_at(width - 4),
    };
    Ok((word(hi, endian), word(lo, endian)))
}

/// Stores a `(high, low)` pair into `width` bytes. No partial write happens on failure.
fn store(
    dst: &mut [u8],
    hi: u32,
    lo: u32,
    off: usize,
    width: usize,
    endian: Endian,
    op: &'static str,
) -> Result<usize> {
    check(dst.len(), off, width, Reason::OutOfBoundsWrite, op)?;
    let out = &mut dst[off..off + width];
    if width <= 4 {
        unword(lo, out, endian);
    } else {
        let (hi_out, lo_out) = match endian {
            Endian::Little => {
                let (l, h) = out.split_at_mut(4);
                (h, l)
            }
            Endian::Big => out.split_at_mut(width - 4),
        };
        unword(hi, hi_out, endian);
        unword(lo, lo_out, endian);
    }
    Ok(off + width)
}

/// Sign-extends the low `bytes` bytes of `value`.
fn sign_extend(value: u32, bytes: usize) -> i32 {
    let shift = 32 - 8 * bytes as u32;
    ((value << shift) as i32) >> shift
}

/// Checks that a two's complement `(high, low)` pair has a magnitude of at most 2^53-1.
fn is_safe(hi: i32, lo: u32) -> bool {
    let magnitude_hi = if hi < 0 {
        let inverted = !hi as u32;
        if lo == 0 {
            inverted + 1
        } else {
            inverted
        }
    } else {
        hi as u32
    };
    magnitude_hi & HI_UNSAFE_BITS == 0
}

/// Splits a value with magnitude of at most 2^53-1 into a two's complement `(high, low)`
/// pair, building the negative form by hand: negate, complement, add one.
fn split(value: i64) -> (u32, u32) {
    let magnitude = value.unsigned_abs();
    let mut hi = (magnitude >> 32) as u32;
    let mut lo = magnitude as u32;
    if value < 0 {
        if lo == 0 {
            hi = (!hi).wrapping_add(1);
        } else {
            hi = !hi;
            lo = (!lo).wrapping_add(1);
        }
    }
    (hi, lo)
}

/// Reads an unsigned integer of `width` bytes.
///
/// Widths 5 to 8 fail with [`Reason::NumberTooLarge`] if the value exceeds 2^53-1.
pub fn read_u(data: &[u8], off: usize, width: usize, endian: Endian) -> Result<u64> {
    const OP: &str = "read_u";
    check_width(width, off, OP)?;
    let (hi, lo) = load(data, off, width, endian, OP)?;
    enforce(hi & HI_UNSAFE_BITS == 0, off, Reason::NumberTooLarge, OP)?;
    Ok(u64::from(hi) << 32 | u64::from(lo))
}

/// Reads a two's complement signed integer of `width` bytes, sign-extending it.
///
/// Widths 5 to 8 fail with [`Reason::NumberTooLarge`] if the magnitude exceeds 2^53-1.
pub fn read_i(data: &[u8], off: usize, width: usize, endian: Endian) -> Result<i64> {
    const OP: &str = "read_i";
    check_width(width, off, OP)?;
    let (hi, lo) = load(data, off, width, endian, OP)?;
    if width <= 4 {
        return Ok(i64::from(sign_extend(lo, width)));
    }
    let hi = sign_extend(hi, width - 4);
    enforce(is_safe(hi, lo), off, Reason::NumberTooLarge, OP)?;
    Ok(i64::from(hi) << 32 | i64::from(lo))
}

fn encode(
    dst: &mut [u8],
    value: i64,
    off: usize,
    width: usize,
    endian: Endian,
    op: &'static str,
) -> Result<usize> {
    check_width(width, off, op)?;
    if width <= 4 {
        // Narrow widths wrap.
        return store(dst, 0, value as u32, off, width, endian, op);
    }
    enforce(
        value.unsigned_abs() <= MAX_SAFE_INTEGER,
        off,
        Reason::NumberTooLarge,
        op,
    )?;
    let (hi, lo) = split(value);
    store(dst, hi, lo, off, width, endian, op)
}

/// Writes `value` as an unsigned integer of `width` bytes.
///
/// Widths 1 to 4 keep only the low bits of `value`. Widths 5 to 8 require a magnitude of at
/// most 2^53-1 and accept negative values, which are stored in two's complement over the
/// full width. Reading such a value back with [`read_u`] fails; use [`read_i`].
pub fn write_u(
    dst: &mut [u8],
    value: i64,
    off: usize,
    width: usize,
    endian: Endian,
) -> Result<usize> {
    encode(dst, value, off, width, endian, "write_u")
}

/// Writes `value` as a two's complement signed integer of `width` bytes.
///
/// The encoding is the same as [`write_u`].
pub fn write_i(
    dst: &mut [u8],
    value: i64,
    off: usize,
    width: usize,
    endian: Endian,
) -> Result<usize> {
    encode(dst, value, off, width, endian, "write_i")
}

/// Reads an unsigned integer of `width` bytes. The full 64-bit range is accepted.
pub fn read_big_u(data: &[u8], off: usize, width: usize, endian: Endian) -> Result<u64> {
    const OP: &str = "read_big_u";
    check_width(width, off, OP)?;
    let (hi, lo) = load(data, off, width, endian, OP)?;
    Ok(u64::from(hi) << 32 | u64::from(lo))
}

/// Reads a signed integer of `width` bytes. The full 64-bit range is accepted.
pub fn read_big_i(data: &[u8], off: usize, width: usize, endian: Endian) -> Result<i64> {
    const OP: &str = "read_big_i";
    check_width(width, off, OP)?;
    let (hi, lo) = load(data, off, width, endian, OP)?;
    let value = u64::from(hi) << 32 | u64::from(lo);
    let shift = 64 - 8 * width as u32;
    Ok(((value << shift) as i64) >> shift)
}

/// Writes the low `width` bytes of `value`.
pub fn write_big_u(
    dst: &mut [u8],
    value: u64,
    off: usize,
    width: usize,
    endian: Endian,
) -> Result<usize> {
    const OP: &str = "write_big_u";
    check_width(width, off, OP)?;
    store(dst, (value >> 32) as u32, value as u32, off, width, endian, OP)
}

/// Writes the low `width` bytes of the two's complement form of `value`.
pub fn write_big_i(
    dst: &mut [u8],
    value: i64,
    off: usize,
    width: usize,
    endian: Endian,
) -> Result<usize> {
    const OP: &str = "write_big_i";
    check_width(width, off, OP)?;
    let bits = value as u64;
    store(dst, (bits >> 32) as u32, bits as u32, off, width, endian, OP)
}

fn get<T: FromBytes>(data: &[u8], off: usize, op: &'static str) -> Result<T> {
    data.get(off..)
        .and_then(|rest| T::read_from_prefix(rest).ok())
        .map(|(value, _)| value)
        .ok_or(EncodingError::new(off, Reason::OutOfBoundsRead, op))
}

fn put<T: IntoBytes + Immutable>(
    dst: &mut [u8],
    value: T,
    off: usize,
    op: &'static str,
) -> Result<usize> {
    let bytes = value.as_bytes();
    check(dst.len(), off, bytes.len(), Reason::OutOfBoundsWrite, op)?;
    dst[off..off + bytes.len()].copy_from_slice(bytes);
    Ok(off + bytes.len())
}

/// Reads an IEEE-754 single.
pub fn read_f32(data: &[u8], off: usize, endian: Endian) -> Result<f32> {
    const OP: &str = "read_f32";
    Ok(match endian {
        Endian::Little => get::<F32<LE>>(data, off, OP)?.get(),
        Endian::Big => get::<F32<BE>>(data, off, OP)?.get(),
    })
}

/// Reads an IEEE-754 double.
pub fn read_f64(data: &[u8], off: usize, endian: Endian) -> Result<f64> {
    const OP: &str = "read_f64";
    Ok(match endian {
        Endian::Little => get::<F64<LE>>(data, off, OP)?.get(),
        Endian::Big => get::<F64<BE>>(data, off, OP)?.get(),
    })
}

/// Writes an IEEE-754 single.
pub fn write_f32(dst: &mut [u8], value: f32, off: usize, endian: Endian) -> Result<usize> {
    const OP: &str = "write_f32";
    match endian {
        Endian::Little => put(dst, F32::<LE>::new(value), off, OP),
        Endian::Big => put(dst, F32::<BE>::new(value), off, OP),
    }
}

/// Writes an IEEE-754 double.
pub fn write_f64(dst: &mut [u8], value: f64, off: usize, endian: Endian) -> Result<usize> {
    const OP: &str = "write_f64";
    match endian {
        Endian::Little => put(dst, F64::<LE>::new(value), off, OP),
        Endian::Big => put(dst, F64::<BE>::new(value), off, OP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDIANS: [Endian; 2] = [Endian::Little, Endian::Big];

    #[test]
    fn narrow_widths_match_native_packing() {
        let mut buf = [0u8; 4];
        write_u(&mut buf, 0x0102_0304, 0, 4, Endian::Little).unwrap();
        assert_eq!(buf, 0x0102_0304u32.to_le_bytes());
        write_u(&mut buf, 0x0102_0304, 0, 4, Endian::Big).unwrap();
        assert_eq!(buf, 0x0102_0304u32.to_be_bytes());

        write_u(&mut buf, 0x00ab_cdef, 0, 3, Endian::Big).unwrap();
        assert_eq!(&buf[..3], &[0xab, 0xcd, 0xef]);
        assert_eq!(read_u(&buf, 0, 3, Endian::Big), Ok(0x00ab_cdef));
        assert_eq!(read_u(&buf, 0, 3, Endian::Little), Ok(0x00ef_cdab));
    }

    #[test]
    fn narrow_writes_wrap() {
        let mut buf = [0u8; 2];
        write_u(&mut buf, 0x1_2345, 0, 2, Endian::Little).unwrap();
        assert_eq!(buf, [0x45, 0x23]);
        write_i(&mut buf, -1, 0, 1, Endian::Little).unwrap();
        assert_eq!(buf[0], 0xff);
        assert_eq!(read_u(&buf, 0, 1, Endian::Little), Ok(0xff));
        assert_eq!(read_i(&buf, 0, 1, Endian::Little), Ok(-1));
    }

    #[test]
    fn signed_narrow_sign_extends() {
        let mut buf = [0u8; 3];
        write_i(&mut buf, -2, 0, 3, Endian::Little).unwrap();
        assert_eq!(buf, [0xfe, 0xff, 0xff]);
        assert_eq!(read_i(&buf, 0, 3, Endian::Little), Ok(-2));
        assert_eq!(read_u(&buf, 0, 3, Endian::Little), Ok(0x00ff_fffe));
    }

    #[test]
    fn round_trip_all_widths() {
        let mut buf = [0u8; 8];
        for width in 1..=8usize {
            let bits = (8 * width as u32).min(53);
            let max_u = (1u64 << bits) - 1;
            let max_i = (1i64 << ((8 * width as u32).min(54) - 1)) - 1;
            let max_i = max_i.min(MAX_SAFE_INTEGER as i64);
            for endian in ENDIANS {
                for value in [0, 1, max_u / 3, max_u] {
                    let end = write_u(&mut buf, value as i64, 0, width, endian).unwrap();
                    assert_eq!(end, width);
                    assert_eq!(read_u(&buf, 0, width, endian), Ok(value), "w={width} {endian:?}");
                }
                for value in [0, 1, -1, max_i, -max_i] {
                    write_i(&mut buf, value, 0, width, endian).unwrap();
                    assert_eq!(read_i(&buf, 0, width, endian), Ok(value), "w={width} {endian:?}");
                }
            }
        }
    }

    #[test]
    fn wide_endianness_layout() {
        let mut le = [0u8; 6];
        let mut be = [0u8; 6];
        write_u(&mut le, 0x0102_0304_0506, 0, 6, Endian::Little).unwrap();
        write_u(&mut be, 0x0102_0304_0506, 0, 6, Endian::Big).unwrap();
        assert_eq!(le, [6, 5, 4, 3, 2, 1]);
        assert_eq!(be, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn safe_boundary() {
        let mut buf = [0u8; 8];
        write_u(&mut buf, MAX_SAFE_INTEGER as i64, 0, 8, Endian::Little).unwrap();
        assert_eq!(buf, MAX_SAFE_INTEGER.to_le_bytes());
        assert_eq!(read_u(&buf, 0, 8, Endian::Little), Ok(MAX_SAFE_INTEGER));

        let err = write_u(&mut buf, MAX_SAFE_INTEGER as i64 + 1, 0, 8, Endian::Little).unwrap_err();
        assert_eq!(err.reason, Reason::NumberTooLarge);

        // High 11 bits set.
        let too_big = 0xffe0_0000_0000_0000u64.to_le_bytes();
        let err = read_u(&too_big, 0, 8, Endian::Little).unwrap_err();
        assert_eq!(err.reason, Reason::NumberTooLarge);
        assert_eq!(err.offset, 0);
        assert_eq!(err.to_string(), "Number exceeds 2^53-1 (offset=0)");

        // Just above the bound.
        let just_over = (MAX_SAFE_INTEGER + 1).to_be_bytes();
        assert!(read_u(&just_over, 0, 8, Endian::Big).is_err());
        assert_eq!(read_big_u(&just_over, 0, 8, Endian::Big), Ok(MAX_SAFE_INTEGER + 1));
    }

    #[test]
    fn signed_safe_boundary() {
        let mut buf = [0u8; 8];
        let min = -(MAX_SAFE_INTEGER as i64);
        write_i(&mut buf, min, 0, 8, Endian::Big).unwrap();
        assert_eq!(buf, min.to_be_bytes());
        assert_eq!(read_i(&buf, 0, 8, Endian::Big), Ok(min));

        let below = (min - 1).to_be_bytes();
        assert_eq!(
            read_i(&below, 0, 8, Endian::Big).unwrap_err().reason,
            Reason::NumberTooLarge
        );
        assert_eq!(read_big_i(&below, 0, 8, Endian::Big), Ok(min - 1));
    }

    #[test]
    fn negative_unsigned_write_fails_unsigned_read() {
        let mut buf = [0u8; 8];
        write_u(&mut buf, -5, 0, 8, Endian::Little).unwrap();
        assert_eq!(buf, (-5i64).to_le_bytes());
        assert_eq!(
            read_u(&buf, 0, 8, Endian::Little).unwrap_err().reason,
            Reason::NumberTooLarge
        );
        assert_eq!(read_i(&buf, 0, 8, Endian::Little), Ok(-5));
    }

    #[test]
    fn negated_zero_and_low_word_carry() {
        let mut buf = [0xaau8; 8];
        write_i(&mut buf, -0, 0, 8, Endian::Little).unwrap();
        assert_eq!(buf, [0; 8]);
        assert_eq!(read_i(&buf, 0, 8, Endian::Little), Ok(0));

        // A negative value whose low word is zero carries into the high word.
        let value = -(1i64 << 32);
        write_i(&mut buf, value, 0, 8, Endian::Little).unwrap();
        assert_eq!(buf, value.to_le_bytes());
        assert_eq!(read_i(&buf, 0, 8, Endian::Little), Ok(value));

        let mut buf = [0u8; 5];
        write_i(&mut buf, -1, 0, 5, Endian::Big).unwrap();
        assert_eq!(buf, [0xff; 5]);
        assert_eq!(read_i(&buf, 0, 5, Endian::Big), Ok(-1));
        assert_eq!(read_u(&buf, 0, 5, Endian::Big), Ok(0xff_ffff_ffff));
    }

    #[test]
    fn big_functions_cover_full_range() {
        let mut buf = [0u8; 8];
        write_big_u(&mut buf, u64::MAX, 0, 8, Endian::Big).unwrap();
        assert_eq!(read_big_u(&buf, 0, 8, Endian::Big), Ok(u64::MAX));
        write_big_i(&mut buf, i64::MIN, 0, 8, Endian::Little).unwrap();
        assert_eq!(read_big_i(&buf, 0, 8, Endian::Little), Ok(i64::MIN));
        write_big_i(&mut buf, -3, 0, 7, Endian::Little).unwrap();
        assert_eq!(read_big_i(&buf, 0, 7, Endian::Little), Ok(-3));
    }

    #[test]
    fn invalid_width() {
        let mut buf = [0u8; 16];
        for width in [0, 9] {
            let err = read_u(&buf, 3, width, Endian::Little).unwrap_err();
            assert_eq!(err.reason, Reason::InvalidWidth);
            assert_eq!(err.offset, 3);
            assert_eq!(
                write_i(&mut buf, 0, 3, width, Endian::Big).unwrap_err().reason,
                Reason::InvalidWidth
            );
        }
    }

    #[test]
    fn bounds() {
        let mut buf = [0u8; 4];
        let err = read_u(&buf, 2, 4, Endian::Little).unwrap_err();
        assert_eq!(err, EncodingError::new(2, Reason::OutOfBoundsRead, "read_u"));
        let err = write_u(&mut buf, 1, usize::MAX, 2, Endian::Little).unwrap_err();
        assert_eq!(err.reason, Reason::OutOfBoundsWrite);
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn floats() {
        let mut buf = [0u8; 8];
        assert_eq!(write_f32(&mut buf, 1.5, 0, Endian::Little), Ok(4));
        assert_eq!(&buf[..4], &1.5f32.to_le_bytes());
        assert_eq!(read_f32(&buf, 0, Endian::Little), Ok(1.5));
        write_f32(&mut buf, -0.25, 4, Endian::Big).unwrap();
        assert_eq!(&buf[4..], &[0xbe, 0x80, 0x00, 0x00]);
        assert_eq!(read_f32(&buf, 4, Endian::Big), Ok(-0.25));

        write_f64(&mut buf, core::f64::consts::PI, 0, Endian::Big).unwrap();
        assert_eq!(buf, core::f64::consts::PI.to_be_bytes());
        assert_eq!(read_f64(&buf, 0, Endian::Big), Ok(core::f64::consts::PI));
        assert_eq!(
            read_f64(&buf, 1, Endian::Little).unwrap_err().reason,
            Reason::OutOfBoundsRead
        );
    }
}
