//! The single error type shared by every codec, reader and writer in this crate.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, EncodingError>;

/// Why an encode or decode operation failed.
#[derive(Error, Copy, Clone, Eq, PartialEq, Debug)]
pub enum Reason {
    /// A read needed more bytes than remain in the buffer.
    #[error("Out of bounds read")]
    OutOfBoundsRead,
    /// A write needed more room than the destination has.
    #[error("Out of bounds write")]
    OutOfBoundsWrite,
    /// A value's magnitude is larger than 2^53-1.
    #[error("Number exceeds 2^53-1")]
    NumberTooLarge,
    /// A compact varint was not encoded in its shortest form.
    #[error("Non-canonical varint")]
    NonCanonicalVarint,
    /// A length-prefixed value is longer than the caller allows.
    #[error("String exceeds limit")]
    StringExceedsLimit,
    /// A stored checksum does not match the data it covers.
    #[error("Checksum mismatch")]
    ChecksumMismatch,
    /// A fixed-width codec was asked for a width outside `1..=8`.
    #[error("Invalid byte width")]
    InvalidWidth,
    /// A hash was not exactly 32 bytes.
    #[error("Invalid hash")]
    InvalidHash,
    /// Text could not be converted with the requested encoding.
    #[error("Invalid string")]
    InvalidString,
    /// A span was closed, but none was open.
    #[error("No open span")]
    NoOpenSpan,
    /// A pre-sized writer was rendered before it was filled exactly.
    #[error("Invalid size")]
    SizeMismatch,
    /// The writer variant does not support the requested operation.
    #[error("Unsupported operation")]
    Unsupported,
}

/// Error returned by every fallible operation in this crate.
///
/// `offset` is the position in the buffer (or the writer's output) at which the problem
/// was detected. `op` names the operation that raised the error; it is only meant for
/// diagnostics and does not take part in `Display`.
#[derive(Error, Copy, Clone, Eq, PartialEq, Debug)]
#[error("{reason} (offset={offset})")]
pub struct EncodingError {
    /// Byte offset at which the failure was detected.
    pub offset: usize,
    /// The reason for the failure.
    pub reason: Reason,
    /// Name of the operation that failed.
    pub op: &'static str,
}

impl EncodingError {
    /// Constructor
    pub const fn new(offset: usize, reason: Reason, op: &'static str) -> Self {
        Self { offset, reason, op }
    }

    /// Moves the offset by `base`. Used when a value was encoded into scratch space and the
    /// error must be reported relative to the real output.
    pub(crate) const fn shift(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }
}

/// Bounds assertion: fails unless `len` bytes starting at `offset` fit in `total`.
#[inline(always)]
pub(crate) fn check(
    total: usize,
    offset: usize,
    len: usize,
    reason: Reason,
    op: &'static str,
) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= total => Ok(()),
        _ => Err(EncodingError::new(offset, reason, op)),
    }
}

/// Value assertion: fails with `reason` unless `cond` holds.
#[inline(always)]
pub(crate) fn enforce(cond: bool, offset: usize, reason: Reason, op: &'static str) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(EncodingError::new(offset, reason, op))
    }
}
