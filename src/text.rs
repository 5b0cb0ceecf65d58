//! Text encodings used by the string codecs.

use crate::error::Reason;
use alloc::string::String;
use alloc::vec::Vec;
use zerocopy::byteorder::{LE, U16};
use zerocopy::FromBytes;

/// Selects how strings are converted to and from bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Default)]
pub enum Encoding {
    /// One byte per character (Latin-1). Characters above U+00FF keep only their low byte.
    #[default]
    Binary,
    /// Like `Binary` when writing. When reading, the high bit of each byte is cleared.
    Ascii,
    /// UTF-8. Malformed input is decoded with replacement characters.
    Utf8,
    /// UTF-16, little-endian code units. Unpaired surrogates are decoded with replacement
    /// characters; an odd byte count is rejected.
    Utf16Le,
    /// Lowercase hexadecimal, two characters per byte.
    Hex,
}

impl Encoding {
    /// Number of bytes `s` occupies once encoded. This does not allocate.
    pub fn byte_len(self, s: &str) -> Result<usize, Reason> {
        match self {
            Self::Binary | Self::Ascii => Ok(s.chars().count()),
            Self::Utf8 => Ok(s.len()),
            Self::Utf16Le => Ok(s.encode_utf16().count() * 2),
            Self::Hex => {
                if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(Reason::InvalidString);
                }
                Ok(s.len() / 2)
            }
        }
    }

    /// Encodes `s`.
    pub fn encode(self, s: &str) -> Result<Vec<u8>, Reason> {
        match self {
            Self::Binary | Self::Ascii => Ok(s.chars().map(|c| c as u32 as u8).collect()),
            Self::Utf8 => Ok(s.as_bytes().to_vec()),
            Self::Utf16Le => {
                let mut out = Vec::with_capacity(s.len() * 2);
                for unit in s.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(out)
            }
            Self::Hex => hex::decode(s).map_err(|_| Reason::InvalidString),
        }
    }

    /// Decodes `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<String, Reason> {
        match self {
            Self::Binary => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => Ok(bytes.iter().map(|&b| char::from(b & 0x7f)).collect()),
            Self::Utf8 => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Self::Utf16Le => {
                let Ok(wchars) = <[U16<LE>]>::ref_from_bytes(bytes) else {
                    return Err(Reason::InvalidString);
                };
                let units: Vec<u16> = wchars.iter().map(|c| c.get()).collect();
                Ok(String::from_utf16_lossy(&units))
            }
            Self::Hex => Ok(hex::encode(bytes)),
        }
    }
}
