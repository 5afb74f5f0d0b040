//! Codec for the length header that precedes the image on the wire.
//!
//! Wire format:
//! ```text
//! [len_lo:1][len_hi:1]
//! ```
//! Total header size: 2 bytes, little-endian unsigned 16-bit length.

use thiserror::Error;

/// Size of the length header in bytes.
pub const HEADER_SIZE: usize = 2;

/// Errors that can occur while encoding or decoding the length header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The length does not fit in the 16-bit header.
    #[error("length {len} does not fit in a 16-bit header (max {max})")]
    LengthOverflow { len: usize, max: usize },

    /// The byte slice is shorter than the header.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// Encodes `len` as the 2-byte little-endian length header.
///
/// # Errors
///
/// Returns [`ProtocolError::LengthOverflow`] when `len > u16::MAX`.
///
/// # Examples
///
/// ```rust
/// use boot_core::encode_length_header;
///
/// assert_eq!(encode_length_header(5).unwrap(), [0x05, 0x00]);
/// assert_eq!(encode_length_header(0x1234).unwrap(), [0x34, 0x12]);
/// ```
pub fn encode_length_header(len: usize) -> Result<[u8; HEADER_SIZE], ProtocolError> {
    let len16 = u16::try_from(len).map_err(|_| ProtocolError::LengthOverflow {
        len,
        max: u16::MAX as usize,
    })?;
    Ok([(len16 & 0xFF) as u8, ((len16 >> 8) & 0xFF) as u8])
}

/// Decodes the length header at the start of `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] if fewer than two bytes are
/// available.
pub fn decode_length_header(bytes: &[u8]) -> Result<u16, ProtocolError> {
    match bytes {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
