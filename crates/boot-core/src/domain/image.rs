//! The binary image loaded onto the device.

use std::sync::Arc;

use thiserror::Error;

use crate::protocol::codec::HEADER_SIZE;

/// Largest image the 2-byte length header can describe.
pub const MAX_IMAGE_LEN: usize = u16::MAX as usize;

/// Error type for image construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    /// The image exceeds the 16-bit length limit.
    #[error("image is {len} bytes; the length header allows at most {max}")]
    TooLarge { len: usize, max: usize },
}

/// An immutable image buffer.
///
/// Cloning is cheap: the bytes are shared behind an `Arc` and never mutated
/// after construction.  The length is guaranteed to fit the wire header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Arc<[u8]>,
}

impl Image {
    /// Wraps `bytes` as an image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::TooLarge`] if `bytes.len() > MAX_IMAGE_LEN`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.len() > MAX_IMAGE_LEN {
            return Err(ImageError::TooLarge {
                len: bytes.len(),
                max: MAX_IMAGE_LEN,
            });
        }
        Ok(Self {
            bytes: bytes.into(),
        })
    }

    /// Image length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The little-endian length header announcing this image.
    pub fn length_header(&self) -> [u8; HEADER_SIZE] {
        // Length is bounded by `from_bytes`, so the cast is lossless.
        (self.bytes.len() as u16).to_le_bytes()
    }
}

impl TryFrom<Vec<u8>> for Image {
    type Error = ImageError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
