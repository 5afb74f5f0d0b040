//! Opcodes sent by the device's boot agent.
//!
//! The device sends one opcode byte at a time.  Only the first byte of each
//! chunk delivered by the transport is classified; a chunk that happens to
//! carry several opcodes, or an opcode split across reads, is not reassembled.

use std::fmt;

/// Wire value of the "clear counter / send image" request.
pub const SEND_IMAGE: u8 = 0xAA;

/// A single opcode received from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// The device cleared its load counter and is ready to receive the image.
    SendImage,
    /// Any byte this protocol version does not recognise.
    Unknown(u8),
}

impl Opcode {
    /// Classifies a raw opcode byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SEND_IMAGE => Opcode::SendImage,
            other => Opcode::Unknown(other),
        }
    }

    /// Extracts the opcode carried by an inbound chunk.
    ///
    /// Only byte 0 is inspected.  Returns `None` for an empty chunk.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use boot_core::Opcode;
    ///
    /// assert_eq!(Opcode::from_chunk(&[0xAA, 0x01]), Some(Opcode::SendImage));
    /// assert_eq!(Opcode::from_chunk(&[0x01, 0xAA]), Some(Opcode::Unknown(0x01)));
    /// assert_eq!(Opcode::from_chunk(&[]), None);
    /// ```
    pub fn from_chunk(chunk: &[u8]) -> Option<Self> {
        chunk.first().copied().map(Self::from_byte)
    }

    /// Returns the raw wire byte.
    pub fn as_byte(self) -> u8 {
        match self {
            Opcode::SendImage => SEND_IMAGE,
            Opcode::Unknown(b) => b,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.as_byte())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
