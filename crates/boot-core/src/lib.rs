//! # boot-core
//!
//! Shared library for the boot uploader containing the wire protocol spoken
//! with a device's boot agent and the in-memory image type.
//!
//! It has zero dependencies on sockets, async runtimes, or the file system.
//!
//! # Protocol overview
//!
//! The device drives the exchange.  After the TCP connection is up it sends a
//! single opcode byte.  When that byte is [`Opcode::SendImage`] (`0xAA`) the
//! uploader answers with:
//!
//! ```text
//! [len_lo:1][len_hi:1][image:len]
//! ```
//!
//! There is no acknowledgement frame and no checksum.
//!
//! - **`protocol`** – opcode classification and the 2-byte length header codec.
//! - **`domain`** – the [`Image`] loaded onto the device, with its 16-bit size
//!   limit enforced at construction.

pub mod domain;
pub mod protocol;

pub use domain::image::{Image, ImageError, MAX_IMAGE_LEN};
pub use protocol::codec::{decode_length_header, encode_length_header, ProtocolError};
pub use protocol::opcode::Opcode;
