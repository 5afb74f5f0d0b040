//! Protocol module containing the opcode table and the length header codec.

pub mod codec;
pub mod opcode;

pub use codec::{decode_length_header, encode_length_header, ProtocolError, HEADER_SIZE};
pub use opcode::Opcode;
