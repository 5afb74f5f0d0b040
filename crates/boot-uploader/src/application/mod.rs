//! Application layer use cases for the uploader.
//!
//! - **`upload_image`** – The upload protocol handler.  Classifies each inbound
//!   chunk by its first byte and, on the ready opcode, writes the length header
//!   and the image through an injected [`upload_image::ImageTransmitter`].
//!
//! - **`session_end`** – How a session ended, how the closing of the socket
//!   went, and the process exit code that follows from both.

pub mod session_end;
pub mod upload_image;
