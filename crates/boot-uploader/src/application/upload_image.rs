//! UploadImageUseCase: answers the device's ready opcode with the image.
//!
//! The use case owns the image and delegates the actual socket writes to an
//! [`ImageTransmitter`] trait object, so it can be driven in tests without a
//! network.
//!
//! # State machine
//!
//! ```text
//!          0xAA
//!  Idle ──────────► Transferring ── header write, payload write ──┐
//!   ▲                                                             │
//!   └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every ready opcode re-runs the full transfer.  Any other opcode is logged
//! and ignored.

use std::sync::Arc;

use async_trait::async_trait;
use boot_core::{Image, Opcode};
use thiserror::Error;
use tracing::{debug, error, info};

/// Error returned by an [`ImageTransmitter`] write.
#[derive(Debug, Error)]
pub enum TransmitError {
    /// The connection has already been closed locally.
    #[error("connection is not open")]
    NotConnected,
    /// The socket write failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink for bytes headed to the device.
///
/// Writes on one transmitter must reach the peer in the order they complete.
#[async_trait]
pub trait ImageTransmitter: Send + Sync {
    /// Writes all of `bytes`, resolving once they are handed to the transport.
    async fn write(&self, bytes: &[u8]) -> Result<(), TransmitError>;
}

/// Protocol handler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// Waiting for an opcode.
    Idle,
    /// Writing the header and image in answer to a ready opcode.
    Transferring,
}

/// Result of one transfer attempt.  Each write is reported on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// 1-based transfer number within this session.
    pub sequence: u64,
    /// Image length announced in the header.
    pub image_len: usize,
    /// Whether the 2-byte header write completed.
    pub header_sent: bool,
    /// Whether the image write completed.
    pub payload_sent: bool,
}

impl TransferReport {
    pub fn is_complete(&self) -> bool {
        self.header_sent && self.payload_sent
    }
}

/// What the handler did with an inbound chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The chunk was empty and carried no opcode.
    Empty,
    /// The opcode is not part of this protocol; nothing was written.
    Unrecognized(u8),
    /// The ready opcode triggered a transfer.
    Transferred(TransferReport),
}

/// The upload protocol handler.
pub struct UploadImageUseCase {
    image: Image,
    transmitter: Arc<dyn ImageTransmitter>,
    state: HandlerState,
    transfers: u64,
}

impl UploadImageUseCase {
    /// Creates a handler that serves `image` through `transmitter`.
    pub fn new(image: Image, transmitter: Arc<dyn ImageTransmitter>) -> Self {
        Self {
            image,
            transmitter,
            state: HandlerState::Idle,
            transfers: 0,
        }
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// Number of transfers started so far.
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Handles one chunk delivered by the transport.
    ///
    /// Only the first byte is inspected; the rest of the chunk is ignored.
    /// Write failures are logged and reported in the outcome, never returned
    /// as errors.
    pub async fn handle_chunk(&mut self, chunk: &[u8]) -> ChunkOutcome {
        match Opcode::from_chunk(chunk) {
            None => {
                debug!("empty chunk from device; ignoring");
                ChunkOutcome::Empty
            }
            Some(Opcode::Unknown(byte)) => {
                info!("{} Unknown opcode", Opcode::Unknown(byte));
                ChunkOutcome::Unrecognized(byte)
            }
            Some(Opcode::SendImage) => {
                info!("{} Clearing counter", Opcode::SendImage);
                if chunk.len() > 1 {
                    debug!("ignoring {} trailing byte(s) after opcode", chunk.len() - 1);
                }
                ChunkOutcome::Transferred(self.transfer().await)
            }
        }
    }

    /// Writes the length header, then the image, as two separate writes.
    ///
    /// A failed header write does not prevent the image write.
    async fn transfer(&mut self) -> TransferReport {
        self.state = HandlerState::Transferring;
        self.transfers += 1;
        let sequence = self.transfers;

        let header = self.image.length_header();
        let header_sent = match self.transmitter.write(&header).await {
            Ok(()) => {
                info!(
                    "Program size sent to device: {:x} {:x}",
                    header[0], header[1]
                );
                true
            }
            Err(e) => {
                error!("transfer #{sequence}: failed to send program size: {e}");
                false
            }
        };

        let payload_sent = match self.transmitter.write(self.image.as_bytes()).await {
            Ok(()) => {
                info!("Program sent to device ({} bytes)", self.image.len());
                true
            }
            Err(e) => {
                error!("transfer #{sequence}: failed to send program: {e}");
                false
            }
        };

        self.state = HandlerState::Idle;
        TransferReport {
            sequence,
            image_len: self.image.len(),
            header_sent,
            payload_sent,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
