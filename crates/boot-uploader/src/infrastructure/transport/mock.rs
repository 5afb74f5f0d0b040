//! Recording transmitter for unit testing.
//!
//! `RecordingTransmitter` replaces the socket with an in-memory log.  Every
//! successful write is pushed into a `Mutex<Vec<...>>` so assertions can check
//! exactly which bytes were sent and in what order.
//!
//! # Failure injection
//!
//! Writes are numbered from 0 in call order.  A transmitter built with
//! [`RecordingTransmitter::failing_on`] fails the listed writes with a
//! `BrokenPipe` error and does not record them.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::upload_image::{ImageTransmitter, TransmitError};

/// A transmitter that records writes instead of sending them.
#[derive(Default)]
pub struct RecordingTransmitter {
    /// Bytes of each successful write, in call order.
    writes: Mutex<Vec<Vec<u8>>>,
    /// Total number of write calls, including failed ones.
    calls: Mutex<usize>,
    /// Call indices that fail.
    fail_on: HashSet<usize>,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transmitter whose writes at `indices` fail.
    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            fail_on: indices.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Snapshot of all successful writes.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Number of write calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }
}

#[async_trait]
impl ImageTransmitter for RecordingTransmitter {
    async fn write(&self, bytes: &[u8]) -> Result<(), TransmitError> {
        let index = {
            let mut calls = self.calls.lock().map_err(|_| TransmitError::NotConnected)?;
            let index = *calls;
            *calls += 1;
            index
        };

        if self.fail_on.contains(&index) {
            return Err(TransmitError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "injected failure",
            )));
        }

        self.writes
            .lock()
            .map_err(|_| TransmitError::NotConnected)?
            .push(bytes.to_vec());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
