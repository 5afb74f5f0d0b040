//! TCP transport to the device's boot agent.
//!
//! Architecture:
//! - `TransportSession` owns one TCP stream, split into halves.
//! - A reader task forwards socket activity as [`TransportEvent`]s on an
//!   `mpsc` channel: `Connected` first, then any number of `Data` chunks, then
//!   `End` or `Error`, and finally `Closed`.
//! - Writes go through [`TcpTransmitter`], which shares the write half.  All
//!   writes use one stream, so they reach the device in issue order.

pub mod mock;

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::application::upload_image::{ImageTransmitter, TransmitError};

/// Size of each socket read.  One read becomes one `Data` chunk.
const READ_BUF_SIZE: usize = 4096;

/// Capacity of the event channel between the reader task and the session loop.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors raised by the transport itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("failed to connect to device at {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle of a connection, as seen by whoever consumes its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The socket exists but the `Connected` notification has not been
    /// observed yet.
    Connecting,
    Connected,
    /// Closed locally, ended by the peer, or failed.
    Closed,
}

/// Notifications produced by the reader task.
#[derive(Debug)]
pub enum TransportEvent {
    /// The connection is up.
    Connected { peer: SocketAddr },
    /// Bytes arrived from the device.
    Data(Vec<u8>),
    /// The device closed its side of the stream.
    End,
    /// Reading from the socket failed.
    Error(std::io::Error),
    /// The read side is finished; no further events follow.
    Closed,
}

/// Shared handle to the write half of the connection.
///
/// Cheap to clone.  Once the session is closed every write fails with
/// [`TransmitError::NotConnected`].
#[derive(Clone)]
pub struct TcpTransmitter {
    write_half: Arc<Mutex<Option<OwnedWriteHalf>>>,
}

#[async_trait]
impl ImageTransmitter for TcpTransmitter {
    async fn write(&self, bytes: &[u8]) -> Result<(), TransmitError> {
        let mut guard = self.write_half.lock().await;
        match guard.as_mut() {
            Some(w) => {
                w.write_all(bytes).await?;
                debug!("wrote {} bytes to device", bytes.len());
                Ok(())
            }
            None => Err(TransmitError::NotConnected),
        }
    }
}

/// A single outbound TCP connection to the boot agent.
pub struct TransportSession {
    peer: SocketAddr,
    state: SessionState,
    write_half: Arc<Mutex<Option<OwnedWriteHalf>>>,
    reader: JoinHandle<()>,
}

impl TransportSession {
    /// Connects to `host:port` and starts the reader task.
    ///
    /// Host names are resolved by the OS.  No timeout is applied beyond the
    /// OS connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectFailed`] if resolution or the TCP
    /// handshake fails.
    pub async fn connect(
        host: &str,
        port: u16,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::ConnectFailed {
                addr: format!("{host}:{port}"),
                source,
            })?;
        Self::from_stream(stream)
    }

    /// Wraps an already connected stream.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the peer address cannot be read.
    pub fn from_stream(
        stream: TcpStream,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let peer = stream.peer_addr()?;
        // Opcodes are single bytes; don't let Nagle hold back our replies.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("could not disable Nagle on device socket: {e}");
        }

        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let reader = tokio::spawn(read_loop(read_half, peer, tx));

        let session = Self {
            peer,
            state: SessionState::Connecting,
            write_half: Arc::new(Mutex::new(Some(write_half))),
            reader,
        };
        Ok((session, rx))
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns a transmitter that writes on this connection.
    pub fn transmitter(&self) -> TcpTransmitter {
        TcpTransmitter {
            write_half: Arc::clone(&self.write_half),
        }
    }

    /// Updates the session state from an event seen by the caller.
    ///
    /// `Closed` is final; a late `Connected` does not reopen the session.
    pub fn observe(&mut self, event: &TransportEvent) {
        self.state = match (self.state, event) {
            (SessionState::Closed, _) => SessionState::Closed,
            (_, TransportEvent::Connected { .. }) => SessionState::Connected,
            (_, TransportEvent::End | TransportEvent::Error(_) | TransportEvent::Closed) => {
                SessionState::Closed
            }
            (state, TransportEvent::Data(_)) => state,
        };
    }

    /// Shuts down the write side, then releases the whole connection.
    ///
    /// Calling `close` on an already closed session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the write-side shutdown fails.  The
    /// connection is released either way.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        let write_half = self.write_half.lock().await.take();
        self.state = SessionState::Closed;

        let result = match write_half {
            Some(mut w) => {
                debug!("shutting down write side to {}", self.peer);
                w.shutdown().await.map_err(TransportError::from)
            }
            None => Ok(()),
        };
        self.reader.abort();
        result
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Reads from the socket and forwards each read as an event.
async fn read_loop(mut reader: OwnedReadHalf, peer: SocketAddr, tx: mpsc::Sender<TransportEvent>) {
    debug!("reader started for {peer}");
    if tx.send(TransportEvent::Connected { peer }).await.is_err() {
        return;
    }

    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let event = match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("device at {peer} closed its write side (EOF)");
                let _ = tx.send(TransportEvent::End).await;
                break;
            }
            Ok(n) => TransportEvent::Data(buf[..n].to_vec()),
            Err(e) => {
                let _ = tx.send(TransportEvent::Error(e)).await;
                break;
            }
        };
        if tx.send(event).await.is_err() {
            debug!("event receiver dropped; stopping reader");
            return;
        }
    }

    let _ = tx.send(TransportEvent::Closed).await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (TransportSession, mpsc::Receiver<TransportEvent>, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (connect, accept) = tokio::join!(
            TransportSession::connect("127.0.0.1", port),
            listener.accept()
        );
        let (session, events) = connect.unwrap();
        let (device, _) = accept.unwrap();
        (session, events, device)
    }

    #[tokio::test]
    async fn test_first_event_is_connected() {
        // Arrange
        let (mut session, mut events, _device) = connected_pair().await;
        assert_eq!(session.state(), SessionState::Connecting);

        // Act
        let event = events.recv().await.unwrap();
        session.observe(&event);

        // Assert
        match event {
            TransportEvent::Connected { peer } => assert_eq!(peer, session.peer()),
            other => panic!("expected Connected, got {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_closed_state_is_not_reopened_by_late_events() {
        let (mut session, _events, _device) = connected_pair().await;
        let peer = session.peer();
        session.close().await.unwrap();

        session.observe(&TransportEvent::Connected { peer });
        session.observe(&TransportEvent::Data(vec![0xAA]));

        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_device_bytes_arrive_as_data() {
        let (_session, mut events, mut device) = connected_pair().await;
        events.recv().await; // Connected

        device.write_all(&[0xAA]).await.unwrap();

        match events.recv().await {
            Some(TransportEvent::Data(chunk)) => assert_eq!(chunk, vec![0xAA]),
            other => panic!("expected Data, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_device_hangup_yields_end_then_closed() {
        // Arrange
        let (mut session, mut events, device) = connected_pair().await;
        events.recv().await; // Connected

        // Act
        drop(device);

        // Assert
        let end = events.recv().await.unwrap();
        assert!(matches!(end, TransportEvent::End));
        session.observe(&end);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(events.recv().await, Some(TransportEvent::Closed)));
    }

    #[tokio::test]
    async fn test_transmitter_writes_in_issue_order() {
        // Arrange
        let (session, _events, mut device) = connected_pair().await;
        let tx = session.transmitter();

        // Act
        tx.write(&[0x05, 0x00]).await.unwrap();
        tx.write(&[1, 2, 3, 4, 5]).await.unwrap();

        // Assert
        let mut buf = [0u8; 7];
        device.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x05, 0x00, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_close_sends_eof_and_disables_writes() {
        // Arrange
        let (mut session, _events, mut device) = connected_pair().await;
        let tx = session.transmitter();

        // Act
        session.close().await.unwrap();

        // Assert – the device sees end-of-stream
        let mut rest = Vec::new();
        device.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(tx.write(&[0x00]).await, Err(TransmitError::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_twice_is_ok() {
        let (mut session, _events, _device) = connected_pair().await;
        session.close().await.unwrap();
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        // Arrange – grab a free port, then release it
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        // Act
        let result = TransportSession::connect("127.0.0.1", port).await;

        // Assert
        match result {
            Err(TransportError::ConnectFailed { addr, .. }) => {
                assert_eq!(addr, format!("127.0.0.1:{port}"));
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("connect must fail"),
        }
    }
}
