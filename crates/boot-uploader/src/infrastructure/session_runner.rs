//! The session event loop.
//!
//! ```text
//! run_session()
//!  └─ TransportSession::connect()   -- raced against the interrupt signal
//!  └─ event loop (one task, one event at a time)
//!       ├─ Connected  -> log
//!       ├─ Data       -> UploadImageUseCase::handle_chunk (raced against the interrupt)
//!       ├─ End        -> SessionEnd::PeerEnded
//!       ├─ Error      -> SessionEnd::TransportFailed
//!       ├─ Closed     -> SessionEnd::Closed
//!       └─ interrupt  -> SessionEnd::Interrupted
//!  └─ close_within(grace, session.close())
//! ```
//!
//! The runner never exits the process itself; it returns a [`SessionReport`]
//! and leaves the exit to the caller.

use std::future::Future;
use std::sync::Arc;

use boot_core::Image;
use tracing::{error, info, warn};

use crate::application::session_end::{close_within, CloseOutcome, SessionEnd, SessionReport};
use crate::application::upload_image::{ChunkOutcome, UploadImageUseCase};
use crate::domain::config::UploaderConfig;
use crate::infrastructure::transport::{SessionState, TransportEvent, TransportSession};

/// Runs one upload session against the device named in `config`.
///
/// `shutdown` resolves when the process should stop (normally Ctrl-C).
/// Connection failures are reported in the returned [`SessionReport`], not as
/// errors.
pub async fn run_session<S>(config: &UploaderConfig, image: Image, shutdown: S) -> SessionReport
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let addr = config.device_addr();
    info!(state = ?SessionState::Connecting, "connecting to {addr}");

    // Interrupt takes priority over a connect that completes in the same poll.
    let connected = tokio::select! {
        biased;
        _ = &mut shutdown => None,
        result = TransportSession::connect(&config.device.host, config.device.port) => Some(result),
    };

    let (mut session, mut events) = match connected {
        None => {
            info!("interrupted while connecting to {addr}");
            return SessionReport {
                end: SessionEnd::Interrupted,
                close: CloseOutcome::NotNeeded,
                transfers: 0,
            };
        }
        Some(Err(e)) => {
            error!("connection error: {e}");
            return SessionReport {
                end: SessionEnd::ConnectFailed(e.to_string()),
                close: CloseOutcome::NotNeeded,
                transfers: 0,
            };
        }
        Some(Ok(pair)) => pair,
    };

    let mut use_case = UploadImageUseCase::new(image, Arc::new(session.transmitter()));

    let end = loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            event = events.recv() => Some(event),
        };

        let Some(event) = next else {
            info!("SIGINT received; closing connection");
            break SessionEnd::Interrupted;
        };
        let Some(event) = event else {
            break SessionEnd::Closed;
        };
        session.observe(&event);

        match event {
            TransportEvent::Connected { peer } => {
                info!(state = ?session.state(), "connected to device at {peer}");
            }
            TransportEvent::Data(chunk) => {
                // A device that stops reading can stall a write indefinitely,
                // so the interrupt stays armed while the transfer runs.
                let outcome = tokio::select! {
                    biased;
                    _ = &mut shutdown => None,
                    outcome = use_case.handle_chunk(&chunk) => Some(outcome),
                };
                match outcome {
                    None => {
                        info!("SIGINT received during transfer; abandoning it");
                        break SessionEnd::Interrupted;
                    }
                    Some(ChunkOutcome::Transferred(report)) if !report.is_complete() => {
                        warn!("transfer #{} incomplete; no retry", report.sequence);
                    }
                    Some(_) => {}
                }
            }
            TransportEvent::End => {
                info!("connection end requested");
                break SessionEnd::PeerEnded;
            }
            TransportEvent::Error(e) => {
                error!("connection error: {e}");
                break SessionEnd::TransportFailed(e.to_string());
            }
            TransportEvent::Closed => {
                info!("connection closed");
                break SessionEnd::Closed;
            }
        }
    };

    let grace = config.grace_period();
    let close = close_within(grace, session.close()).await;
    match &close {
        CloseOutcome::Completed | CloseOutcome::NotNeeded => {}
        CloseOutcome::Failed(e) => warn!("error while closing connection: {e}"),
        CloseOutcome::TimedOut(d) => warn!("close did not finish within {d:?}; exiting anyway"),
    }

    SessionReport {
        end,
        close,
        transfers: use_case.transfers(),
    }
}
