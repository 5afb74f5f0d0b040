//! Session termination policy.
//!
//! A session ends for exactly one [`SessionEnd`] reason.  After that the
//! connection is closed with [`close_within`], which never waits longer than
//! the configured grace period.  The process exit code depends only on the
//! end reason:
//!
//! | End reason        | Exit code |
//! |-------------------|-----------|
//! | `Interrupted`     | 0         |
//! | `Closed`          | 0         |
//! | `PeerEnded`       | 1         |
//! | `ConnectFailed`   | 1         |
//! | `TransportFailed` | 1         |

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// An interrupt signal asked the uploader to stop.
    Interrupted,
    /// The connection closed without an end-of-stream or error first.
    Closed,
    /// The device ended the stream.
    PeerEnded,
    /// The connection could not be established.
    ConnectFailed(String),
    /// The socket reported an error.
    TransportFailed(String),
}

impl SessionEnd {
    /// Process exit code for this end reason.
    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }

    /// Whether the session ended on the uploader's own terms.
    pub fn is_clean(&self) -> bool {
        matches!(self, SessionEnd::Interrupted | SessionEnd::Closed)
    }
}

/// How closing the connection went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// There was no connection to close.
    NotNeeded,
    /// The close finished inside the grace period.
    Completed,
    /// The close finished with an error inside the grace period.
    Failed(String),
    /// The close was still pending when the grace period ran out.
    TimedOut(Duration),
}

/// Everything the binary needs to log and exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub close: CloseOutcome,
    /// Transfers started during the session.
    pub transfers: u64,
}

impl SessionReport {
    pub fn exit_code(&self) -> i32 {
        self.end.exit_code()
    }
}

/// Drives `close` for at most `grace`.
///
/// If `close` has not resolved when the deadline passes it is dropped and
/// [`CloseOutcome::TimedOut`] is returned, so a hung socket can never stall
/// shutdown.
pub async fn close_within<F, E>(grace: Duration, close: F) -> CloseOutcome
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(grace, close).await {
        Ok(Ok(())) => CloseOutcome::Completed,
        Ok(Err(e)) => CloseOutcome::Failed(e.to_string()),
        Err(_) => CloseOutcome::TimedOut(grace),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
