//! boot-uploader library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does boot-uploader do?
//!
//! A device's boot agent listens on a TCP port.  The uploader:
//!
//! 1. Loads the image file once (at most 65535 bytes).
//! 2. Connects to the boot agent.
//! 3. Waits for the device to send an opcode byte.
//! 4. On `0xAA` sends a 2-byte little-endian length followed by the image.
//!    Every further `0xAA` triggers a complete resend.
//! 5. Exits when the connection ends: status 0 for a close it initiated
//!    itself, status 1 when the device hangs up or the socket fails.
//!
//! # Layers
//!
//! ```text
//! domain/          UploaderConfig (pure data, validation)
//! application/     UploadImageUseCase, SessionEnd / exit-code policy
//! infrastructure/
//!   transport/     TCP session, reader task, TransportEvent channel
//!   image_file     Image loading from disk
//!   config_file    TOML config loading from disk
//!   session_runner Event loop tying the transport to the use case
//! ```

/// Domain layer: configuration types with no I/O.
pub mod domain;

/// Application layer: the upload protocol handler and shutdown policy.
pub mod application;

/// Infrastructure layer: TCP transport, file loading, and the session loop.
pub mod infrastructure;
