//! Infrastructure layer for the uploader.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `boot_core`, but MUST NOT be imported by the `application` or `domain`
//! layers (test doubles excepted).
//!
//! # Sub-modules
//!
//! - **`transport`** – TCP connection to the boot agent.  A reader task turns
//!   socket activity into [`transport::TransportEvent`]s on an `mpsc` channel;
//!   writes go through [`transport::TcpTransmitter`].  A recording mock is
//!   provided for tests.
//!
//! - **`image_file`** – Reads the image from disk and enforces the size limit.
//!
//! - **`config_file`** – Reads a TOML config file into an `UploaderConfig`.
//!
//! - **`session_runner`** – The event loop that connects, feeds chunks to the
//!   upload use case, reacts to the interrupt signal, and closes the socket
//!   within the grace period.

pub mod config_file;
pub mod image_file;
pub mod session_runner;
pub mod transport;

pub use session_runner::run_session;
