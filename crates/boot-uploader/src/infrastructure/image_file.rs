//! Loads the image file from disk.
//!
//! The whole file is read once at startup and wrapped in a
//! [`boot_core::Image`], which rejects anything the 16-bit length header
//! cannot describe.

use std::path::{Path, PathBuf};

use boot_core::{Image, ImageError};
use thiserror::Error;

/// Error type for image loading.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    /// The file could not be read.
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is larger than the protocol allows.
    #[error("image {path} cannot be sent: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// Reads `path` into an [`Image`].
///
/// # Errors
///
/// Returns [`ImageLoadError::Io`] if the file cannot be read and
/// [`ImageLoadError::Invalid`] if it exceeds 65535 bytes.
pub fn load_image(path: &Path) -> Result<Image, ImageLoadError> {
    let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Image::from_bytes(bytes).map_err(|source| ImageLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
