//! TOML config file loading.
//!
//! The config file is optional.  When one is named on the command line it must
//! exist; a missing file is an error rather than a silent fallback to
//! defaults.

use std::path::Path;

use crate::domain::config::{ConfigError, UploaderConfig};

/// Loads and parses the config file at `path`.
///
/// Fields absent from the file keep their defaults.  The result is not
/// validated here because command-line overrides are applied afterwards.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<UploaderConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    UploaderConfig::from_toml_str(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
