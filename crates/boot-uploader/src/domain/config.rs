//! Uploader configuration types.
//!
//! [`UploaderConfig`] is the single source of truth for runtime settings.  It
//! is assembled in three layers, later layers winning:
//!
//! 1. Built-in defaults ([`UploaderConfig::default`]).
//! 2. An optional TOML file (`--config`).
//! 3. Command-line flags and their `BOOT_*` environment variables.
//!
//! ```toml
//! [device]
//! host = "localhost"
//! port = 2323
//!
//! [upload]
//! image_path = "bin/software/0_instructions_actual.bin"
//! grace_period_ms = 3000
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! Every field carries a `#[serde(default = ...)]` so a partial file, or an
//! empty one, still yields a complete config.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The device port is zero.
    #[error("device port must be non-zero")]
    ZeroPort,

    /// The device host is empty.
    #[error("device host must not be empty")]
    EmptyHost,

    /// The shutdown grace period is zero.
    #[error("grace period must be non-zero")]
    ZeroGracePeriod,

    /// No image path was given.
    #[error("image path must not be empty")]
    EmptyImagePath,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level uploader configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UploaderConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the device's boot agent listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Hostname or IP address; names are resolved at connect time.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port of the boot agent.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Image source and shutdown behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadConfig {
    /// Path of the binary image, read once at startup.
    #[serde(default = "default_image_path")]
    pub image_path: PathBuf,
    /// How long a close may take before the process exits anyway.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    2323
}
fn default_image_path() -> PathBuf {
    PathBuf::from("bin/software/0_instructions_actual.bin")
}
fn default_grace_period_ms() -> u64 {
    3000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            image_path: default_image_path(),
            grace_period_ms: default_grace_period_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl UploaderConfig {
    /// Parses a config from TOML text, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.upload.grace_period_ms)
    }

    /// `host:port` string used for connecting and in log lines.
    pub fn device_addr(&self) -> String {
        format!("{}:{}", self.device.host, self.device.port)
    }

    /// Checks the values that would make a session impossible.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.device.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.upload.grace_period_ms == 0 {
            return Err(ConfigError::ZeroGracePeriod);
        }
        if self.upload.image_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyImagePath);
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device_is_localhost_2323() {
        // Arrange / Act
        let cfg = UploaderConfig::default();

        // Assert
        assert_eq!(cfg.device.host, "localhost");
        assert_eq!(cfg.device.port, 2323);
        assert_eq!(cfg.device_addr(), "localhost:2323");
    }

    #[test]
    fn test_default_grace_period_is_3s() {
        let cfg = UploaderConfig::default();
        assert_eq!(cfg.grace_period(), Duration::from_secs(3));
    }

    #[test]
    fn test_default_image_path() {
        let cfg = UploaderConfig::default();
        assert_eq!(
            cfg.upload.image_path,
            PathBuf::from("bin/software/0_instructions_actual.bin")
        );
    }

    #[test]
    fn test_default_log_level_is_info() {
        assert_eq!(LoggingConfig::default().log_level, "info");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(UploaderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg = UploaderConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, UploaderConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_given_fields() {
        // Arrange
        let toml_str = r#"
[device]
port = 9000

[upload]
grace_period_ms = 500
"#;

        // Act
        let cfg = UploaderConfig::from_toml_str(toml_str).unwrap();

        // Assert
        assert_eq!(cfg.device.port, 9000);
        assert_eq!(cfg.device.host, "localhost");
        assert_eq!(cfg.grace_period(), Duration::from_millis(500));
        assert_eq!(cfg.logging.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result = UploaderConfig::from_toml_str("[[[ not valid toml");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_type_returns_parse_error() {
        let result = UploaderConfig::from_toml_str("[device]\nport = \"high\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_serialize_round_trip() {
        // Arrange
        let mut cfg = UploaderConfig::default();
        cfg.device.host = "10.0.0.7".to_string();
        cfg.upload.image_path = PathBuf::from("/tmp/boot.bin");

        // Act
        let text = toml::to_string_pretty(&cfg).unwrap();
        let restored = UploaderConfig::from_toml_str(&text).unwrap();

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut cfg = UploaderConfig::default();
        cfg.device.port = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroPort)));
    }

    #[test]
    fn test_validate_rejects_blank_host() {
        let mut cfg = UploaderConfig::default();
        cfg.device.host = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyHost)));
    }

    #[test]
    fn test_validate_rejects_zero_grace_period() {
        let mut cfg = UploaderConfig::default();
        cfg.upload.grace_period_ms = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroGracePeriod)));
    }

    #[test]
    fn test_validate_rejects_empty_image_path() {
        let mut cfg = UploaderConfig::default();
        cfg.upload.image_path = PathBuf::new();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyImagePath)));
    }
}
