//! Domain layer for boot-uploader.
//!
//! Holds the runtime configuration schema.  Nothing here touches the network
//! or the file system; loading the TOML file from disk is done by
//! `infrastructure::config_file`.

pub mod config;

pub use config::{ConfigError, DeviceConfig, LoggingConfig, UploadConfig, UploaderConfig};
