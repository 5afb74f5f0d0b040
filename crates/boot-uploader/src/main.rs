//! Boot uploader entry point.
//!
//! Connects to a device's boot agent, waits for its ready opcode (`0xAA`) and
//! answers with a 2-byte little-endian length followed by the image.
//!
//! # Usage
//!
//! ```text
//! boot-uploader [OPTIONS]
//!
//! Options:
//!   --config <PATH>           TOML config file
//!   --host <HOST>             Device host name or IP [default: localhost]
//!   --port <PORT>             Device boot agent port [default: 2323]
//!   --image <PATH>            Image file [default: bin/software/0_instructions_actual.bin]
//!   --grace-period-ms <MS>    Maximum time to wait for the socket to close [default: 3000]
//!   --log-level <LEVEL>       Log level when RUST_LOG is unset [default: info]
//! ```
//!
//! Every option can also be set through its `BOOT_*` environment variable.
//! Command-line values override the config file, which overrides defaults.
//!
//! # Exit status
//!
//! `0` after Ctrl-C or a clean close, `1` when the device ends the stream,
//! the connection fails, or startup fails.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use boot_uploader::domain::UploaderConfig;
use boot_uploader::infrastructure::{config_file::load_config, image_file::load_image, run_session};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Uploads a binary image to a device boot agent over TCP.
#[derive(Debug, Parser)]
#[command(
    name = "boot-uploader",
    about = "Uploads a binary image to a device boot agent over TCP",
    version
)]
struct Cli {
    /// TOML config file.  Values given on the command line take precedence.
    #[arg(long, env = "BOOT_CONFIG")]
    config: Option<PathBuf>,

    /// Host name or IP address of the device.
    #[arg(long, env = "BOOT_HOST")]
    host: Option<String>,

    /// TCP port of the device boot agent.
    #[arg(long, env = "BOOT_PORT")]
    port: Option<u16>,

    /// Path of the image to upload (at most 65535 bytes).
    #[arg(long, env = "BOOT_IMAGE")]
    image: Option<PathBuf>,

    /// How long to wait for the connection to close before exiting anyway.
    #[arg(long, env = "BOOT_GRACE_PERIOD_MS")]
    grace_period_ms: Option<u64>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "BOOT_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Builds the effective [`UploaderConfig`]: defaults, then the config
    /// file, then command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the final
    /// configuration is invalid.
    fn into_config(self) -> anyhow::Result<UploaderConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => UploaderConfig::default(),
        };

        if let Some(host) = self.host {
            config.device.host = host;
        }
        if let Some(port) = self.port {
            config.device.port = port;
        }
        if let Some(image) = self.image {
            config.upload.image_path = image;
        }
        if let Some(ms) = self.grace_period_ms {
            config.upload.grace_period_ms = ms;
        }
        if let Some(level) = self.log_level {
            config.logging.log_level = level;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Resolves on Ctrl-C.  If the handler cannot be installed it never resolves.
async fn interrupt_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {}
        Err(e) => {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    info!(
        "boot uploader starting: device={}, image={}",
        config.device_addr(),
        config.upload.image_path.display()
    );

    let image = load_image(&config.upload.image_path).context("failed to load image")?;
    info!("loaded image: {} bytes", image.len());

    let report = run_session(&config, image, interrupt_signal()).await;
    info!(
        end = ?report.end,
        close = ?report.close,
        transfers = report.transfers,
        "boot uploader stopped"
    );

    // Exit here rather than returning so runtime teardown cannot delay it.
    std::process::exit(report.exit_code());
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};
    use std::time::Duration;

    /// Parses `args` with every `BOOT_*` fallback removed, so the result does
    /// not depend on the environment running the tests.
    fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
        let matches = Cli::command()
            .mut_args(|arg| arg.env(None::<&str>))
            .try_get_matches_from(args.iter().copied())?;
        Cli::from_arg_matches(&matches)
    }

    fn empty_cli() -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            image: None,
            grace_period_ms: None,
            log_level: None,
        }
    }

    #[test]
    fn test_cli_no_arguments_parses() {
        let cli = parse_args(&["boot-uploader"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.grace_period_ms.is_none());
    }

    #[test]
    fn test_cli_host_and_port_override() {
        // Arrange
        let cli = parse_args(&["boot-uploader", "--host", "10.0.0.5", "--port", "9000"]).unwrap();

        // Act
        let config = cli.into_config().unwrap();

        // Assert
        assert_eq!(config.device_addr(), "10.0.0.5:9000");
    }

    #[test]
    fn test_cli_image_override() {
        let cli = parse_args(&["boot-uploader", "--image", "/tmp/fw.bin"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.upload.image_path, PathBuf::from("/tmp/fw.bin"));
    }

    #[test]
    fn test_cli_grace_period_override() {
        let cli = parse_args(&["boot-uploader", "--grace-period-ms", "250"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.grace_period(), Duration::from_millis(250));
    }

    #[test]
    fn test_cli_log_level_override() {
        let cli = parse_args(&["boot-uploader", "--log-level", "debug"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.logging.log_level, "debug");
    }

    #[test]
    fn test_cli_invalid_port_is_rejected_by_parser() {
        let result = parse_args(&["boot-uploader", "--port", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_config_without_overrides_is_default() {
        let config = empty_cli().into_config().unwrap();
        assert_eq!(config, UploaderConfig::default());
    }

    #[test]
    fn test_into_config_zero_port_returns_error() {
        // Arrange
        let cli = Cli {
            port: Some(0),
            ..empty_cli()
        };

        // Act
        let result = cli.into_config();

        // Assert: must return an error, not panic
        assert!(result.is_err());
    }

    #[test]
    fn test_into_config_zero_grace_period_returns_error() {
        let cli = Cli {
            grace_period_ms: Some(0),
            ..empty_cli()
        };
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_into_config_missing_config_file_returns_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/path/that/cannot/exist/uploader.toml")),
            ..empty_cli()
        };
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_cli_values_override_config_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("boot_cli_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[device]\nhost = \"file-host\"\nport = 4000\n").unwrap();
        let cli = Cli {
            config: Some(path.clone()),
            port: Some(5000),
            ..empty_cli()
        };

        // Act
        let config = cli.into_config().unwrap();

        // Assert – host from the file, port from the command line
        assert_eq!(config.device.host, "file-host");
        assert_eq!(config.device.port, 5000);

        std::fs::remove_file(&path).ok();
    }
}
