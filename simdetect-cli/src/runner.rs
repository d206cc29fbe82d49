//! Shared command setup: configuration and logging.

use simdetect::config::{config_file_path, ConfigFile};
use simdetect::logging::{init_logging, LoggingGuard};
use tracing::{info, warn};

use crate::error::CliError;

/// Loaded configuration plus the logging guard for one CLI invocation.
pub struct CliRunner {
    config: ConfigFile,
    _logging: Option<LoggingGuard>,
}

impl CliRunner {
    /// Load the config file and install logging.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let logging = init_logging(&config.logging);
        if logging.is_none() {
            warn!("Logging already initialized; keeping existing subscriber");
        }
        Ok(Self {
            config,
            _logging: logging,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log which command is running and where config came from.
    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            config = %config_file_path().display(),
            "simdetect starting"
        );
    }
}
