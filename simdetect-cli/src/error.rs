//! CLI error type.

use std::fmt;

use simdetect::config::ConfigError;
use simdetect::{DetectionError, WorldError};

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or missing configuration, or conflicting arguments.
    Config(String),

    /// Config file could not be loaded or saved.
    ConfigFile(ConfigError),

    /// Scenario file could not be loaded.
    World(WorldError),

    /// A filter argument was rejected.
    Detection(DetectionError),

    /// Failed to install the Ctrl-C handler.
    Signal(String),

    /// Failed to serialize output.
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::World(e) => write!(f, "{}", e),
            CliError::Detection(e) => write!(f, "Invalid argument: {}", e),
            CliError::Signal(msg) => write!(f, "Failed to install signal handler: {}", msg),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::World(e) => Some(e),
            CliError::Detection(e) => Some(e),
            CliError::Config(_) | CliError::Signal(_) | CliError::Output(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<WorldError> for CliError {
    fn from(e: WorldError) -> Self {
        CliError::World(e)
    }
}

impl From<DetectionError> for CliError {
    fn from(e: DetectionError) -> Self {
        CliError::Detection(e)
    }
}
