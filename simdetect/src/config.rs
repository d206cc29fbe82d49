//! Configuration file handling.
//!
//! Settings live in an INI file, by default
//! `~/.config/simdetect/config.ini` (overridable with `SIMDETECT_CONFIG`):
//!
//! ```ini
//! [detection]
//! case_sensitive = false
//! default_camera = 0
//! default_image_type = Scene
//! default_radius_m = 200
//!
//! [logging]
//! level = info
//! file = /tmp/simdetect.log
//! ```
//!
//! A missing file yields defaults. Keys are addressed as `section.key` by
//! [`ConfigKey`] for the CLI `config get/set/list` commands.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::filter::CameraName;
use crate::geometry::Distance;
use crate::image_type::ImageType;
use crate::pattern::MatchOptions;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "SIMDETECT_CONFIG";

/// Errors reading, writing or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read or parsed.
    #[error("failed to load config {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// Config file could not be written.
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unknown `section.key`.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Value rejected for a key.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// `[detection]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    /// Match pattern letter case exactly.
    pub case_sensitive: bool,
    /// Camera used when the CLI is not given one.
    pub default_camera: CameraName,
    /// Image type used when the CLI is not given one.
    pub default_image_type: ImageType,
    /// Radius applied when neither the CLI nor the scenario sets one.
    pub default_radius_m: Option<f64>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            default_camera: CameraName::from(0),
            default_image_type: ImageType::Scene,
            default_radius_m: None,
        }
    }
}

impl DetectionSettings {
    /// Match options derived from these settings.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
        }
    }

    /// Default radius as a [`Distance`].
    pub fn default_radius(&self) -> Option<Distance> {
        self.default_radius_m.map(Distance::from_meters)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive, e.g. `info` or `simdetect=debug`.
    pub level: String,
    /// Optional log file; logs go to stderr only when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub detection: DetectionSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file is missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Write to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Write every key to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini.write_to_file(path).map_err(write_err)
    }
}

/// Default config file location.
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("simdetect")
        .join("config.ini")
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DetectionCaseSensitive,
    DetectionDefaultCamera,
    DetectionDefaultImageType,
    DetectionDefaultRadiusM,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    /// All keys in display order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::DetectionCaseSensitive,
            ConfigKey::DetectionDefaultCamera,
            ConfigKey::DetectionDefaultImageType,
            ConfigKey::DetectionDefaultRadiusM,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFile,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::DetectionCaseSensitive
            | ConfigKey::DetectionDefaultCamera
            | ConfigKey::DetectionDefaultImageType
            | ConfigKey::DetectionDefaultRadiusM => "detection",
            ConfigKey::LoggingLevel | ConfigKey::LoggingFile => "logging",
        }
    }

    /// Key name within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::DetectionCaseSensitive => "case_sensitive",
            ConfigKey::DetectionDefaultCamera => "default_camera",
            ConfigKey::DetectionDefaultImageType => "default_image_type",
            ConfigKey::DetectionDefaultRadiusM => "default_radius_m",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingFile => "file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::DetectionCaseSensitive => "detection.case_sensitive",
            ConfigKey::DetectionDefaultCamera => "detection.default_camera",
            ConfigKey::DetectionDefaultImageType => "detection.default_image_type",
            ConfigKey::DetectionDefaultRadiusM => "detection.default_radius_m",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DetectionCaseSensitive => config.detection.case_sensitive.to_string(),
            ConfigKey::DetectionDefaultCamera => config.detection.default_camera.to_string(),
            ConfigKey::DetectionDefaultImageType => {
                config.detection.default_image_type.to_string()
            }
            ConfigKey::DetectionDefaultRadiusM => config
                .detection
                .default_radius_m
                .map(|r| r.to_string())
                .unwrap_or_default(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse and store `value`. An empty value clears optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason,
        };

        match self {
            ConfigKey::DetectionCaseSensitive => {
                config.detection.case_sensitive = parse_bool(value)
                    .ok_or_else(|| invalid("expected true or false".to_string()))?;
            }
            ConfigKey::DetectionDefaultCamera => {
                config.detection.default_camera =
                    CameraName::new(value).map_err(|e| invalid(e.to_string()))?;
            }
            ConfigKey::DetectionDefaultImageType => {
                config.detection.default_image_type =
                    value.parse().map_err(|e: crate::error::DetectionError| {
                        invalid(e.to_string())
                    })?;
            }
            ConfigKey::DetectionDefaultRadiusM => {
                config.detection.default_radius_m = if value.is_empty() {
                    None
                } else {
                    let radius: f64 = value
                        .parse()
                        .map_err(|_| invalid("expected a number of metres".to_string()))?;
                    if !Distance::from_meters(radius).is_valid_radius() {
                        return Err(invalid("radius must be finite and >= 0".to_string()));
                    }
                    Some(radius)
                };
            }
            ConfigKey::LoggingLevel => {
                if value.is_empty() {
                    return Err(invalid("level must not be empty".to_string()));
                }
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingFile => {
                config.logging.file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}
