//! Common types and utilities shared across CLI commands.

use simdetect::config::ConfigFile;
use simdetect::{CameraName, DetectionError, Distance, ImageType};

use crate::error::CliError;

/// Parse an image type argument (`scene`, `DepthPlanar`, `5`, ...).
///
/// Used as a clap value parser so an unknown type fails argument parsing.
pub fn parse_image_type(s: &str) -> Result<ImageType, DetectionError> {
    s.parse()
}

/// Resolve the camera from CLI args and config.
pub fn resolve_camera(cli_camera: Option<String>, config: &ConfigFile) -> Result<CameraName, CliError> {
    // CLI takes precedence, then config
    match cli_camera {
        Some(name) => Ok(CameraName::new(name)?),
        None => Ok(config.detection.default_camera.clone()),
    }
}

/// Resolve the image type from CLI args and config.
pub fn resolve_image_type(cli_image_type: Option<ImageType>, config: &ConfigFile) -> ImageType {
    cli_image_type.unwrap_or(config.detection.default_image_type)
}

/// Resolve an explicit radius from CLI args.
///
/// `--radius-m` and `--radius-cm` are mutually exclusive at the clap level;
/// this only converts units.
pub fn resolve_cli_radius(radius_m: Option<f64>, radius_cm: Option<f64>) -> Option<Distance> {
    radius_m
        .map(Distance::from_meters)
        .or_else(|| radius_cm.map(Distance::from_centimeters))
}
