//! Camera image types.
//!
//! The simulator renders several image types per camera. Each has a stable
//! integer code on the wire; the registry keys filters by the decoded enum so
//! an invalid code is rejected before it reaches registry logic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// Image type rendered by a simulator camera.
///
/// Serializes as the CamelCase name. Deserializes from either the name (any
/// form [`FromStr`] accepts) or the numeric wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ImageTypeRepr")]
pub enum ImageType {
    Scene,
    DepthPlanar,
    DepthPerspective,
    DepthVis,
    DisparityNormalized,
    Segmentation,
    SurfaceNormals,
    Infrared,
    OpticalFlow,
    OpticalFlowVis,
}

impl ImageType {
    /// All image types in wire-code order.
    pub const ALL: [ImageType; 10] = [
        ImageType::Scene,
        ImageType::DepthPlanar,
        ImageType::DepthPerspective,
        ImageType::DepthVis,
        ImageType::DisparityNormalized,
        ImageType::Segmentation,
        ImageType::SurfaceNormals,
        ImageType::Infrared,
        ImageType::OpticalFlow,
        ImageType::OpticalFlowVis,
    ];

    /// Wire code used by the simulator RPC interface.
    pub fn code(self) -> i32 {
        match self {
            ImageType::Scene => 0,
            ImageType::DepthPlanar => 1,
            ImageType::DepthPerspective => 2,
            ImageType::DepthVis => 3,
            ImageType::DisparityNormalized => 4,
            ImageType::Segmentation => 5,
            ImageType::SurfaceNormals => 6,
            ImageType::Infrared => 7,
            ImageType::OpticalFlow => 8,
            ImageType::OpticalFlowVis => 9,
        }
    }

    /// Canonical CamelCase name.
    pub fn name(self) -> &'static str {
        match self {
            ImageType::Scene => "Scene",
            ImageType::DepthPlanar => "DepthPlanar",
            ImageType::DepthPerspective => "DepthPerspective",
            ImageType::DepthVis => "DepthVis",
            ImageType::DisparityNormalized => "DisparityNormalized",
            ImageType::Segmentation => "Segmentation",
            ImageType::SurfaceNormals => "SurfaceNormals",
            ImageType::Infrared => "Infrared",
            ImageType::OpticalFlow => "OpticalFlow",
            ImageType::OpticalFlowVis => "OpticalFlowVis",
        }
    }
}

impl TryFrom<i32> for ImageType {
    type Error = DetectionError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|index| ImageType::ALL.get(index).copied())
            .ok_or(DetectionError::InvalidImageType(code))
    }
}

/// Accepted serialized forms.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImageTypeRepr {
    Code(i32),
    Name(String),
}

impl TryFrom<ImageTypeRepr> for ImageType {
    type Error = DetectionError;

    fn try_from(repr: ImageTypeRepr) -> Result<Self, Self::Error> {
        match repr {
            ImageTypeRepr::Code(code) => ImageType::try_from(code),
            ImageTypeRepr::Name(name) => name.parse(),
        }
    }
}

impl From<ImageType> for i32 {
    fn from(image_type: ImageType) -> Self {
        image_type.code()
    }
}

impl FromStr for ImageType {
    type Err = DetectionError;

    /// Parse a name, ignoring case and `_`/`-` separators, or a numeric code.
    ///
    /// `scene`, `Scene`, `depth_planar`, `depth-planar`, `DepthPlanar` and `1`
    /// are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i32>() {
            return ImageType::try_from(code);
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        ImageType::ALL
            .iter()
            .copied()
            .find(|t| t.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| DetectionError::UnknownImageTypeName(s.to_string()))
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
