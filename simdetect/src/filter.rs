//! Detection filter entries and their keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DetectionError, DetectionResult};
use crate::geometry::Distance;
use crate::image_type::ImageType;
use crate::pattern::NamePattern;
use crate::world::WorldObject;

/// Name of a simulator camera.
///
/// Cameras are addressed by name (`"front_center"`) or, for backwards
/// compatibility, by numeric id. Numeric ids are stored as their decimal
/// string so `CameraName::from(0)` and `"0"` address the same camera.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CameraName(String);

impl CameraName {
    /// Validate and wrap a camera name.
    pub fn new(name: impl Into<String>) -> DetectionResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DetectionError::EmptyCameraName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for CameraName {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for CameraName {
    type Error = DetectionError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<&str> for CameraName {
    type Error = DetectionError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<CameraName> for String {
    fn from(name: CameraName) -> Self {
        name.0
    }
}

impl fmt::Display for CameraName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of a detection filter: one filter per camera and image type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterKey {
    pub camera: CameraName,
    pub image_type: ImageType,
}

impl FilterKey {
    pub fn new(camera: CameraName, image_type: ImageType) -> Self {
        Self { camera, image_type }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.camera, self.image_type)
    }
}

/// Stored radius and name patterns for one key.
///
/// A filter with no patterns matches nothing; a filter with no radius has no
/// distance limit.
#[derive(Debug, Clone, Default)]
pub struct DetectionFilter {
    radius: Option<Distance>,
    patterns: Vec<NamePattern>,
}

impl DetectionFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current radius, `None` when unconstrained.
    pub fn radius(&self) -> Option<Distance> {
        self.radius
    }

    /// Overwrite the radius. Callers validate it first.
    pub(crate) fn set_radius(&mut self, radius: Distance) {
        self.radius = Some(radius);
    }

    /// Stored patterns in insertion order.
    pub fn patterns(&self) -> &[NamePattern] {
        &self.patterns
    }

    /// Append a compiled pattern. Duplicates are kept.
    pub(crate) fn push_pattern(&mut self, pattern: NamePattern) {
        self.patterns.push(pattern);
    }

    /// Remove every pattern whose source text equals `source`.
    ///
    /// Returns the number of patterns removed.
    pub(crate) fn remove_pattern(&mut self, source: &str) -> usize {
        let before = self.patterns.len();
        self.patterns.retain(|p| p.source() != source);
        before - self.patterns.len()
    }

    /// Whether `distance` is inside the radius (inclusive).
    pub fn within_radius(&self, distance: Distance) -> bool {
        match self.radius {
            Some(radius) => distance.centimeters() <= radius.centimeters(),
            None => true,
        }
    }

    /// Whether `name` matches at least one stored pattern.
    pub fn matches_name(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Whether a world object passes both the radius and name checks.
    pub fn accepts(&self, object: &WorldObject) -> bool {
        self.within_radius(object.distance) && self.matches_name(&object.name)
    }

    /// Read-only view for callers outside the registry.
    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            radius: self.radius,
            patterns: self.patterns.iter().map(|p| p.source().to_string()).collect(),
        }
    }
}

/// Copy of a filter's configuration, returned by inspection calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSnapshot {
    /// Radius, `None` when unconstrained.
    pub radius: Option<Distance>,
    /// Pattern sources in insertion order.
    pub patterns: Vec<String>,
}

impl fmt::Display for FilterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.radius {
            Some(radius) => write!(f, "radius={}", radius)?,
            None => write!(f, "radius=unlimited")?,
        }
        write!(f, " patterns=[{}]", self.patterns.join(", "))
    }
}
