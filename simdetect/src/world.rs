//! World objects and the sources that enumerate them.
//!
//! The registry never discovers objects itself. A hosting process supplies
//! the current frame's objects through a [`WorldSource`]; the registry only
//! filters them. [`StaticWorld`] is an in-memory source used by the CLI and
//! tests, optionally loaded from a JSON scenario file:
//!
//! ```json
//! {
//!   "objects": [
//!     { "name": "Cylinder_1", "relative_pose": { "position": { "x": 0.5, "y": 0.0, "z": 0.0 } } },
//!     { "name": "Sphere_1", "distance": 10.0 }
//!   ],
//!   "filters": [
//!     { "camera_name": "0", "image_type": "Scene", "mesh_name": "Cylinder*", "radius": 20000.0 }
//!   ]
//! }
//! ```
//!
//! An object's `distance` (centimetres) may be given explicitly; otherwise it
//! is derived from `relative_pose`.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Box2D, Box3D, Distance, GeoPoint, Pose};
use crate::session::DetectionSearch;

/// Errors loading a world scenario.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Scenario file could not be read.
    #[error("failed to read scenario {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Scenario file is not valid JSON for the scenario format.
    #[error("failed to parse scenario {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// An object present in the simulated world for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldObject {
    /// Mesh/object name matched against filter patterns.
    pub name: String,
    /// Distance from the camera.
    pub distance: Distance,
    /// Pose relative to the camera.
    pub relative_pose: Pose,
    /// 2D bounding box in the camera image.
    pub box2d: Box2D,
    /// 3D bounding box in the camera frame.
    pub box3d: Box3D,
    /// Global position.
    pub geo_point: GeoPoint,
}

impl WorldObject {
    /// Create an object from its pose relative to the camera.
    ///
    /// The distance is derived from the pose.
    pub fn from_relative_pose(name: impl Into<String>, relative_pose: Pose) -> Self {
        Self {
            name: name.into(),
            distance: relative_pose.distance(),
            relative_pose,
            box2d: Box2D::default(),
            box3d: Box3D::default(),
            geo_point: GeoPoint::default(),
        }
    }

    /// Create an object known only by name and distance.
    pub fn at_distance(name: impl Into<String>, distance: Distance) -> Self {
        Self {
            name: name.into(),
            distance,
            relative_pose: Pose::default(),
            box2d: Box2D::default(),
            box3d: Box3D::default(),
            geo_point: GeoPoint::default(),
        }
    }

    pub fn with_box2d(mut self, box2d: Box2D) -> Self {
        self.box2d = box2d;
        self
    }

    pub fn with_box3d(mut self, box3d: Box3D) -> Self {
        self.box3d = box3d;
        self
    }

    pub fn with_geo_point(mut self, geo_point: GeoPoint) -> Self {
        self.geo_point = geo_point;
        self
    }

    /// Produce the detection record for this object.
    pub fn to_detection(&self) -> DetectionInfo {
        DetectionInfo {
            name: self.name.clone(),
            geo_point: self.geo_point,
            box2d: self.box2d,
            box3d: self.box3d,
            relative_pose: self.relative_pose,
        }
    }
}

/// A detection returned by a query.
///
/// Produced fresh for every query; the registry keeps no reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionInfo {
    /// Name of the detected object.
    pub name: String,
    /// Global position of the detection.
    pub geo_point: GeoPoint,
    /// 2D bounding box.
    #[serde(rename = "box2D")]
    pub box2d: Box2D,
    /// 3D bounding box.
    #[serde(rename = "box3D")]
    pub box3d: Box3D,
    /// Pose relative to the camera.
    pub relative_pose: Pose,
}

/// Supplies the objects present in the current frame.
///
/// Implementations return objects in a stable enumeration order; query
/// results preserve that order.
pub trait WorldSource: Send + Sync {
    /// Objects in the current frame.
    fn objects(&self) -> Vec<WorldObject>;
}

impl<F> WorldSource for F
where
    F: Fn() -> Vec<WorldObject> + Send + Sync,
{
    fn objects(&self) -> Vec<WorldObject> {
        self()
    }
}

/// In-memory world source whose object list can be replaced between frames.
#[derive(Debug, Default)]
pub struct StaticWorld {
    objects: RwLock<Vec<WorldObject>>,
}

impl StaticWorld {
    /// Create a world containing `objects`.
    pub fn new(objects: Vec<WorldObject>) -> Self {
        Self {
            objects: RwLock::new(objects),
        }
    }

    /// Replace the whole object list (a new frame).
    pub fn replace(&self, objects: Vec<WorldObject>) {
        *self.objects.write() = objects;
    }

    /// Append an object.
    pub fn push(&self, object: WorldObject) {
        self.objects.write().push(object);
    }

    /// Number of objects in the current frame.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Load objects from a scenario file, ignoring its filters.
    pub fn from_json_file(path: &Path) -> Result<Self, WorldError> {
        Ok(Scenario::load(path)?.into_world())
    }
}

impl WorldSource for StaticWorld {
    fn objects(&self) -> Vec<WorldObject> {
        self.objects.read().clone()
    }
}

/// A scenario fixture: world objects plus optional filter searches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    objects: Vec<ScenarioObject>,
    #[serde(default)]
    filters: Vec<DetectionSearch>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScenarioObject {
    name: String,
    /// Centimetres; derived from the pose when absent.
    #[serde(default, deserialize_with = "deserialize_distance")]
    distance: Option<f64>,
    #[serde(default)]
    relative_pose: Pose,
    #[serde(default, rename = "box2D")]
    box2d: Box2D,
    #[serde(default, rename = "box3D")]
    box3d: Box3D,
    #[serde(default)]
    geo_point: GeoPoint,
}

/// Reject distances no radius check can order: negative or non-finite.
fn deserialize_distance<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let distance = Option::<f64>::deserialize(deserializer)?;
    match distance {
        Some(cm) if !cm.is_finite() || cm < 0.0 => Err(serde::de::Error::custom(format!(
            "object distance must be finite and >= 0 cm, got {}",
            cm
        ))),
        other => Ok(other),
    }
}

impl From<ScenarioObject> for WorldObject {
    fn from(raw: ScenarioObject) -> Self {
        let distance = raw
            .distance
            .map(Distance::from_centimeters)
            .unwrap_or_else(|| raw.relative_pose.distance());
        WorldObject {
            name: raw.name,
            distance,
            relative_pose: raw.relative_pose,
            box2d: raw.box2d,
            box3d: raw.box3d,
            geo_point: raw.geo_point,
        }
    }
}

impl Scenario {
    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let text = fs::read_to_string(path).map_err(|source| WorldError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| WorldError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse scenario JSON.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Filter searches declared by the scenario.
    pub fn filters(&self) -> &[DetectionSearch] {
        &self.filters
    }

    /// World objects in file order.
    pub fn objects(&self) -> Vec<WorldObject> {
        self.objects.iter().cloned().map(WorldObject::from).collect()
    }

    /// Build a [`StaticWorld`] holding this scenario's objects.
    pub fn into_world(self) -> StaticWorld {
        StaticWorld::new(self.objects.into_iter().map(WorldObject::from).collect())
    }
}
