//! Geometry and unit types carried by detections.
//!
//! Positions are in metres in the camera frame. Detection distances and
//! radii are in centimetres; [`Distance`] is the only place the two meet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Centimetres per metre.
pub const CENTIMETERS_PER_METER: f64 = 100.0;

/// A distance, stored in centimetres.
///
/// Construct with [`Distance::from_centimeters`] or [`Distance::from_meters`];
/// callers never multiply by 100 themselves.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(f64);

impl Distance {
    /// Zero distance.
    pub const ZERO: Distance = Distance(0.0);

    /// Create a distance from centimetres.
    pub fn from_centimeters(cm: f64) -> Self {
        Self(cm)
    }

    /// Create a distance from metres.
    pub fn from_meters(m: f64) -> Self {
        Self(m * CENTIMETERS_PER_METER)
    }

    /// Distance in centimetres.
    pub fn centimeters(self) -> f64 {
        self.0
    }

    /// Distance in metres.
    pub fn meters(self) -> f64 {
        self.0 / CENTIMETERS_PER_METER
    }

    /// Whether this is a usable radius (finite and not negative).
    pub fn is_valid_radius(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} cm", self.0)
    }
}

/// A 3D vector in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Create a new vector.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// An orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new quaternion.
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position and orientation of an object relative to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3,
    #[serde(default)]
    pub orientation: Quaternion,
}

impl Pose {
    /// Create a pose.
    pub fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Distance from the frame origin (the camera) to this pose.
    pub fn distance(&self) -> Distance {
        Distance::from_meters(self.position.length())
    }
}

/// 2D point in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// 2D bounding box in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Box2D {
    pub min: Vector2,
    pub max: Vector2,
}

impl Box2D {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// 3D bounding box in metres, camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Box3D {
    pub min: Vector3,
    pub max: Vector3,
}

impl Box3D {
    /// Center of the box.
    pub fn center(&self) -> Vector3 {
        Vector3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }
}

/// Global position of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in metres.
    pub altitude: f64,
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}, {:.1} m)",
            self.latitude, self.longitude, self.altitude
        )
    }
}
