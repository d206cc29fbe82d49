//! simdetect - Detection filter registry for simulator cameras
//!
//! This library stores per-camera object detection filters (a radius and a
//! set of name patterns keyed by camera and image type) and evaluates the
//! objects of the current simulated frame against them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ DetectionSession  (validates wire args: camera, image type)   │
//! │   │                                                           │
//! │   ├── DetectionFilterRegistry ── DashMap<FilterKey, Filter>   │
//! │   │        └── DetectionFilter { radius, [NamePattern] }      │
//! │   │                                                           │
//! │   └── Arc<dyn WorldSource> ────► Vec<WorldObject> per frame   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The world source is injected: this crate does not simulate, render or
//! track objects. It only filters what it is given.

pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod image_type;
pub mod logging;
pub mod pattern;
pub mod registry;
pub mod session;
pub mod world;

pub use error::{DetectionError, DetectionResult, ErrorKind};
pub use filter::{CameraName, DetectionFilter, FilterKey, FilterSnapshot};
pub use geometry::{Box2D, Box3D, Distance, GeoPoint, Pose, Quaternion, Vector2, Vector3};
pub use image_type::ImageType;
pub use pattern::{MatchOptions, NamePattern};
pub use registry::DetectionFilterRegistry;
pub use session::{DetectionSearch, DetectionSession};
pub use world::{DetectionInfo, Scenario, StaticWorld, WorldError, WorldObject, WorldSource};
