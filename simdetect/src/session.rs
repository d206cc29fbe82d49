//! Simulator-facing session.
//!
//! A [`DetectionSession`] stands in for one connected client. It owns its own
//! [`DetectionFilterRegistry`] and an injected [`WorldSource`], and exposes the
//! simulator's RPC-shaped calls with raw wire arguments. This is the boundary
//! where image type codes, camera names and radii are validated; the registry
//! behind it only ever sees typed values.
//!
//! Filters live as long as the session. [`DetectionSession::close`] (or
//! dropping the session) discards them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use simdetect::{DetectionSession, Distance, StaticWorld, WorldObject};
//!
//! let world = Arc::new(StaticWorld::new(vec![
//!     WorldObject::at_distance("Cylinder_1", Distance::from_centimeters(50.0)),
//!     WorldObject::at_distance("Sphere_1", Distance::from_centimeters(10.0)),
//! ]));
//! let session = DetectionSession::new(world);
//!
//! session.sim_set_detection_filter_radius("0", 0, 200.0 * 100.0).unwrap();
//! session.sim_add_detection_filter_mesh_name("0", 0, "Cylinder*").unwrap();
//!
//! let cylinders = session.sim_get_detections("0", 0).unwrap();
//! assert_eq!(cylinders.len(), 1);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DetectionResult;
use crate::filter::{CameraName, FilterSnapshot};
use crate::geometry::Distance;
use crate::image_type::ImageType;
use crate::pattern::MatchOptions;
use crate::registry::DetectionFilterRegistry;
use crate::world::{DetectionInfo, WorldSource};

/// One-shot description of an object search.
///
/// Applying a search adds its mesh-name pattern to the filter for
/// (`camera_name`, `image_type`) and, when `radius` is set, overwrites the
/// filter's radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSearch {
    /// Camera to search; numeric ids are accepted as strings (`"0"`).
    pub camera_name: CameraName,
    /// Image type to search.
    pub image_type: ImageType,
    /// Pattern identifying the target mesh names.
    pub mesh_name: String,
    /// Maximum distance from the camera in centimetres.
    #[serde(default)]
    pub radius: Option<f64>,
}

/// An explicit client session over a detection registry.
pub struct DetectionSession {
    registry: DetectionFilterRegistry,
    world: Arc<dyn WorldSource>,
}

impl DetectionSession {
    /// Open a session over `world` with case-insensitive matching.
    pub fn new(world: Arc<dyn WorldSource>) -> Self {
        Self::with_options(world, MatchOptions::default())
    }

    /// Open a session with explicit match options.
    pub fn with_options(world: Arc<dyn WorldSource>, options: MatchOptions) -> Self {
        info!(
            case_sensitive = options.case_sensitive,
            "Detection session opened"
        );
        Self {
            registry: DetectionFilterRegistry::with_options(options),
            world,
        }
    }

    /// The session's registry.
    pub fn registry(&self) -> &DetectionFilterRegistry {
        &self.registry
    }

    /// `simSetDetectionFilterRadius`: radius in centimetres.
    pub fn sim_set_detection_filter_radius(
        &self,
        camera_name: &str,
        image_type: i32,
        radius_cm: f64,
    ) -> DetectionResult<()> {
        let (camera, image_type) = decode_key(camera_name, image_type)?;
        self.registry
            .set_radius(&camera, image_type, Distance::from_centimeters(radius_cm))
    }

    /// `simAddDetectionFilterMeshName`: append a wildcard or `regex:` pattern.
    pub fn sim_add_detection_filter_mesh_name(
        &self,
        camera_name: &str,
        image_type: i32,
        mesh_name: &str,
    ) -> DetectionResult<()> {
        let (camera, image_type) = decode_key(camera_name, image_type)?;
        self.registry.add_name_pattern(&camera, image_type, mesh_name)
    }

    /// `simClearDetectionMeshNames`: drop the filter for the key.
    pub fn sim_clear_detection_mesh_names(
        &self,
        camera_name: &str,
        image_type: i32,
    ) -> DetectionResult<()> {
        let (camera, image_type) = decode_key(camera_name, image_type)?;
        self.registry.clear_filter(&camera, image_type);
        Ok(())
    }

    /// `simGetDetections`: evaluate the current frame against the key's filter.
    pub fn sim_get_detections(
        &self,
        camera_name: &str,
        image_type: i32,
    ) -> DetectionResult<Vec<DetectionInfo>> {
        let (camera, image_type) = decode_key(camera_name, image_type)?;
        Ok(self.detections(&camera, image_type))
    }

    /// Typed form of [`sim_get_detections`](Self::sim_get_detections).
    pub fn detections(&self, camera: &CameraName, image_type: ImageType) -> Vec<DetectionInfo> {
        let objects = self.world.objects();
        self.registry.query(camera, image_type, &objects)
    }

    /// Configure a filter from a search description.
    pub fn start_detection_search(&self, search: &DetectionSearch) -> DetectionResult<()> {
        self.registry.apply_search(search)
    }

    /// Run a search: configure it, then return the matching detections.
    pub fn find_detections(&self, search: &DetectionSearch) -> DetectionResult<Vec<DetectionInfo>> {
        self.start_detection_search(search)?;
        Ok(self.detections(&search.camera_name, search.image_type))
    }

    /// Current filter configuration for a key.
    pub fn filter(&self, camera: &CameraName, image_type: ImageType) -> Option<FilterSnapshot> {
        self.registry.filter(camera, image_type)
    }

    /// Tear down the session, discarding all filters.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for DetectionSession {
    fn drop(&mut self) {
        let filters = self.registry.len();
        self.registry.clear_all();
        info!(filters, "Detection session closed");
    }
}

fn decode_key(camera_name: &str, image_type: i32) -> DetectionResult<(CameraName, ImageType)> {
    let camera = CameraName::new(camera_name)?;
    let image_type = ImageType::try_from(image_type).inspect_err(|e| {
        debug!(camera = %camera, error = %e, "Rejected image type");
    })?;
    Ok((camera, image_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectionError;
    use crate::world::{StaticWorld, WorldObject};

    fn scenario_world() -> Arc<StaticWorld> {
        Arc::new(StaticWorld::new(vec![
            WorldObject::at_distance("Cylinder_1", Distance::from_centimeters(50.0)),
            WorldObject::at_distance("Cylinder_2", Distance::from_centimeters(25_000.0)),
            WorldObject::at_distance("Sphere_1", Distance::from_centimeters(10.0)),
        ]))
    }

    #[test]
    fn test_cylinder_scenario() {
        let session = DetectionSession::new(scenario_world());
        session
            .sim_set_detection_filter_radius("0", ImageType::Scene.code(), 200.0 * 100.0)
            .unwrap();
        session
            .sim_add_detection_filter_mesh_name("0", ImageType::Scene.code(), "Cylinder*")
            .unwrap();

        let detections = session.sim_get_detections("0", 0).unwrap();
        let names: Vec<&str> = detections.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Cylinder_1"]);
    }

    #[test]
    fn test_invalid_image_type_rejected_at_boundary() {
        let session = DetectionSession::new(scenario_world());

        assert_eq!(
            session.sim_set_detection_filter_radius("0", 10, 1.0),
            Err(DetectionError::InvalidImageType(10))
        );
        assert_eq!(
            session.sim_add_detection_filter_mesh_name("0", -1, "*"),
            Err(DetectionError::InvalidImageType(-1))
        );
        assert!(session.sim_clear_detection_mesh_names("0", 99).is_err());
        assert!(session.sim_get_detections("0", 42).is_err());
        assert!(session.registry().is_empty());
    }

    #[test]
    fn test_empty_camera_name_rejected() {
        let session = DetectionSession::new(scenario_world());
        assert_eq!(
            session.sim_add_detection_filter_mesh_name("", 0, "*"),
            Err(DetectionError::EmptyCameraName)
        );
    }

    #[test]
    fn test_clear_then_get_is_empty() {
        let session = DetectionSession::new(scenario_world());
        session
            .sim_add_detection_filter_mesh_name("0", 0, "*")
            .unwrap();
        assert_eq!(session.sim_get_detections("0", 0).unwrap().len(), 3);

        session.sim_clear_detection_mesh_names("0", 0).unwrap();
        assert!(session.sim_get_detections("0", 0).unwrap().is_empty());

        // Clearing again is still fine.
        session.sim_clear_detection_mesh_names("0", 0).unwrap();
    }

    #[test]
    fn test_detections_follow_world_changes() {
        let world = scenario_world();
        let session = DetectionSession::new(world.clone());
        session
            .sim_add_detection_filter_mesh_name("0", 0, "Cylinder*")
            .unwrap();
        assert_eq!(session.sim_get_detections("0", 0).unwrap().len(), 2);

        world.replace(vec![WorldObject::at_distance(
            "Cylinder_9",
            Distance::from_centimeters(1.0),
        )]);
        let detections = session.sim_get_detections("0", 0).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].name, "Cylinder_9");
    }

    #[test]
    fn test_find_detections() {
        let session = DetectionSession::new(scenario_world());
        let search = DetectionSearch {
            camera_name: CameraName::from(0),
            image_type: ImageType::Scene,
            mesh_name: "Sphere*".to_string(),
            radius: Some(100.0),
        };

        let detections = session.find_detections(&search).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].name, "Sphere_1");
        assert!(session.filter(&search.camera_name, ImageType::Scene).is_some());
    }

    #[test]
    fn test_sessions_do_not_share_filters() {
        let world = scenario_world();
        let first = DetectionSession::new(world.clone());
        let second = DetectionSession::new(world);

        first
            .sim_add_detection_filter_mesh_name("0", 0, "*")
            .unwrap();
        assert_eq!(first.sim_get_detections("0", 0).unwrap().len(), 3);
        assert!(second.sim_get_detections("0", 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_deserializes_from_json() {
        let search: DetectionSearch = serde_json::from_str(
            r#"{ "camera_name": "front_center", "image_type": "Segmentation", "mesh_name": "Orange*" }"#,
        )
        .unwrap();
        assert_eq!(search.camera_name.as_str(), "front_center");
        assert_eq!(search.image_type, ImageType::Segmentation);
        assert_eq!(search.radius, None);

        let err = serde_json::from_str::<DetectionSearch>(
            r#"{ "camera_name": "", "image_type": "Scene", "mesh_name": "x" }"#,
        );
        assert!(err.is_err());
    }
}
