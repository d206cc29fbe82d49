//! Detection filter registry.
//!
//! Stores one [`DetectionFilter`] per (camera, image type) key and answers
//! detection queries against a caller-supplied list of world objects.
//!
//! # Semantics
//!
//! - Configuration calls create the entry on first use.
//! - [`set_radius`](DetectionFilterRegistry::set_radius) overwrites;
//!   [`add_name_pattern`](DetectionFilterRegistry::add_name_pattern) appends.
//! - An absent entry is a normal state: clearing it is a no-op and querying it
//!   returns an empty list.
//! - An entry with no patterns matches nothing.
//!
//! # Concurrency
//!
//! Entries live in a sharded [`DashMap`]; a write locks only the shard holding
//! the key being mutated. A query clones the entry under a read guard and
//! evaluates objects after the guard is released, so long object lists never
//! block writers.
//!
//! # Example
//!
//! ```
//! use simdetect::{CameraName, DetectionFilterRegistry, Distance, ImageType, WorldObject};
//!
//! let registry = DetectionFilterRegistry::new();
//! let camera = CameraName::from(0);
//!
//! registry.set_radius(&camera, ImageType::Scene, Distance::from_meters(200.0)).unwrap();
//! registry.add_name_pattern(&camera, ImageType::Scene, "Cylinder*").unwrap();
//!
//! let world = vec![
//!     WorldObject::at_distance("Cylinder_1", Distance::from_centimeters(50.0)),
//!     WorldObject::at_distance("Cylinder_2", Distance::from_centimeters(25_000.0)),
//!     WorldObject::at_distance("Sphere_1", Distance::from_centimeters(10.0)),
//! ];
//!
//! let detections = registry.query(&camera, ImageType::Scene, &world);
//! assert_eq!(detections.len(), 1);
//! assert_eq!(detections[0].name, "Cylinder_1");
//! ```

use dashmap::DashMap;
use tracing::debug;

use crate::error::{DetectionError, DetectionResult};
use crate::filter::{CameraName, DetectionFilter, FilterKey, FilterSnapshot};
use crate::geometry::Distance;
use crate::image_type::ImageType;
use crate::pattern::{MatchOptions, NamePattern};
use crate::session::DetectionSearch;
use crate::world::{DetectionInfo, WorldObject};

/// Keyed store of detection filters.
#[derive(Debug, Default)]
pub struct DetectionFilterRegistry {
    filters: DashMap<FilterKey, DetectionFilter>,
    options: MatchOptions,
}

impl DetectionFilterRegistry {
    /// Create a registry with case-insensitive matching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with explicit match options.
    pub fn with_options(options: MatchOptions) -> Self {
        Self {
            filters: DashMap::new(),
            options,
        }
    }

    /// Match options applied to newly added patterns.
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Set the detection radius for a key, creating the filter if absent.
    ///
    /// # Errors
    ///
    /// [`DetectionError::InvalidRadius`] if the radius is negative or not finite.
    pub fn set_radius(
        &self,
        camera: &CameraName,
        image_type: ImageType,
        radius: Distance,
    ) -> DetectionResult<()> {
        if !radius.is_valid_radius() {
            return Err(DetectionError::InvalidRadius(radius.centimeters()));
        }

        let key = FilterKey::new(camera.clone(), image_type);
        debug!(key = %key, radius_cm = radius.centimeters(), "Setting detection radius");
        self.filters.entry(key).or_default().set_radius(radius);
        Ok(())
    }

    /// Append a name pattern for a key, creating the filter if absent.
    ///
    /// See [`crate::pattern`] for the pattern dialects.
    ///
    /// # Errors
    ///
    /// [`DetectionError::EmptyPattern`] or [`DetectionError::InvalidPattern`].
    /// The registry is unchanged on error.
    pub fn add_name_pattern(
        &self,
        camera: &CameraName,
        image_type: ImageType,
        pattern: &str,
    ) -> DetectionResult<()> {
        let compiled = NamePattern::compile(pattern, self.options)?;

        let key = FilterKey::new(camera.clone(), image_type);
        debug!(key = %key, pattern, regex = compiled.is_regex(), "Adding name pattern");
        self.filters.entry(key).or_default().push_pattern(compiled);
        Ok(())
    }

    /// Remove every occurrence of a pattern from a key's filter.
    ///
    /// The filter itself (and its radius) stays. Returns the number of
    /// patterns removed; 0 when the key or pattern is absent.
    pub fn remove_name_pattern(
        &self,
        camera: &CameraName,
        image_type: ImageType,
        pattern: &str,
    ) -> usize {
        let key = FilterKey::new(camera.clone(), image_type);
        let removed = self
            .filters
            .get_mut(&key)
            .map(|mut filter| filter.remove_pattern(pattern))
            .unwrap_or(0);
        debug!(key = %key, pattern, removed, "Removed name pattern");
        removed
    }

    /// Remove the filter for a key. No-op if absent.
    ///
    /// Returns whether a filter was removed.
    pub fn clear_filter(&self, camera: &CameraName, image_type: ImageType) -> bool {
        let key = FilterKey::new(camera.clone(), image_type);
        let removed = self.filters.remove(&key).is_some();
        debug!(key = %key, removed, "Cleared detection filter");
        removed
    }

    /// Remove every filter.
    pub fn clear_all(&self) {
        let count = self.filters.len();
        self.filters.clear();
        debug!(count, "Cleared all detection filters");
    }

    /// Configure a filter from a one-shot search description.
    ///
    /// Adds the search's mesh-name pattern and, if present, sets its radius.
    /// The radius is validated before anything is stored.
    pub fn apply_search(&self, search: &DetectionSearch) -> DetectionResult<()> {
        let radius = search.radius.map(Distance::from_centimeters);
        if let Some(radius) = radius {
            if !radius.is_valid_radius() {
                return Err(DetectionError::InvalidRadius(radius.centimeters()));
            }
        }

        self.add_name_pattern(&search.camera_name, search.image_type, &search.mesh_name)?;
        if let Some(radius) = radius {
            self.set_radius(&search.camera_name, search.image_type, radius)?;
        }
        Ok(())
    }

    /// Return the objects that pass the key's filter, in input order.
    ///
    /// Returns an empty list when no filter exists for the key.
    pub fn query(
        &self,
        camera: &CameraName,
        image_type: ImageType,
        objects: &[WorldObject],
    ) -> Vec<DetectionInfo> {
        let key = FilterKey::new(camera.clone(), image_type);

        // Clone so the shard guard is not held while evaluating objects.
        let filter = match self.filters.get(&key) {
            Some(entry) => entry.value().clone(),
            None => {
                debug!(key = %key, "No detection filter configured");
                return Vec::new();
            }
        };

        let detections: Vec<DetectionInfo> = objects
            .iter()
            .filter(|object| filter.accepts(object))
            .map(WorldObject::to_detection)
            .collect();

        debug!(
            key = %key,
            candidates = objects.len(),
            matched = detections.len(),
            "Detection query"
        );
        detections
    }

    /// Snapshot of the filter for a key, if one exists.
    pub fn filter(&self, camera: &CameraName, image_type: ImageType) -> Option<FilterSnapshot> {
        let key = FilterKey::new(camera.clone(), image_type);
        self.filters.get(&key).map(|entry| entry.snapshot())
    }

    /// All configured keys, sorted.
    pub fn keys(&self) -> Vec<FilterKey> {
        let mut keys: Vec<FilterKey> = self.filters.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Number of configured filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam() -> CameraName {
        CameraName::from(0)
    }

    fn obj(name: &str, cm: f64) -> WorldObject {
        WorldObject::at_distance(name, Distance::from_centimeters(cm))
    }

    fn names(detections: &[DetectionInfo]) -> Vec<&str> {
        detections.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_query_without_filter_is_empty() {
        let registry = DetectionFilterRegistry::new();
        let world = vec![obj("Cylinder_1", 1.0)];

        for image_type in ImageType::ALL {
            assert!(registry.query(&cam(), image_type, &world).is_empty());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_radius_only_filter_matches_nothing() {
        let registry = DetectionFilterRegistry::new();
        registry
            .set_radius(&cam(), ImageType::Scene, Distance::from_meters(200.0))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry
            .query(&cam(), ImageType::Scene, &[obj("Cylinder_1", 1.0)])
            .is_empty());
    }

    #[test]
    fn test_glob_filter_selects_matching_subset() {
        let registry = DetectionFilterRegistry::new();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Cylinder*")
            .unwrap();

        let world = vec![
            obj("Sphere_1", 5.0),
            obj("Cylinder_1", 10.0),
            obj("Cone_1", 15.0),
            obj("Cylinder_2", 1e9),
        ];
        let detections = registry.query(&cam(), ImageType::Scene, &world);
        assert_eq!(names(&detections), vec!["Cylinder_1", "Cylinder_2"]);
    }

    #[test]
    fn test_radius_excludes_far_objects() {
        let registry = DetectionFilterRegistry::new();
        registry
            .set_radius(&cam(), ImageType::Scene, Distance::from_centimeters(200.0 * 100.0))
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Cylinder*")
            .unwrap();

        let world = vec![obj("Cylinder_near", 100.0), obj("Cylinder_far", 30_000.0)];
        let detections = registry.query(&cam(), ImageType::Scene, &world);
        assert_eq!(names(&detections), vec!["Cylinder_near"]);
    }

    #[test]
    fn test_set_radius_overwrites() {
        let registry = DetectionFilterRegistry::new();
        registry
            .set_radius(&cam(), ImageType::Scene, Distance::from_centimeters(10.0))
            .unwrap();
        registry
            .set_radius(&cam(), ImageType::Scene, Distance::from_centimeters(1000.0))
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "*")
            .unwrap();

        let snapshot = registry.filter(&cam(), ImageType::Scene).unwrap();
        assert_eq!(snapshot.radius, Some(Distance::from_centimeters(1000.0)));

        let detections = registry.query(&cam(), ImageType::Scene, &[obj("Box", 500.0)]);
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn test_patterns_accumulate_as_union() {
        let registry = DetectionFilterRegistry::new();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Cylinder*")
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Sphere*")
            .unwrap();

        let world = vec![obj("Cylinder_1", 1.0), obj("Cone_1", 1.0), obj("Sphere_1", 1.0)];
        let detections = registry.query(&cam(), ImageType::Scene, &world);
        assert_eq!(names(&detections), vec!["Cylinder_1", "Sphere_1"]);
    }

    #[test]
    fn test_duplicate_patterns_do_not_duplicate_results() {
        let registry = DetectionFilterRegistry::new();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Cylinder*")
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Cylinder*")
            .unwrap();

        let snapshot = registry.filter(&cam(), ImageType::Scene).unwrap();
        assert_eq!(snapshot.patterns.len(), 2);

        let detections = registry.query(&cam(), ImageType::Scene, &[obj("Cylinder_1", 1.0)]);
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn test_clear_filter_then_query_is_empty() {
        let registry = DetectionFilterRegistry::new();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "*")
            .unwrap();

        assert!(registry.clear_filter(&cam(), ImageType::Scene));
        assert!(registry
            .query(&cam(), ImageType::Scene, &[obj("Anything", 0.0)])
            .is_empty());
        assert!(registry.filter(&cam(), ImageType::Scene).is_none());
    }

    #[test]
    fn test_clear_absent_filter_is_noop() {
        let registry = DetectionFilterRegistry::new();
        assert!(!registry.clear_filter(&cam(), ImageType::Segmentation));
    }

    #[test]
    fn test_keys_are_isolated() {
        let registry = DetectionFilterRegistry::new();
        let front = CameraName::new("front_center").unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Cylinder*")
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Segmentation, "Sphere*")
            .unwrap();
        registry
            .add_name_pattern(&front, ImageType::Scene, "Cone*")
            .unwrap();

        let world = vec![obj("Cylinder_1", 1.0), obj("Sphere_1", 1.0), obj("Cone_1", 1.0)];
        assert_eq!(
            names(&registry.query(&cam(), ImageType::Scene, &world)),
            vec!["Cylinder_1"]
        );
        assert_eq!(
            names(&registry.query(&cam(), ImageType::Segmentation, &world)),
            vec!["Sphere_1"]
        );
        assert_eq!(
            names(&registry.query(&front, ImageType::Scene, &world)),
            vec!["Cone_1"]
        );

        registry.clear_filter(&cam(), ImageType::Scene);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            names(&registry.query(&front, ImageType::Scene, &world)),
            vec!["Cone_1"]
        );
    }

    #[test]
    fn test_invalid_arguments_leave_registry_unchanged() {
        let registry = DetectionFilterRegistry::new();

        let err = registry
            .set_radius(&cam(), ImageType::Scene, Distance::from_centimeters(-1.0))
            .unwrap_err();
        assert_eq!(err, DetectionError::InvalidRadius(-1.0));

        assert!(registry
            .set_radius(&cam(), ImageType::Scene, Distance::from_centimeters(f64::NAN))
            .is_err());

        let err = registry
            .add_name_pattern(&cam(), ImageType::Scene, "")
            .unwrap_err();
        assert_eq!(err, DetectionError::EmptyPattern);

        assert!(registry
            .add_name_pattern(&cam(), ImageType::Scene, "regex:(")
            .is_err());

        assert!(registry.is_empty());
    }

    #[test]
    fn test_zero_radius_matches_only_coincident_objects() {
        let registry = DetectionFilterRegistry::new();
        registry
            .set_radius(&cam(), ImageType::Scene, Distance::ZERO)
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "*")
            .unwrap();

        let world = vec![obj("At", 0.0), obj("Near", 0.1)];
        assert_eq!(
            names(&registry.query(&cam(), ImageType::Scene, &world)),
            vec!["At"]
        );
    }

    #[test]
    fn test_remove_name_pattern_keeps_radius() {
        let registry = DetectionFilterRegistry::new();
        registry
            .set_radius(&cam(), ImageType::Scene, Distance::from_centimeters(10.0))
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "Cylinder*")
            .unwrap();

        assert_eq!(
            registry.remove_name_pattern(&cam(), ImageType::Scene, "Cylinder*"),
            1
        );
        assert_eq!(
            registry.remove_name_pattern(&cam(), ImageType::Infrared, "Cylinder*"),
            0
        );

        let snapshot = registry.filter(&cam(), ImageType::Scene).unwrap();
        assert!(snapshot.patterns.is_empty());
        assert_eq!(snapshot.radius, Some(Distance::from_centimeters(10.0)));
    }

    #[test]
    fn test_case_sensitive_registry() {
        let registry = DetectionFilterRegistry::with_options(MatchOptions::case_sensitive());
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "cylinder*")
            .unwrap();

        let world = vec![obj("Cylinder_1", 1.0), obj("cylinder_2", 1.0)];
        assert_eq!(
            names(&registry.query(&cam(), ImageType::Scene, &world)),
            vec!["cylinder_2"]
        );
    }

    #[test]
    fn test_apply_search() {
        let registry = DetectionFilterRegistry::new();
        let search = DetectionSearch {
            camera_name: cam(),
            image_type: ImageType::Scene,
            mesh_name: "Orange*".to_string(),
            radius: Some(10_000.0),
        };
        registry.apply_search(&search).unwrap();

        let snapshot = registry.filter(&cam(), ImageType::Scene).unwrap();
        assert_eq!(snapshot.patterns, vec!["Orange*".to_string()]);
        assert_eq!(snapshot.radius, Some(Distance::from_centimeters(10_000.0)));
    }

    #[test]
    fn test_apply_search_with_bad_radius_stores_nothing() {
        let registry = DetectionFilterRegistry::new();
        let search = DetectionSearch {
            camera_name: cam(),
            image_type: ImageType::Scene,
            mesh_name: "Orange*".to_string(),
            radius: Some(-5.0),
        };
        assert!(registry.apply_search(&search).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_keys_sorted() {
        let registry = DetectionFilterRegistry::new();
        registry
            .add_name_pattern(&CameraName::from(1), ImageType::Scene, "*")
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Segmentation, "*")
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "*")
            .unwrap();

        let keys: Vec<String> = registry.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["0/Scene", "0/Segmentation", "1/Scene"]);
    }

    #[test]
    fn test_clear_all() {
        let registry = DetectionFilterRegistry::new();
        registry
            .add_name_pattern(&cam(), ImageType::Scene, "*")
            .unwrap();
        registry
            .add_name_pattern(&cam(), ImageType::DepthPlanar, "*")
            .unwrap();
        registry.clear_all();
        assert!(registry.is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn world_strategy() -> impl Strategy<Value = Vec<(String, f64)>> {
            prop::collection::vec(
                (
                    prop_oneof!["Cylinder_[0-9]{1,3}", "Sphere_[0-9]{1,3}", "Cone_[0-9]{1,3}"],
                    0.0..50_000.0_f64,
                ),
                0..20,
            )
        }

        proptest! {
            #[test]
            fn test_query_equals_manual_filter(
                world in world_strategy(),
                radius in 0.0..50_000.0_f64
            ) {
                let registry = DetectionFilterRegistry::new();
                let camera = CameraName::from(0);
                registry.set_radius(&camera, ImageType::Scene, Distance::from_centimeters(radius))?;
                registry.add_name_pattern(&camera, ImageType::Scene, "Cylinder*")?;

                let objects: Vec<WorldObject> = world
                    .iter()
                    .map(|(name, cm)| WorldObject::at_distance(name.clone(), Distance::from_centimeters(*cm)))
                    .collect();

                let got: Vec<String> = registry
                    .query(&camera, ImageType::Scene, &objects)
                    .into_iter()
                    .map(|d| d.name)
                    .collect();
                let expected: Vec<String> = world
                    .iter()
                    .filter(|(name, cm)| name.starts_with("Cylinder") && *cm <= radius)
                    .map(|(name, _)| name.clone())
                    .collect();

                prop_assert_eq!(got, expected);
            }

            #[test]
            fn test_negative_radius_always_rejected(radius in -1e9..-1e-9_f64) {
                let registry = DetectionFilterRegistry::new();
                let result = registry.set_radius(
                    &CameraName::from(0),
                    ImageType::Scene,
                    Distance::from_centimeters(radius),
                );
                prop_assert!(result.is_err());
                prop_assert!(registry.is_empty());
            }
        }
    }
}
