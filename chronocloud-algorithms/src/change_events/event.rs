use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{epochs::EpochPair, float_serde};
use crate::{
    change_statistics::MagnitudeStatistics, convexhull::ConvexHullMetrics,
    structure_measures::ShapeDescriptors,
};

/// Label of events that have not been classified yet
pub const UNDEFINED_EVENT_TYPE: &str = "undefined";

fn undefined_event_type() -> String {
    UNDEFINED_EVENT_TYPE.to_string()
}

fn nan() -> f64 {
    f64::NAN
}

/// A spatially coherent cluster of significant change between two epochs, together with its geometric
/// description. Apart from its label (`event_type`) an event is immutable once extracted
///
/// Undefined feature values are NaN, so two events holding one never compare equal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    object_id: Uuid,
    #[serde(default = "undefined_event_type")]
    event_type: String,
    /// File the member points of the cluster were written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cluster_point_cloud: Option<String>,
    /// File the convex hull mesh of the cluster was written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cluster_point_cloud_chull: Option<String>,
    /// Creation time of the event record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDateTime>,
    #[serde(default)]
    number_of_points: usize,
    #[serde(default)]
    t_min: Option<NaiveDateTime>,
    #[serde(default)]
    t_max: Option<NaiveDateTime>,
    #[serde(default = "nan", with = "float_serde")]
    delta_t_hours: f64,
    #[serde(default)]
    change_magnitudes: MagnitudeStatistics,
    #[serde(default)]
    convex_hull: ConvexHullMetrics,
    #[serde(default)]
    geometric_features_epoch_1: ShapeDescriptors,
    #[serde(default)]
    geometric_features_epoch_2: ShapeDescriptors,
    #[serde(default)]
    geometric_features_both_epochs: ShapeDescriptors,
}

impl ChangeEvent {
    /// Creates a new, unclassified event with a fresh random id and without acquisition times
    pub fn new(
        number_of_points: usize,
        change_magnitudes: MagnitudeStatistics,
        convex_hull: ConvexHullMetrics,
        geometric_features_epoch_1: ShapeDescriptors,
        geometric_features_epoch_2: ShapeDescriptors,
        geometric_features_both_epochs: ShapeDescriptors,
    ) -> Self {
        Self {
            object_id: Uuid::new_v4(),
            event_type: undefined_event_type(),
            cluster_point_cloud: None,
            cluster_point_cloud_chull: None,
            start_date: None,
            number_of_points,
            t_min: None,
            t_max: None,
            delta_t_hours: f64::NAN,
            change_magnitudes,
            convex_hull,
            geometric_features_epoch_1,
            geometric_features_epoch_2,
            geometric_features_both_epochs,
        }
    }

    /// Sets the acquisition times of the two epochs the event was detected between
    pub fn with_epochs(mut self, epochs: &EpochPair) -> Self {
        self.t_min = Some(epochs.t_min());
        self.t_max = Some(epochs.t_max());
        self.delta_t_hours = epochs.delta_t_hours();
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDateTime) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Records where the cluster points and their hull mesh were written to
    pub fn with_cluster_files<S: Into<String>, T: Into<String>>(
        mut self,
        point_cloud: S,
        hull: T,
    ) -> Self {
        self.cluster_point_cloud = Some(point_cloud.into());
        self.cluster_point_cloud_chull = Some(hull.into());
        self
    }

    pub fn object_id(&self) -> Uuid {
        self.object_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn set_event_type<S: Into<String>>(&mut self, event_type: S) {
        self.event_type = event_type.into();
    }

    pub fn cluster_point_cloud(&self) -> Option<&str> {
        self.cluster_point_cloud.as_deref()
    }

    pub fn cluster_point_cloud_chull(&self) -> Option<&str> {
        self.cluster_point_cloud_chull.as_deref()
    }

    pub fn start_date(&self) -> Option<NaiveDateTime> {
        self.start_date
    }

    pub fn number_of_points(&self) -> usize {
        self.number_of_points
    }

    pub fn t_min(&self) -> Option<NaiveDateTime> {
        self.t_min
    }

    pub fn t_max(&self) -> Option<NaiveDateTime> {
        self.t_max
    }

    /// Hours between the two epochs, NaN if the acquisition times are unknown
    pub fn delta_t_hours(&self) -> f64 {
        self.delta_t_hours
    }

    pub fn change_magnitudes(&self) -> &MagnitudeStatistics {
        &self.change_magnitudes
    }

    pub fn convex_hull(&self) -> &ConvexHullMetrics {
        &self.convex_hull
    }

    pub fn geometric_features_epoch_1(&self) -> &ShapeDescriptors {
        &self.geometric_features_epoch_1
    }

    pub fn geometric_features_epoch_2(&self) -> &ShapeDescriptors {
        &self.geometric_features_epoch_2
    }

    pub fn geometric_features_both_epochs(&self) -> &ShapeDescriptors {
        &self.geometric_features_both_epochs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_event() -> ChangeEvent {
        ChangeEvent::new(
            12,
            MagnitudeStatistics::from_magnitudes(&[0.5, 1.5]),
            ConvexHullMetrics {
                surface_area: 2.0,
                volume: 0.0,
                surface_area_to_volume_ratio: f64::INFINITY,
                points_building: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            },
            ShapeDescriptors::default(),
            ShapeDescriptors::default(),
            ShapeDescriptors::default(),
        )
    }

    #[test]
    fn test_new_event_is_undefined() {
        let event = sample_event();
        assert_eq!(event.event_type(), UNDEFINED_EVENT_TYPE);
        assert!(event.t_min().is_none());
        assert!(event.delta_t_hours().is_nan());
        assert_ne!(event.object_id(), sample_event().object_id());
    }

    #[test]
    fn test_with_epochs() {
        let t1 = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let t2 = NaiveDate::from_ymd_opt(2023, 5, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let event = sample_event().with_epochs(&EpochPair::new(t2, t1));
        assert_eq!(event.t_min(), Some(t1));
        assert_eq!(event.t_max(), Some(t2));
        assert_eq!(event.delta_t_hours(), 36.0);
    }

    #[test]
    fn test_serde_roundtrip_keeps_non_finite_values() {
        let event = sample_event().with_cluster_files("clusters/0.txt", "clusters/0.obj");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""surface_area_to_volume_ratio":"Infinity""#));
        assert!(json.contains(r#""Sphericity":null"#));

        let parsed: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.object_id(), event.object_id());
        assert_eq!(parsed.convex_hull(), event.convex_hull());
        assert_eq!(parsed.change_magnitudes(), event.change_magnitudes());
        assert_eq!(parsed.cluster_point_cloud_chull(), Some("clusters/0.obj"));
        assert!(parsed.geometric_features_epoch_1().planarity.is_nan());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{"object_id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "number_of_points": 3}"#;
        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type(), UNDEFINED_EVENT_TYPE);
        assert_eq!(event.number_of_points(), 3);
        assert!(event.delta_t_hours().is_nan());
        assert!(event.change_magnitudes().mean.is_nan());
        assert!(event.convex_hull().volume.is_nan());
        assert!(event.convex_hull().points_building.is_empty());
    }
}
