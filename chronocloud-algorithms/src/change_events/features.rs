use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::event::ChangeEvent;

/// A single feature of a change event, as seen by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(number) => Some(*number),
            FeatureValue::Text(_) => None,
        }
    }

    /// Missing values (NaN) never satisfy a rule condition
    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Number(number) if number.is_nan())
    }
}

impl From<f64> for FeatureValue {
    fn from(number: f64) -> Self {
        FeatureValue::Number(number)
    }
}

impl From<usize> for FeatureValue {
    fn from(number: usize) -> Self {
        FeatureValue::Number(number as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(text: &str) -> Self {
        FeatureValue::Text(text.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(text: String) -> Self {
        FeatureValue::Text(text)
    }
}

impl Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Number(number) => write!(f, "{}", number),
            FeatureValue::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Flat name -> value view of a change event. Features keep a fixed order, see [FeatureTable::from_event]
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    features: Vec<(String, FeatureValue)>,
}

impl FeatureTable {
    /// Flattens the event into the features `object_id`, `event_type`, `number_of_points`, `delta_t_hours`,
    /// `change_<statistic>`, `hull_surface_area`, `hull_volume`, `hull_surface_area_to_volume_ratio` and
    /// `<descriptor>_<epoch_1|epoch_2|both_epochs>`
    pub fn from_event(event: &ChangeEvent) -> Self {
        let mut features: Vec<(String, FeatureValue)> = vec![
            ("object_id".into(), event.object_id().to_string().into()),
            ("event_type".into(), event.event_type().into()),
            ("number_of_points".into(), event.number_of_points().into()),
            ("delta_t_hours".into(), event.delta_t_hours().into()),
        ];
        features.extend(
            event
                .change_magnitudes()
                .named_values()
                .iter()
                .map(|(name, value)| (format!("change_{}", name), (*value).into())),
        );
        let hull = event.convex_hull();
        features.push(("hull_surface_area".into(), hull.surface_area.into()));
        features.push(("hull_volume".into(), hull.volume.into()));
        features.push((
            "hull_surface_area_to_volume_ratio".into(),
            hull.surface_area_to_volume_ratio.into(),
        ));
        for (block, descriptors) in &[
            ("epoch_1", event.geometric_features_epoch_1()),
            ("epoch_2", event.geometric_features_epoch_2()),
            ("both_epochs", event.geometric_features_both_epochs()),
        ] {
            features.extend(
                descriptors
                    .named_values()
                    .iter()
                    .map(|(name, value)| (format!("{}_{}", name, block), (*value).into())),
            );
        }
        Self { features }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.features
            .iter()
            .find(|(feature, _)| feature == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.features
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        change_statistics::MagnitudeStatistics,
        convexhull::ConvexHullMetrics,
        structure_measures::{shape_descriptors, ShapeDescriptors},
    };
    use chronocloud_core::nalgebra::Vector3;

    fn sample_event() -> ChangeEvent {
        let corners = (0..8)
            .map(|i| Vector3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64))
            .collect::<Vec<_>>();
        ChangeEvent::new(
            8,
            MagnitudeStatistics::from_magnitudes(&[1.0, 3.0]),
            ConvexHullMetrics {
                surface_area: 6.0,
                volume: 1.0,
                surface_area_to_volume_ratio: 6.0,
                points_building: vec![],
            },
            shape_descriptors(&corners),
            ShapeDescriptors::default(),
            shape_descriptors(&corners),
        )
    }

    #[test]
    fn test_feature_names() {
        let table = FeatureTable::from_event(&sample_event());
        assert_eq!(table.len(), 4 + 8 + 3 + 3 * 8);
        let names = table.names().collect::<Vec<_>>();
        assert_eq!(&names[..5], &["object_id", "event_type", "number_of_points", "delta_t_hours", "change_mean"]);
        assert!(names.contains(&"hull_surface_area_to_volume_ratio"));
        assert!(names.contains(&"sum_of_eigenvalues_epoch_1"));
        assert!(names.contains(&"surface_variation_both_epochs"));
    }

    #[test]
    fn test_feature_values() {
        let event = sample_event();
        let table = FeatureTable::from_event(&event);
        assert_eq!(table.get("change_mean"), Some(&FeatureValue::Number(2.0)));
        assert_eq!(table.get("event_type"), Some(&FeatureValue::Text("undefined".into())));
        assert_eq!(
            table.get("object_id"),
            Some(&FeatureValue::Text(event.object_id().to_string()))
        );
        assert_eq!(table.get("hull_volume").and_then(|v| v.as_number()), Some(1.0));
        assert!(table.get("planarity_epoch_2").map(|v| v.is_missing()).unwrap());
        assert!(table.get("delta_t_hours").map(|v| v.is_missing()).unwrap());
        assert_eq!(table.get("no_such_feature"), None);
    }

    #[test]
    fn test_feature_value_json() {
        let values: Vec<FeatureValue> = serde_json::from_str(r#"[1, 2.5, "rockfall"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FeatureValue::Number(1.0),
                FeatureValue::Number(2.5),
                FeatureValue::Text("rockfall".into())
            ]
        );
    }
}
