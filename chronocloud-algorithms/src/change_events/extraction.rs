use chronocloud_core::{
    containers::{ChangePoint, Epoch},
    nalgebra::Vector3,
};
use log::info;
use rayon::prelude::*;

use super::{epochs::EpochPair, event::ChangeEvent};
use crate::{
    change_statistics::MagnitudeStatistics, clustering::Clustering, convexhull::convex_hull_metrics,
    structure_measures::shape_descriptors,
};

/// Turns clusters of change points into [ChangeEvent]s by computing their convex hull metrics, magnitude
/// statistics and per-epoch shape descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricFeatureExtractor {
    epochs: Option<EpochPair>,
}

impl GeometricFeatureExtractor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Acquisition times attached to every extracted event
    pub fn with_epochs(mut self, epochs: EpochPair) -> Self {
        self.epochs = Some(epochs);
        self
    }

    /// Describes a single cluster. Degenerate clusters yield NaN or infinite values, never an error
    pub fn extract_event(&self, cluster: &[ChangePoint]) -> ChangeEvent {
        let positions_of = |epoch: Option<Epoch>| {
            cluster
                .iter()
                .filter(|point| epoch.map_or(true, |epoch| point.epoch == epoch))
                .map(|point| point.position)
                .collect::<Vec<Vector3<f64>>>()
        };
        let all_positions = positions_of(None);
        let magnitudes = cluster
            .iter()
            .map(|point| point.magnitude)
            .collect::<Vec<_>>();

        let event = ChangeEvent::new(
            cluster.len(),
            MagnitudeStatistics::from_magnitudes(&magnitudes),
            convex_hull_metrics(&all_positions),
            shape_descriptors(&positions_of(Some(Epoch::First))),
            shape_descriptors(&positions_of(Some(Epoch::Second))),
            shape_descriptors(&all_positions),
        )
        .with_start_date(chrono::Local::now().naive_local());
        match &self.epochs {
            Some(epochs) => event.with_epochs(epochs),
            None => event,
        }
    }

    /// Describes every cluster of `clustering` over `points`. Events are ordered by cluster label, noise points
    /// are ignored
    pub fn extract(&self, points: &[ChangePoint], clustering: &Clustering) -> Vec<ChangeEvent> {
        let events = clustering
            .clusters(points)
            .par_iter()
            .map(|cluster| self.extract_event(cluster))
            .collect::<Vec<_>>();
        info!(
            "Extracted {} change events from {} change points",
            events.len(),
            points.len()
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ChangeClusterer;
    use assert_approx_eq::assert_approx_eq;
    use chrono::NaiveDate;

    /// Unit cube corners from the first epoch, the same corners shifted up by 1 from the second
    fn setup_box_cluster() -> Vec<ChangePoint> {
        let mut points = vec![];
        for i in 0..8 {
            let corner = Vector3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64);
            points.push(ChangePoint::new(corner, 1.0, Epoch::First));
            points.push(ChangePoint::new(
                corner + Vector3::new(0.0, 0.0, 1.0),
                3.0,
                Epoch::Second,
            ));
        }
        points
    }

    #[test]
    fn test_extract_event() {
        let points = setup_box_cluster();
        let event = GeometricFeatureExtractor::new().extract_event(&points);

        assert_eq!(event.number_of_points(), 16);
        assert_eq!(event.event_type(), "undefined");
        assert_eq!(event.change_magnitudes().mean, 2.0);
        assert_eq!(event.change_magnitudes().min, 1.0);
        assert_eq!(event.change_magnitudes().max, 3.0);

        assert_approx_eq!(event.convex_hull().volume, 2.0);
        assert_approx_eq!(event.convex_hull().surface_area, 10.0);
        assert_eq!(event.convex_hull().points_building.len(), 8);

        assert_approx_eq!(event.geometric_features_epoch_1().sphericity, 1.0);
        assert_approx_eq!(event.geometric_features_epoch_2().sphericity, 1.0);
        assert!(event.geometric_features_both_epochs().sphericity < 1.0);
        assert!(event.delta_t_hours().is_nan());
        assert!(event.start_date().is_some());
    }

    #[test]
    fn test_small_cluster_has_sentinels() {
        let points = vec![
            ChangePoint::new(Vector3::new(0.0, 0.0, 0.0), 0.4, Epoch::First),
            ChangePoint::new(Vector3::new(0.0, 0.0, 0.1), 0.6, Epoch::Second),
        ];
        let event = GeometricFeatureExtractor::new().extract_event(&points);
        assert_eq!(event.convex_hull().volume, 0.0);
        assert_eq!(event.convex_hull().surface_area_to_volume_ratio, f64::INFINITY);
        assert!(event.geometric_features_both_epochs().linearity.is_nan());
        assert_approx_eq!(event.change_magnitudes().mean, 0.5);
    }

    #[test]
    fn test_extract_from_clustering() {
        let mut points = setup_box_cluster();
        points.extend(setup_box_cluster().into_iter().map(|point| {
            ChangePoint::new(
                point.position + Vector3::new(100.0, 0.0, 0.0),
                -point.magnitude,
                point.epoch,
            )
        }));
        points.push(ChangePoint::new(Vector3::new(50.0, 50.0, 50.0), 9.0, Epoch::First));

        let clustering = ChangeClusterer::new(1.5, 3).unwrap().cluster(&points);
        let t1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let t2 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
        let events = GeometricFeatureExtractor::new()
            .with_epochs(EpochPair::new(t1, t2))
            .extract(&points, &clustering);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].change_magnitudes().mean, 2.0);
        assert_eq!(events[1].change_magnitudes().mean, -2.0);
        assert!(events.iter().all(|event| event.delta_t_hours() == 6.0));
        assert!(events.iter().all(|event| event.number_of_points() == 16));
    }
}
