use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chronocloud_algorithms::{
    change_events::{parse_epoch_pair, ChangeEvent, EpochPair, GeometricFeatureExtractor},
    clustering::ChangeClusterer,
    convexhull::ConvexHull,
};
use chronocloud_core::containers::ChangePoint;
use log::info;

use super::{load_collection, save_collection, write_hull_obj_file, CHANGE_EVENTS_FILE_NAME};
use crate::{ascii::write_change_points, project::ProjectLayout};

/// Settings for turning the change points of one epoch pair into stored change events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairExtraction {
    pub temporal_format: String,
    /// Identifiers of the two epochs. If either is missing, both timestamps are parsed from the pair name
    pub first_epoch: Option<String>,
    pub second_epoch: Option<String>,
    /// Write the points and hull mesh of every cluster into the pair folder
    pub write_clusters: bool,
}

impl PairExtraction {
    pub fn new<S: Into<String>>(temporal_format: S) -> Self {
        Self {
            temporal_format: temporal_format.into(),
            first_epoch: None,
            second_epoch: None,
            write_clusters: false,
        }
    }

    /// Acquisition times of the pair `pair_name`. Fails if they can not be parsed
    pub fn epochs(&self, pair_name: &str) -> Result<EpochPair> {
        let epochs = match (&self.first_epoch, &self.second_epoch) {
            (Some(first), Some(second)) => {
                EpochPair::from_identifiers(first, second, &self.temporal_format)
            }
            _ => parse_epoch_pair(pair_name, &self.temporal_format),
        };
        epochs.with_context(|| format!("No acquisition times for epoch pair '{}'", pair_name))
    }
}

/// Result of [extract_pair_events]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    pub collection_path: PathBuf,
    /// Events that were new to the collection
    pub added: usize,
    /// Events in the collection after the merge
    pub total: usize,
}

/// Clusters `points`, extracts one change event per cluster and merges the events into
/// `02_change_events/<pair_name>/change_events.json` of `layout`. Nothing is written if the acquisition times of
/// the pair can not be determined
pub fn extract_pair_events(
    layout: &ProjectLayout,
    pair_name: &str,
    points: &[ChangePoint],
    clusterer: &ChangeClusterer,
    settings: &PairExtraction,
) -> Result<PairOutcome> {
    let epochs = settings.epochs(pair_name)?;
    let pair_folder = layout.pair_folder(pair_name)?;

    let clustering = clusterer.cluster(points);
    info!(
        "Found {} clusters and {} noise points in {}",
        clustering.num_clusters(),
        clustering.noise_count(),
        pair_name
    );

    let extractor = GeometricFeatureExtractor::new().with_epochs(epochs);
    let mut events = Vec::with_capacity(clustering.num_clusters());
    for (index, cluster) in clustering.clusters(points).iter().enumerate() {
        let event = extractor.extract_event(cluster);
        let event = if settings.write_clusters {
            write_cluster_files(event, cluster, index, &pair_folder)?
        } else {
            event
        };
        events.push(event);
    }

    let collection_path = pair_folder.join(CHANGE_EVENTS_FILE_NAME);
    let mut collection = load_collection(&collection_path)?;
    let added = collection.extend(events);
    save_collection(&collection, &collection_path)?;
    Ok(PairOutcome {
        collection_path,
        added,
        total: collection.len(),
    })
}

/// Writes `cluster_<n>.txt` and `cluster_<n>.obj` into `folder` and records both paths in the event
fn write_cluster_files(
    event: ChangeEvent,
    cluster: &[ChangePoint],
    index: usize,
    folder: &Path,
) -> Result<ChangeEvent> {
    let points_path = folder.join(format!("cluster_{}.txt", index));
    let hull_path = folder.join(format!("cluster_{}.obj", index));
    write_change_points(&points_path, cluster)?;
    let positions = cluster
        .iter()
        .map(|point| point.position)
        .collect::<Vec<_>>();
    write_hull_obj_file(&hull_path, &ConvexHull::from_points(&positions))?;
    Ok(event.with_cluster_files(
        points_path.to_string_lossy(),
        hull_path.to_string_lossy(),
    ))
}
