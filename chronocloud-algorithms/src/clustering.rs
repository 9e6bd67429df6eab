use std::collections::VecDeque;

use chronocloud_core::containers::ChangePoint;
use kd_tree::{KdPoint, KdTree};
use log::debug;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClusteringError {
    #[error("epsilon must be a positive, finite distance, got {0}")]
    InvalidEpsilon(f64),
}

/// Position with its index in the clustered slice, so that kd-tree results can be mapped back
#[derive(Debug, Clone, Copy)]
struct IndexedPosition {
    position: [f64; 3],
    index: usize,
}

impl KdPoint for IndexedPosition {
    type Scalar = f64;
    type Dim = typenum::U3;
    fn at(&self, k: usize) -> f64 {
        self.position[k]
    }
}

impl IndexedPosition {
    fn distance_squared(&self, other: &IndexedPosition) -> f64 {
        self.position
            .iter()
            .zip(other.position.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Result of clustering a set of change points. Labels are local to one clustering run and numbered in the
/// order in which the clusters were discovered
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    labels: Vec<Option<usize>>,
    num_clusters: usize,
}

impl Clustering {
    /// Cluster label per input point, `None` for noise
    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|label| label.is_none()).count()
    }

    /// Indices of the member points of each cluster, in ascending order, ordered by cluster label
    pub fn cluster_indices(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![vec![]; self.num_clusters];
        for (index, label) in self.labels.iter().enumerate() {
            if let Some(label) = label {
                clusters[*label].push(index);
            }
        }
        clusters
    }

    /// The member points of each cluster, ordered by cluster label. Noise points are not part of any cluster
    pub fn clusters(&self, points: &[ChangePoint]) -> Vec<Vec<ChangePoint>> {
        self.cluster_indices()
            .into_iter()
            .map(|indices| indices.into_iter().map(|idx| points[idx]).collect())
            .collect()
    }
}

/// Density-based clustering of change points (DBSCAN) on their 3D positions. A point is a core point if at
/// least `min_size` other points lie within `epsilon` of it. Clusters are the maximal sets of points
/// reachable through chains of core points; points reachable from no core point are noise
///
/// ```
/// # use chronocloud_algorithms::clustering::ChangeClusterer;
/// # use chronocloud_core::containers::{ChangePoint, Epoch};
/// # use chronocloud_core::nalgebra::Vector3;
/// let points = (0..10)
///     .map(|i| ChangePoint::new(Vector3::new(i as f64 * 0.1, 0.0, 0.0), 0.5, Epoch::First))
///     .chain(std::iter::once(ChangePoint::new(Vector3::new(50.0, 0.0, 0.0), 0.5, Epoch::Second)))
///     .collect::<Vec<_>>();
/// let clustering = ChangeClusterer::new(0.15, 2).unwrap().cluster(&points);
/// assert_eq!(clustering.num_clusters(), 1);
/// assert_eq!(clustering.noise_count(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeClusterer {
    epsilon: f64,
    min_size: usize,
}

impl ChangeClusterer {
    pub fn new(epsilon: f64, min_size: usize) -> Result<Self, ClusteringError> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ClusteringError::InvalidEpsilon(epsilon));
        }
        Ok(Self { epsilon, min_size })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Clusters the given points. The result only depends on the positions and their order
    pub fn cluster(&self, points: &[ChangePoint]) -> Clustering {
        let neighbours = self.neighbourhoods(points);
        let is_core = neighbours
            .iter()
            .map(|n| n.len() >= self.min_size)
            .collect::<Vec<_>>();

        let mut labels: Vec<Option<usize>> = vec![None; points.len()];
        let mut num_clusters = 0;
        let mut queue = VecDeque::new();
        for seed in 0..points.len() {
            if labels[seed].is_some() || !is_core[seed] {
                continue;
            }
            labels[seed] = Some(num_clusters);
            queue.push_back(seed);
            while let Some(current) = queue.pop_front() {
                // Border points join the cluster but do not extend it
                if !is_core[current] {
                    continue;
                }
                for &neighbour in &neighbours[current] {
                    if labels[neighbour].is_none() {
                        labels[neighbour] = Some(num_clusters);
                        queue.push_back(neighbour);
                    }
                }
            }
            num_clusters += 1;
        }

        let clustering = Clustering {
            labels,
            num_clusters,
        };
        debug!(
            "Clustered {} change points into {} clusters, {} noise points",
            points.len(),
            clustering.num_clusters(),
            clustering.noise_count()
        );
        clustering
    }

    /// Indices of all other points within `epsilon` (inclusive) of each point, in ascending order
    fn neighbourhoods(&self, points: &[ChangePoint]) -> Vec<Vec<usize>> {
        let items = points
            .iter()
            .enumerate()
            .map(|(index, point)| IndexedPosition {
                position: [point.position.x, point.position.y, point.position.z],
                index,
            })
            .collect::<Vec<_>>();
        let tree = KdTree::build_by_ordered_float(items.clone());

        let epsilon_squared = self.epsilon * self.epsilon;
        // The tree query is widened slightly, the exact inclusive test happens below
        let search_radius = self.epsilon * (1.0 + 1e-9);
        items
            .par_iter()
            .map(|item| {
                let mut neighbours = tree
                    .within_radius(item, search_radius)
                    .into_iter()
                    .filter(|other| {
                        other.index != item.index
                            && item.distance_squared(other) <= epsilon_squared
                    })
                    .map(|other| other.index)
                    .collect::<Vec<_>>();
                neighbours.sort_unstable();
                neighbours
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronocloud_core::{containers::Epoch, nalgebra::Vector3};
    use rand::{distributions::Uniform, rngs::SmallRng, Rng, SeedableRng};

    fn change_point(x: f64, y: f64, z: f64) -> ChangePoint {
        ChangePoint::new(Vector3::new(x, y, z), 1.0, Epoch::First)
    }

    /// 100 points on a 5x5x4 lattice with 0.1 spacing inside the unit cube. Spreading 100 points evenly over the
    /// whole cube puts them about 0.215 apart, so with `epsilon = 0.2` no point would have other points in reach
    fn setup_dense_lattice() -> Vec<ChangePoint> {
        let mut points = vec![];
        for x in 0..5 {
            for y in 0..5 {
                for z in 0..4 {
                    points.push(change_point(
                        0.3 + x as f64 * 0.1,
                        0.3 + y as f64 * 0.1,
                        0.3 + z as f64 * 0.1,
                    ));
                }
            }
        }
        points
    }

    fn setup_random_blobs(seed: u64) -> Vec<ChangePoint> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let jitter = Uniform::new(-0.3, 0.3);
        let mut points = vec![];
        for center in &[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0)] {
            for _ in 0..80 {
                points.push(change_point(
                    center.0 + rng.sample(jitter),
                    center.1 + rng.sample(jitter),
                    center.2 + rng.sample(jitter),
                ));
            }
        }
        for i in 0..20 {
            points.push(change_point(
                rng.sample(Uniform::new(-20.0, 30.0)),
                30.0 + i as f64 * 5.0,
                rng.sample(Uniform::new(-20.0, 20.0)),
            ));
        }
        points
    }

    #[test]
    fn test_dense_lattice_is_one_cluster() {
        let points = setup_dense_lattice();
        assert_eq!(points.len(), 100);
        let clustering = ChangeClusterer::new(0.2, 5).unwrap().cluster(&points);
        assert_eq!(clustering.num_clusters(), 1);
        assert_eq!(clustering.noise_count(), 0);
        assert_eq!(clustering.clusters(&points)[0].len(), 100);
    }

    #[test]
    fn test_two_blobs_and_noise() {
        let points = setup_random_blobs(42);
        let clustering = ChangeClusterer::new(0.5, 4).unwrap().cluster(&points);
        assert_eq!(clustering.num_clusters(), 2);
        assert_eq!(clustering.noise_count(), 20);

        let clusters = clustering.cluster_indices();
        assert!(clusters[0].iter().all(|idx| *idx < 80));
        assert!(clusters[1].iter().all(|idx| (80..160).contains(idx)));
    }

    #[test]
    fn test_epsilon_is_inclusive() {
        let points = vec![change_point(0.0, 0.0, 0.0), change_point(0.25, 0.0, 0.0)];
        let clustering = ChangeClusterer::new(0.25, 1).unwrap().cluster(&points);
        assert_eq!(clustering.labels(), &[Some(0), Some(0)]);
    }

    #[test]
    fn test_border_point_joins_first_cluster() {
        // Two dense rows meet at a border point that is not core itself
        let mut points = vec![];
        for i in 0..4 {
            points.push(change_point(-1.0 - i as f64 * 0.1, 0.0, 0.0));
        }
        points.push(change_point(0.0, 0.0, 0.0));
        for i in 0..4 {
            points.push(change_point(1.0 + i as f64 * 0.1, 0.0, 0.0));
        }
        let clustering = ChangeClusterer::new(1.0, 3).unwrap().cluster(&points);
        assert_eq!(clustering.num_clusters(), 2);
        assert_eq!(clustering.labels()[4], Some(0));
    }

    #[test]
    fn test_noise_grows_with_min_size() {
        let points = setup_random_blobs(7);
        let mut previous_noise = 0;
        for min_size in 0..30 {
            let noise = ChangeClusterer::new(0.4, min_size)
                .unwrap()
                .cluster(&points)
                .noise_count();
            assert!(noise >= previous_noise);
            previous_noise = noise;
        }
    }

    #[test]
    fn test_clustering_is_deterministic() {
        let points = setup_random_blobs(3);
        let clusterer = ChangeClusterer::new(0.5, 4).unwrap();
        assert_eq!(clusterer.cluster(&points), clusterer.cluster(&points));
    }

    #[test]
    fn test_invalid_epsilon() {
        assert_eq!(
            ChangeClusterer::new(0.0, 3),
            Err(ClusteringError::InvalidEpsilon(0.0))
        );
        assert!(ChangeClusterer::new(f64::NAN, 3).is_err());
    }

    #[test]
    fn test_empty_input() {
        let clustering = ChangeClusterer::new(1.0, 3).unwrap().cluster(&[]);
        assert_eq!(clustering.num_clusters(), 0);
        assert!(clustering.cluster_indices().is_empty());
    }
}
