use std::iter::FromIterator;

use nalgebra::Vector3;

use crate::{error::PointCloudError, math::AABB};

/// A single capture of a scene: ordered positions with optional per-point RGB colors. The order of the
/// points is significant, it decides which point wins when two points occlude each other at equal range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    positions: Vec<Vector3<f64>>,
    colors: Option<Vec<Vector3<u8>>>,
}

impl PointCloud {
    /// Creates a `PointCloud` without color information
    pub fn from_positions(positions: Vec<Vector3<f64>>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    /// Creates a colored `PointCloud`. Fails if the number of colors differs from the number of positions
    /// ```
    /// # use chronocloud_core::containers::PointCloud;
    /// # use chronocloud_core::nalgebra::Vector3;
    /// let cloud = PointCloud::from_positions_and_colors(
    ///     vec![Vector3::new(0.0, 0.0, 0.0)],
    ///     vec![Vector3::new(255, 0, 0)],
    /// ).unwrap();
    /// assert!(cloud.has_colors());
    /// assert!(PointCloud::from_positions_and_colors(vec![], vec![Vector3::new(1, 2, 3)]).is_err());
    /// ```
    pub fn from_positions_and_colors(
        positions: Vec<Vector3<f64>>,
        colors: Vec<Vector3<u8>>,
    ) -> Result<Self, PointCloudError> {
        if positions.len() != colors.len() {
            return Err(PointCloudError::ColorCountMismatch {
                positions: positions.len(),
                colors: colors.len(),
            });
        }
        Ok(Self {
            positions,
            colors: Some(colors),
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn colors(&self) -> Option<&[Vector3<u8>]> {
        self.colors.as_deref()
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Mean of all positions, `None` for an empty cloud
    pub fn centroid(&self) -> Option<Vector3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.positions.iter().sum();
        Some(sum / self.positions.len() as f64)
    }

    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(self.positions.iter())
    }
}

impl FromIterator<Vector3<f64>> for PointCloud {
    fn from_iter<T: IntoIterator<Item = Vector3<f64>>>(iter: T) -> Self {
        Self::from_positions(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid() {
        let cloud: PointCloud = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 4.0, 6.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(cloud.centroid(), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert!(!cloud.has_colors());
    }

    #[test]
    fn test_empty_cloud() {
        let cloud = PointCloud::default();
        assert!(cloud.is_empty());
        assert!(cloud.centroid().is_none());
        assert!(cloud.bounds().is_none());
    }

    #[test]
    fn test_color_count_mismatch() {
        let result = PointCloud::from_positions_and_colors(
            vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)],
            vec![Vector3::new(1, 2, 3)],
        );
        assert_eq!(
            result,
            Err(PointCloudError::ColorCountMismatch {
                positions: 2,
                colors: 1
            })
        );
    }
}
