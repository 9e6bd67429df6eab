use nalgebra::Vector3;

/// 3D axis-aligned bounding box of a set of positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    min: Vector3<f64>,
    max: Vector3<f64>,
}

impl AABB {
    /// Creates a new AABB from the given minimum and maximum corners. Returns `None` if the minimum is not
    /// less than or equal to the maximum on every axis
    /// ```
    /// # use chronocloud_core::math::AABB;
    /// # use chronocloud_core::nalgebra::Vector3;
    /// assert!(AABB::from_min_max(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0)).is_some());
    /// assert!(AABB::from_min_max(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 1.0)).is_none());
    /// ```
    pub fn from_min_max(min: Vector3<f64>, max: Vector3<f64>) -> Option<Self> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return None;
        }
        Some(Self { min, max })
    }

    /// Computes the tightest AABB around the given positions. Returns `None` for an empty iterator
    /// ```
    /// # use chronocloud_core::math::AABB;
    /// # use chronocloud_core::nalgebra::Vector3;
    /// let points = vec![Vector3::new(1.0, -1.0, 0.0), Vector3::new(-2.0, 3.0, 0.5)];
    /// let bounds = AABB::from_points(points.iter()).unwrap();
    /// assert_eq!(*bounds.min(), Vector3::new(-2.0, -1.0, 0.0));
    /// assert_eq!(*bounds.max(), Vector3::new(1.0, 3.0, 0.5));
    /// ```
    pub fn from_points<'a, I: IntoIterator<Item = &'a Vector3<f64>>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let bounds = iter.fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, point| bounds.extend_with_point(point),
        );
        Some(bounds)
    }

    pub fn min(&self) -> &Vector3<f64> {
        &self.min
    }

    pub fn max(&self) -> &Vector3<f64> {
        &self.max
    }

    /// Returns the size between the minimum and maximum corner on every axis
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Length of the diagonal between the two corners
    pub fn diagonal_length(&self) -> f64 {
        self.extent().norm()
    }

    pub fn center(&self) -> Vector3<f64> {
        (self.min + self.max) * 0.5
    }

    /// Returns true if the given point is contained within this AABB. Points on the boundary count as contained
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Returns a copy of this AABB extended so that it contains `point`
    pub fn extend_with_point(&self, point: &Vector3<f64>) -> Self {
        Self {
            min: self.min.inf(point),
            max: self.max.sup(point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_single_point_have_zero_extent() {
        let points = vec![Vector3::new(4.0, 5.0, 6.0)];
        let bounds = AABB::from_points(points.iter()).unwrap();
        assert_eq!(bounds.extent(), Vector3::zeros());
        assert_eq!(bounds.diagonal_length(), 0.0);
        assert!(bounds.contains(&points[0]));
    }

    #[test]
    fn test_bounds_of_empty_iterator() {
        let points: Vec<Vector3<f64>> = vec![];
        assert!(AABB::from_points(points.iter()).is_none());
    }
}
