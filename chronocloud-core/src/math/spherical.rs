use nalgebra::{Rotation3, Vector3};
use rayon::prelude::*;

/// Spherical coordinates of a position relative to the origin. `theta` is the polar angle measured from
/// the vertical (z) axis, `phi` is the azimuth in the xy-plane. Both angles are in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

impl Spherical {
    /// Polar angle in degrees
    pub fn theta_degrees(&self) -> f64 {
        self.theta.to_degrees()
    }

    /// Azimuth in degrees
    pub fn phi_degrees(&self) -> f64 {
        self.phi.to_degrees()
    }
}

/// Converts a cartesian position into spherical coordinates
/// ```
/// # use chronocloud_core::math::cartesian_to_spherical;
/// # use chronocloud_core::nalgebra::Vector3;
/// let s = cartesian_to_spherical(&Vector3::new(0.0, 0.0, 2.0));
/// assert_eq!(s.r, 2.0);
/// assert_eq!(s.theta, 0.0);
/// ```
pub fn cartesian_to_spherical(position: &Vector3<f64>) -> Spherical {
    let dxy = (position.x * position.x + position.y * position.y).sqrt();
    Spherical {
        r: (dxy * dxy + position.z * position.z).sqrt(),
        theta: dxy.atan2(position.z),
        phi: position.y.atan2(position.x),
    }
}

/// Converts all positions into spherical coordinates, preserving their order
pub fn cartesian_to_spherical_all(positions: &[Vector3<f64>]) -> Vec<Spherical> {
    positions.par_iter().map(cartesian_to_spherical).collect()
}

fn min_max(angles: &[f64]) -> Option<(f64, f64)> {
    if angles.is_empty() {
        return None;
    }
    Some(angles.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), angle| (min.min(*angle), max.max(*angle)),
    ))
}

/// Moves angles (in degrees) that straddle the ±180° discontinuity into a contiguous range. If the
/// floor of the smallest angle is -180 or the ceiling of the largest angle is 180, 360 is added to every
/// negative angle. Otherwise the angles are left untouched
///
/// This heuristic only looks at the extremes, so a cloud that touches ±180° on one side only still gets
/// its negative angles shifted.
pub fn wrap_angles(angles_deg: &mut [f64]) {
    let (min, max) = match min_max(angles_deg) {
        Some(extremes) => extremes,
        None => return,
    };
    if min.floor() == -180.0 || max.ceil() == 180.0 {
        shift_negative_angles(angles_deg);
    }
}

/// Span-based variant of [wrap_angles] used when mapping individual points into an existing raster:
/// negative angles are shifted by 360 if the floored angles span more than 180 degrees
pub fn wrap_angles_by_span(angles_deg: &mut [f64]) {
    let (min, max) = match min_max(angles_deg) {
        Some(extremes) => extremes,
        None => return,
    };
    if max.floor() - min.floor() > 180.0 {
        shift_negative_angles(angles_deg);
    }
}

fn shift_negative_angles(angles_deg: &mut [f64]) {
    for angle in angles_deg.iter_mut().filter(|angle| **angle < 0.0) {
        *angle += 360.0;
    }
}

/// The fixed rotation that turns a scene on its side for a top-down view: 90° around the x axis followed by
/// 20° around the y axis
pub fn top_view_rotation() -> Rotation3<f64> {
    let around_x = Rotation3::from_axis_angle(&Vector3::x_axis(), 90f64.to_radians());
    let around_y = Rotation3::from_axis_angle(&Vector3::y_axis(), 20f64.to_radians());
    around_y * around_x
}

/// Rotates all positions about `anchor` by [top_view_rotation]
pub fn rotate_to_top_view(positions: &[Vector3<f64>], anchor: &Vector3<f64>) -> Vec<Vector3<f64>> {
    let rotation = top_view_rotation();
    positions
        .iter()
        .map(|position| rotation * (position - anchor) + anchor)
        .collect()
}
