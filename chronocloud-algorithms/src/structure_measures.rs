use crate::change_events::float_serde;
use chronocloud_core::nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Eigenvalue-based shape descriptors of a point set, computed from the three eigenvalues `l1 >= l2 >= l3` of
/// its sample covariance matrix. All descriptors are NaN if they are undefined for the point set (fewer than
/// three points, or all points identical)
///
/// Undefined values are NaN, so two records holding one never compare equal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDescriptors {
    /// `l1 + l2 + l3`
    #[serde(rename = "Sum_of_Eigenvalues", with = "float_serde")]
    pub sum_of_eigenvalues: f64,
    /// `(l1 * l2 * l3)^1/3`
    #[serde(rename = "Omnivariance", with = "float_serde")]
    pub omnivariance: f64,
    /// `-SUM(e_i * ln(e_i))` over the eigenvalues `e_i` normalized by their sum
    #[serde(rename = "Eigentropy", with = "float_serde")]
    pub eigentropy: f64,
    /// `(l1 - l3) / l1`
    #[serde(rename = "Anisotropy", with = "float_serde")]
    pub anisotropy: f64,
    /// `(l2 - l3) / l1`
    #[serde(rename = "Planarity", with = "float_serde")]
    pub planarity: f64,
    /// `(l1 - l2) / l1`
    #[serde(rename = "Linearity", with = "float_serde")]
    pub linearity: f64,
    /// `l3 / (l1 + l2 + l3)`
    #[serde(rename = "Surface_Variation", with = "float_serde")]
    pub surface_variation: f64,
    /// `l3 / l1`
    #[serde(rename = "Sphericity", with = "float_serde")]
    pub sphericity: f64,
}

impl Default for ShapeDescriptors {
    fn default() -> Self {
        Self {
            sum_of_eigenvalues: f64::NAN,
            omnivariance: f64::NAN,
            eigentropy: f64::NAN,
            anisotropy: f64::NAN,
            planarity: f64::NAN,
            linearity: f64::NAN,
            surface_variation: f64::NAN,
            sphericity: f64::NAN,
        }
    }
}

impl ShapeDescriptors {
    /// Descriptors in a fixed order together with their snake case names
    pub fn named_values(&self) -> [(&'static str, f64); 8] {
        [
            ("sum_of_eigenvalues", self.sum_of_eigenvalues),
            ("omnivariance", self.omnivariance),
            ("eigentropy", self.eigentropy),
            ("anisotropy", self.anisotropy),
            ("planarity", self.planarity),
            ("linearity", self.linearity),
            ("surface_variation", self.surface_variation),
            ("sphericity", self.sphericity),
        ]
    }
}

/// Calculates the shape descriptors of the given points
pub fn shape_descriptors(points: &[Vector3<f64>]) -> ShapeDescriptors {
    let (e1, e2, e3) = match sorted_eigenvalues(points) {
        Some(eigenvalues) => eigenvalues,
        None => return ShapeDescriptors::default(),
    };
    if e1 <= 0.0 {
        return ShapeDescriptors::default();
    }

    let sum_of_eigenvalues = e1 + e2 + e3;
    let e1_norm = e1 / sum_of_eigenvalues;
    let e2_norm = e2 / sum_of_eigenvalues;
    let e3_norm = e3 / sum_of_eigenvalues;

    ShapeDescriptors {
        sum_of_eigenvalues,
        omnivariance: (e1 * e2 * e3).powf(1.0 / 3.0),
        eigentropy: -(entropy_term(e1_norm) + entropy_term(e2_norm) + entropy_term(e3_norm)),
        anisotropy: (e1 - e3) / e1,
        planarity: (e2 - e3) / e1,
        linearity: (e1 - e2) / e1,
        surface_variation: e3 / sum_of_eigenvalues,
        sphericity: e3 / e1,
    }
}

fn entropy_term(e_norm: f64) -> f64 {
    if e_norm > 0.0 {
        e_norm * e_norm.ln()
    } else {
        0.0
    }
}

/// Eigenvalues of the sample covariance matrix, largest first. Rounding can make the smallest eigenvalues of
/// degenerate point sets slightly negative, these are clamped to zero
fn sorted_eigenvalues(points: &[Vector3<f64>]) -> Option<(f64, f64, f64)> {
    if points.len() < 3 {
        return None;
    }
    let centroid = calc_centroid(points);
    let covariance_matrix = calc_covariance_matrix(&centroid, points);
    let eigenvalues = covariance_matrix.symmetric_eigenvalues();

    let mut e1 = eigenvalues[0].max(0.0);
    let mut e2 = eigenvalues[1].max(0.0);
    let mut e3 = eigenvalues[2].max(0.0);

    //Tiny in-place bubblesort so that e1 ends up being the largest eigenvalue and e3 the smallest
    if e1 < e2 {
        std::mem::swap(&mut e1, &mut e2);
    }
    if e2 < e3 {
        std::mem::swap(&mut e2, &mut e3);
    }
    if e1 < e2 {
        std::mem::swap(&mut e1, &mut e2);
    }
    Some((e1, e2, e3))
}

fn calc_centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    let sum: Vector3<f64> = points.iter().sum();
    sum / (points.len() as f64)
}

fn calc_covariance_matrix(centroid: &Vector3<f64>, points: &[Vector3<f64>]) -> Matrix3<f64> {
    let unweighted_covariance_matrix: Matrix3<f64> = points
        .iter()
        .map(|v| {
            let diff: Vector3<f64> = v - centroid;
            diff * diff.transpose()
        })
        .sum();
    unweighted_covariance_matrix / (points.len() as f64 - 1.0)
}
