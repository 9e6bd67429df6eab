use chronocloud_core::nalgebra::Vector3;
use rayon::prelude::*;

/// Finite-difference gradient of a row-major grid along rows (axis 0) and columns (axis 1). Interior
/// samples use central differences, border samples one-sided differences. The gradient along an axis of
/// length 1 is zero
pub(crate) fn gradient(grid: &[f64], width: usize, height: usize) -> (Vec<f64>, Vec<f64>) {
    let at = |row: usize, col: usize| grid[row * width + col];

    let mut d_rows = vec![0.0; grid.len()];
    let mut d_cols = vec![0.0; grid.len()];
    d_rows
        .par_chunks_mut(width.max(1))
        .zip(d_cols.par_chunks_mut(width.max(1)))
        .enumerate()
        .for_each(|(row, (d_rows_row, d_cols_row))| {
            for col in 0..width {
                d_rows_row[col] = axis_derivative(height, row, |r| at(r, col));
                d_cols_row[col] = axis_derivative(width, col, |c| at(row, c));
            }
        });
    (d_rows, d_cols)
}

fn axis_derivative<F: Fn(usize) -> f64>(len: usize, idx: usize, sample: F) -> f64 {
    if len < 2 {
        0.0
    } else if idx == 0 {
        sample(1) - sample(0)
    } else if idx == len - 1 {
        sample(len - 1) - sample(len - 2)
    } else {
        (sample(idx + 1) - sample(idx - 1)) / 2.0
    }
}

/// Unit surface normals of the range grid, `(-d/dcol, -d/drow, 1)` normalized
pub(crate) fn surface_normals(range_grid: &[f64], width: usize, height: usize) -> Vec<Vector3<f64>> {
    let (d_rows, d_cols) = gradient(range_grid, width, height);
    d_rows
        .par_iter()
        .zip(d_cols.par_iter())
        .map(|(d_row, d_col)| Vector3::new(-d_col, -d_row, 1.0).normalize())
        .collect()
}

/// Direction of the light source: the component-wise magnitude of the camera-to-anchor offset, normalized
pub(crate) fn light_direction(camera: &Vector3<f64>, anchor: &Vector3<f64>) -> Vector3<f64> {
    (camera - anchor).abs().normalize()
}

/// Lambertian shading factor per pixel for color images, clipped to `[0, 1]`
pub(crate) fn color_shading(
    normals: &[Vector3<f64>],
    light: &Vector3<f64>,
    intensity: f64,
) -> Vec<f64> {
    normals
        .par_iter()
        .map(|normal| (normal.dot(light) * intensity).clamp(0.0, 1.0))
        .collect()
}

/// Shading factor per pixel for range images: the sum of the normal components
pub(crate) fn range_shading(normals: &[Vector3<f64>]) -> Vec<f64> {
    normals.par_iter().map(|normal| normal.sum()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_gradient_of_ramp() {
        // 3 rows, 4 columns, value = 2 * row + col
        let grid = (0..3)
            .flat_map(|row| (0..4).map(move |col| (2 * row + col) as f64))
            .collect::<Vec<_>>();
        let (d_rows, d_cols) = gradient(&grid, 4, 3);
        assert!(d_rows.iter().all(|d| (*d - 2.0).abs() < 1e-12));
        assert!(d_cols.iter().all(|d| (*d - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_gradient_edges_are_one_sided() {
        let grid = vec![0.0, 1.0, 4.0, 9.0];
        let (d_rows, d_cols) = gradient(&grid, 4, 1);
        assert_eq!(d_rows, vec![0.0; 4]);
        assert_eq!(d_cols, vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn test_flat_grid_normals_point_up() {
        let normals = surface_normals(&vec![7.0; 6], 3, 2);
        for normal in normals {
            assert_eq!(normal, Vector3::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_shading_factors() {
        let normals = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0)];
        let light = light_direction(&Vector3::new(0.0, 0.0, 0.0), &Vector3::new(0.0, 0.0, 10.0));
        assert_eq!(light, Vector3::new(0.0, 0.0, 1.0));

        let color = color_shading(&normals, &light, 100.0);
        assert_eq!(color, vec![1.0, 0.0]);

        let range = range_shading(&[Vector3::new(0.6, 0.0, 0.8)]);
        assert_approx_eq!(range[0], 1.4);
    }
}
