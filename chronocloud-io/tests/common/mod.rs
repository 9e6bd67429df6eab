#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use chronocloud_core::{
    containers::{ChangePoint, Epoch, PointCloud},
    nalgebra::Vector3,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// A fresh folder below the system temp directory that is removed again on drop
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "chronocloud_io_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("Could not create test folder");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// A colored, slightly rough wall 10m in front of the origin
pub fn random_wall(num_points: usize, seed: u64) -> PointCloud {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut positions = vec![];
    let mut colors = vec![];
    for _ in 0..num_points {
        positions.push(Vector3::new(
            10.0 + rng.gen_range(-0.2..0.2),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-1.5..1.5),
        ));
        colors.push(Vector3::new(
            rng.gen_range(60..255),
            rng.gen_range(60..255),
            rng.gen_range(60..255),
        ));
    }
    PointCloud::from_positions_and_colors(positions, colors).expect("Color count matches")
}

/// Two well separated blobs of change points, negative change around the origin and positive change
/// around (20, 0, 0), plus a single noise point
pub fn change_blobs(points_per_blob: usize, seed: u64) -> Vec<ChangePoint> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut points = vec![];
    for (center, magnitude) in [(Vector3::new(0.0, 0.0, 0.0), -0.5), (Vector3::new(20.0, 0.0, 0.0), 0.8)].iter() {
        for idx in 0..points_per_blob {
            let offset = Vector3::new(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
            );
            let epoch = if idx % 2 == 0 { Epoch::First } else { Epoch::Second };
            points.push(ChangePoint::new(center + offset, *magnitude + rng.gen_range(-0.1..0.1), epoch));
        }
    }
    points.push(ChangePoint::new(Vector3::new(10.0, 10.0, 10.0), 2.0, Epoch::First));
    points
}
