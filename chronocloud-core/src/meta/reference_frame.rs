use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The angular frame shared by all rasters of a time series. It is produced by the first projection of a
/// series and passed by value to every later projection, so that all rasters line up pixel for pixel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferenceFrame {
    h_fov: (f64, f64),
    v_fov: (f64, f64),
    resolution: f64,
    width: usize,
    height: usize,
    anchor: Vector3<f64>,
}

impl ReferenceFrame {
    /// Creates a new `ReferenceFrame`. `h_fov` and `v_fov` are the (min, max) bounds in degrees of the polar
    /// angle and the azimuth, `resolution` is the angular size of a pixel in degrees
    pub fn new(
        h_fov: (f64, f64),
        v_fov: (f64, f64),
        resolution: f64,
        width: usize,
        height: usize,
        anchor: Vector3<f64>,
    ) -> Self {
        Self {
            h_fov,
            v_fov,
            resolution,
            width,
            height,
            anchor,
        }
    }

    /// Bounds of the polar angle in degrees
    pub fn h_fov(&self) -> (f64, f64) {
        self.h_fov
    }

    /// Bounds of the azimuth in degrees
    pub fn v_fov(&self) -> (f64, f64) {
        self.v_fov
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The scene anchor the frame was computed for
    pub fn anchor(&self) -> &Vector3<f64> {
        &self.anchor
    }
}
