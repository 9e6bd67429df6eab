//! Spherical projection of point clouds into shaded raster images.
//!
//! A [Projector] turns a [PointCloud] seen from a fixed camera position into a color and/or range raster.
//! Every pixel covers the same angle, chosen so that one pixel spans `resolution_cm` at the distance between
//! camera and scene anchor. Occlusion is resolved with a [ZBuffer], surfaces are shaded with normals
//! estimated from the range grid.
//!
//! The first projection of a time series returns a [ReferenceFrame]. Passing this frame to the projections
//! of later epochs makes all rasters share the same field of view, resolution and size.

use chronocloud_core::{
    containers::{PointCloud, RasterImage},
    math::{cartesian_to_spherical_all, rotate_to_top_view, wrap_angles},
    meta::{ImageKind, RasterMetadata, ReferenceFrame},
    nalgebra::Vector3,
};
use log::{debug, info, warn};
use thiserror::Error;

mod filters;
mod shading;
mod zbuffer;
pub use self::zbuffer::*;

/// Errors that prevent a projection from producing any image
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("cannot project an empty point cloud")]
    EmptyPointCloud,
    #[error("a color image was requested but the point cloud has no colors")]
    MissingColors,
    #[error("degenerate projection geometry: {0}")]
    DegenerateGeometry(String),
    #[error("invalid projection parameters: {0}")]
    InvalidParameters(String),
}

/// Parameters of a projection that stay fixed for all epochs of a series
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParameters {
    /// Path of the projected point cloud, recorded in the raster metadata
    pub source_path: String,
    pub camera_position: Vector3<f64>,
    /// Size of a pixel at the distance between camera and anchor, in centimeters
    pub resolution_cm: f64,
    pub rgb_light_intensity: f64,
    pub range_light_intensity: f64,
    pub make_color_image: bool,
    pub make_range_image: bool,
    /// Rotate the scene about its anchor for a view from above
    pub top_view: bool,
    /// Margin added around the field of view, in meters at anchor distance
    pub fov_buffer_m: f64,
}

impl Default for ProjectionParameters {
    fn default() -> Self {
        Self {
            source_path: String::new(),
            camera_position: Vector3::zeros(),
            resolution_cm: 12.5,
            rgb_light_intensity: 100.0,
            range_light_intensity: 10.0,
            make_color_image: false,
            make_range_image: true,
            top_view: false,
            fov_buffer_m: 0.0,
        }
    }
}

impl ProjectionParameters {
    /// The image kinds to produce, color first
    pub fn image_kinds(&self) -> Vec<ImageKind> {
        let mut kinds = vec![];
        if self.make_color_image {
            kinds.push(ImageKind::Color);
        }
        if self.make_range_image {
            kinds.push(ImageKind::Range);
        }
        kinds
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !(self.resolution_cm.is_finite() && self.resolution_cm > 0.0) {
            return Err(ProjectionError::InvalidParameters(format!(
                "resolution_cm must be positive, got {}",
                self.resolution_cm
            )));
        }
        if !self.make_color_image && !self.make_range_image {
            return Err(ProjectionError::InvalidParameters(
                "at least one of color or range image must be requested".into(),
            ));
        }
        if self.camera_position.iter().any(|c| !c.is_finite()) {
            return Err(ProjectionError::InvalidParameters(
                "camera position must be finite".into(),
            ));
        }
        if !(self.fov_buffer_m.is_finite() && self.fov_buffer_m >= 0.0) {
            return Err(ProjectionError::InvalidParameters(format!(
                "fov_buffer_m must be non-negative, got {}",
                self.fov_buffer_m
            )));
        }
        Ok(())
    }
}

/// The result of projecting one point cloud
#[derive(Debug, Clone)]
pub struct Projection {
    pub images: Vec<RasterImage>,
    /// The frame the images were projected in. Pass it to later epochs of the same series
    pub frame: ReferenceFrame,
}

impl Projection {
    pub fn image(&self, kind: ImageKind) -> Option<&RasterImage> {
        self.images
            .iter()
            .find(|image| image.metadata().image_kind == kind)
    }
}

/// Projects point clouds into shaded rasters
#[derive(Debug, Clone)]
pub struct Projector {
    parameters: ProjectionParameters,
}

impl Projector {
    /// Creates a new `Projector`. Fails if the parameters are invalid
    pub fn new(parameters: ProjectionParameters) -> Result<Self, ProjectionError> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &ProjectionParameters {
        &self.parameters
    }

    /// Projects `cloud` into the requested images. Without a `frame` the field of view is fitted to the
    /// cloud and a new frame is returned. With a `frame`, its field of view, resolution, size and anchor
    /// are reused verbatim and points falling outside the frame are dropped
    ///
    /// The output is fully determined by the inputs: on equal range, the point that comes first in `cloud`
    /// is the one that stays visible
    pub fn project(
        &self,
        cloud: &PointCloud,
        frame: Option<ReferenceFrame>,
    ) -> Result<Projection, ProjectionError> {
        let params = &self.parameters;
        if cloud.is_empty() {
            return Err(ProjectionError::EmptyPointCloud);
        }
        if params.make_color_image && !cloud.has_colors() {
            return Err(ProjectionError::MissingColors);
        }

        let anchor = match &frame {
            Some(frame) => *frame.anchor(),
            None => cloud.centroid().ok_or(ProjectionError::EmptyPointCloud)?,
        };
        let positions = if params.top_view {
            rotate_to_top_view(cloud.positions(), &anchor)
        } else {
            cloud.positions().to_vec()
        };

        let range = (params.camera_position - anchor).norm();
        if !(range.is_finite() && range > 0.0) {
            return Err(ProjectionError::DegenerateGeometry(format!(
                "camera to anchor distance is {}",
                range
            )));
        }
        let pitch_m = params.resolution_cm / 100.0;
        let fitted_resolution = pitch_m.atan2(range).to_degrees();

        let recentered = positions
            .iter()
            .map(|position| position - params.camera_position)
            .collect::<Vec<_>>();
        let spherical = cartesian_to_spherical_all(&recentered);
        let mut h_angles = spherical.iter().map(|s| s.theta_degrees()).collect::<Vec<_>>();
        let mut v_angles = spherical.iter().map(|s| s.phi_degrees()).collect::<Vec<_>>();
        wrap_angles(&mut h_angles);
        wrap_angles(&mut v_angles);

        let fitted = frame.is_none();
        let frame = match frame {
            Some(frame) => {
                if (frame.resolution() - fitted_resolution).abs() > 1e-9 {
                    warn!(
                        "Reference frame resolution {} differs from the resolution {} fitted to this cloud, using the reference",
                        frame.resolution(),
                        fitted_resolution
                    );
                }
                frame
            }
            None => fit_frame(&h_angles, &v_angles, fitted_resolution, range, anchor, params)?,
        };
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Err(ProjectionError::DegenerateGeometry(format!(
                "raster size is {}x{}",
                width, height
            )));
        }

        let mut zbuffer = ZBuffer::new(width, height);
        let mut dropped = 0usize;
        for (index, ((h, v), s)) in h_angles
            .iter()
            .zip(v_angles.iter())
            .zip(spherical.iter())
            .enumerate()
        {
            let u = pixel_index(*h, frame.h_fov().0, frame.resolution(), height, fitted);
            let v = pixel_index(*v, frame.v_fov().0, frame.resolution(), width, fitted);
            match (u, v) {
                (Some(u), Some(v)) if zbuffer.insert(u, v, index, s.r) => {}
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("{} points fell outside of the {}x{} raster", dropped, width, height);
        }

        let visible = zbuffer.visible_points();
        let range_grid = scaled_range_grid(&visible, width, height);
        let normals = shading::surface_normals(&range_grid, width, height);

        let mut images = Vec::with_capacity(2);
        for kind in params.image_kinds() {
            let shaded = match kind {
                ImageKind::Color => {
                    let light = shading::light_direction(&params.camera_position, &anchor);
                    let factors =
                        shading::color_shading(&normals, &light, params.rgb_light_intensity);
                    let colors = cloud.colors().ok_or(ProjectionError::MissingColors)?;
                    shade_color_image(&visible, colors, &factors, width, height)
                }
                ImageKind::Range => {
                    let factors = shading::range_shading(&normals);
                    shade_range_image(
                        &visible,
                        &range_grid,
                        &factors,
                        params.range_light_intensity,
                        width,
                    )
                }
            };
            let mut blurred = filters::gaussian_blur_3x3(&shaded, width, height);
            filters::flip_left_right(&mut blurred, width);

            let metadata = RasterMetadata {
                image_kind: kind,
                source_path: params.source_path.clone(),
                resolution_cm: params.resolution_cm,
                top_view: params.top_view,
                camera_position: params.camera_position,
                anchor,
                rgb_light_intensity: params.rgb_light_intensity,
                range_light_intensity: params.range_light_intensity,
                h_img_res: height,
                v_img_res: width,
                h_fov: frame.h_fov(),
                v_fov: frame.v_fov(),
                angular_resolution: frame.resolution(),
            };
            let image = RasterImage::new(width, height, filters::quantize(&blurred), metadata)
                .map_err(|e| ProjectionError::DegenerateGeometry(e.to_string()))?;
            images.push(image);
        }

        info!(
            "Projected {} points ({} visible) into {}x{} raster(s)",
            cloud.len(),
            visible.len(),
            width,
            height
        );
        Ok(Projection { images, frame })
    }
}

/// Pixel index of `angle` along one axis of a raster with `size` pixels. A frame fitted to the projected cloud
/// contains all of its points, so there an angle on the upper FOV bound that rounds onto `size` falls into the
/// last pixel. Angles outside of a reused frame yield `None`
fn pixel_index(angle: f64, fov_min: f64, resolution: f64, size: usize, fitted: bool) -> Option<usize> {
    let index = ((angle - fov_min) / resolution).round_ties_even();
    if !(index >= 0.0) {
        return None;
    }
    let index = index as usize;
    if index < size {
        Some(index)
    } else if fitted && index == size {
        Some(size - 1)
    } else {
        None
    }
}

fn fit_frame(
    h_angles: &[f64],
    v_angles: &[f64],
    resolution: f64,
    range: f64,
    anchor: Vector3<f64>,
    params: &ProjectionParameters,
) -> Result<ReferenceFrame, ProjectionError> {
    let buffer_deg = params.fov_buffer_m.atan2(range).to_degrees();
    let bounds = |angles: &[f64]| {
        let (min, max) = angles.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), angle| (min.min(*angle), max.max(*angle)),
        );
        (min.floor() - buffer_deg, max.ceil() + buffer_deg)
    };
    let h_fov = bounds(h_angles);
    let v_fov = bounds(v_angles);

    let size = |fov: (f64, f64)| -> Result<usize, ProjectionError> {
        let size = ((fov.1 - fov.0) / resolution).round_ties_even();
        if !size.is_finite() || size < 1.0 {
            return Err(ProjectionError::DegenerateGeometry(format!(
                "field of view [{}, {}] is too small for resolution {}",
                fov.0, fov.1, resolution
            )));
        }
        Ok(size as usize)
    };
    let height = size(h_fov)?;
    let width = size(v_fov)?;

    Ok(ReferenceFrame::new(h_fov, v_fov, resolution, width, height, anchor))
}

/// Ranges of the visible points, min-max scaled to `[0, 255]`, on a dense grid with background 0
fn scaled_range_grid(visible: &[VisiblePoint], width: usize, height: usize) -> Vec<f64> {
    let (min, max) = visible.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), p| (min.min(p.range), max.max(p.range)),
    );
    let span = max - min;

    let mut grid = vec![0.0; width * height];
    for point in visible {
        grid[point.row * width + point.col] = if span > 0.0 {
            (point.range - min) * 255.0 / span
        } else {
            0.0
        };
    }
    grid
}

fn shade_color_image(
    visible: &[VisiblePoint],
    colors: &[Vector3<u8>],
    factors: &[f64],
    width: usize,
    height: usize,
) -> Vec<f32> {
    let mut image = vec![0.0f32; width * height * 3];
    for point in visible {
        let cell = point.row * width + point.col;
        let color = colors[point.index];
        for channel in 0..3 {
            image[cell * 3 + channel] = (color[channel] as f64 * factors[cell]) as f32;
        }
    }
    filters::truncate_to_u8_range(&mut image);
    let mut filled = filters::fill_dark_pixels(&image, width, height);
    filters::truncate_to_u8_range(&mut filled);
    filled
}

fn shade_range_image(
    visible: &[VisiblePoint],
    range_grid: &[f64],
    factors: &[f64],
    range_light_intensity: f64,
    width: usize,
) -> Vec<f32> {
    let mut image = vec![0.0f32; range_grid.len() * 3];
    for point in visible {
        let cell = point.row * width + point.col;
        let value = ((range_grid[cell] + range_light_intensity) * factors[cell]).clamp(0.0, 255.0);
        for channel in 0..3 {
            image[cell * 3 + channel] = value as f32;
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronocloud_core::math::AABB;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    fn setup_wall(num_points: usize, seed: u64) -> PointCloud {
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
        PointCloud::from_positions_and_colors(positions, colors).unwrap()
    }

    fn both_images() -> ProjectionParameters {
        ProjectionParameters {
            source_path: "wall.xyz".into(),
            resolution_cm: 10.0,
            make_color_image: true,
            make_range_image: true,
            fov_buffer_m: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_cloud_is_rejected() {
        let projector = Projector::new(ProjectionParameters::default()).unwrap();
        let result = projector.project(&PointCloud::default(), None);
        assert_eq!(result.unwrap_err(), ProjectionError::EmptyPointCloud);
    }

    #[test]
    fn test_color_request_without_colors() {
        let projector = Projector::new(both_images()).unwrap();
        let cloud = PointCloud::from_positions(vec![Vector3::new(10.0, 0.0, 0.0)]);
        assert_eq!(
            projector.project(&cloud, None).unwrap_err(),
            ProjectionError::MissingColors
        );
    }

    #[test]
    fn test_camera_at_anchor_is_degenerate() {
        let projector = Projector::new(ProjectionParameters::default()).unwrap();
        let cloud = PointCloud::from_positions(vec![
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        ]);
        assert!(matches!(
            projector.project(&cloud, None),
            Err(ProjectionError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let no_images = ProjectionParameters {
            make_range_image: false,
            ..Default::default()
        };
        assert!(Projector::new(no_images).is_err());

        let zero_resolution = ProjectionParameters {
            resolution_cm: 0.0,
            ..Default::default()
        };
        assert!(Projector::new(zero_resolution).is_err());
    }

    #[test]
    fn test_projection_is_deterministic() {
        let cloud = setup_wall(2000, 7);
        let projector = Projector::new(both_images()).unwrap();
        let first = projector.project(&cloud, None).unwrap();
        let second = projector.project(&cloud, None).unwrap();
        assert_eq!(first.images, second.images);
        assert_eq!(first.frame, second.frame);
        assert_eq!(first.images.len(), 2);
    }

    #[test]
    fn test_frame_matches_geometry() {
        let cloud = setup_wall(500, 3);
        let projector = Projector::new(both_images()).unwrap();
        let projection = projector.project(&cloud, None).unwrap();
        let frame = projection.frame;

        let anchor = cloud.centroid().unwrap();
        assert_eq!(*frame.anchor(), anchor);
        let expected_resolution = 0.1f64.atan2(anchor.norm()).to_degrees();
        assert!((frame.resolution() - expected_resolution).abs() < 1e-12);

        // The wall faces the camera along +x, so polar angles are around 90° and azimuths around 0°
        assert!(frame.h_fov().0 < 90.0 && frame.h_fov().1 > 90.0);
        assert!(frame.v_fov().0 < 0.0 && frame.v_fov().1 > 0.0);
        assert_eq!(
            frame.height(),
            ((frame.h_fov().1 - frame.h_fov().0) / frame.resolution()).round() as usize
        );

        let range = projection.image(ImageKind::Range).unwrap();
        assert_eq!(range.width(), frame.width());
        assert_eq!(range.height(), frame.height());
        assert_eq!(range.metadata().h_img_res, frame.height());
        assert_eq!(range.metadata().v_img_res, frame.width());
        assert_eq!(range.metadata().image_kind, ImageKind::Range);
    }

    #[test]
    fn test_later_epoch_reuses_frame() {
        let first_epoch = setup_wall(800, 11);
        // The second epoch is shifted and larger, some points fall outside of the frame
        let second_epoch: PointCloud = setup_wall(800, 12)
            .positions()
            .iter()
            .map(|p| p + Vector3::new(0.3, 1.5, 0.4))
            .collect();

        let params = ProjectionParameters {
            make_color_image: false,
            ..both_images()
        };
        let projector = Projector::new(params).unwrap();
        let reference = projector.project(&first_epoch, None).unwrap();
        let aligned = projector
            .project(&second_epoch, Some(reference.frame))
            .unwrap();

        assert_eq!(aligned.frame, reference.frame);
        let reference_image = &reference.images[0];
        let aligned_image = &aligned.images[0];
        assert_eq!(aligned_image.width(), reference_image.width());
        assert_eq!(aligned_image.height(), reference_image.height());
        assert_eq!(aligned_image.metadata().anchor, reference_image.metadata().anchor);
    }

    #[test]
    fn test_occluded_point_is_hidden() {
        // Two points on the same ray, the far one first. Only the near one may contribute to the raster
        let near = Vector3::new(5.0, 0.0, 0.0);
        let far = Vector3::new(10.0, 0.0, 0.0);
        let spread = vec![
            far,
            near,
            Vector3::new(7.0, 0.7, 0.7),
            Vector3::new(7.0, -0.7, -0.7),
        ];
        let colors = vec![
            Vector3::new(250, 0, 0),
            Vector3::new(0, 250, 0),
            Vector3::new(0, 250, 0),
            Vector3::new(0, 250, 0),
        ];
        let cloud = PointCloud::from_positions_and_colors(spread, colors).unwrap();
        let params = ProjectionParameters {
            resolution_cm: 50.0,
            make_color_image: true,
            make_range_image: false,
            ..Default::default()
        };
        let projection = Projector::new(params).unwrap().project(&cloud, None).unwrap();
        let image = &projection.images[0];
        // Only the hidden point carries red, so no pixel may have any red in it
        assert!(image.as_raw().chunks(3).all(|pixel| pixel[0] == 0));
    }

    #[test]
    fn test_pixel_index() {
        assert_eq!(pixel_index(0.0, -12.0, 0.5, 24, true), Some(23));
        assert_eq!(pixel_index(0.0, -12.0, 0.5, 24, false), None);
        assert_eq!(pixel_index(-12.0, -12.0, 0.5, 24, false), Some(0));
        assert_eq!(pixel_index(-12.5, -12.0, 0.5, 24, true), None);
        assert_eq!(pixel_index(1.0, -12.0, 0.5, 24, true), None);
        assert_eq!(pixel_index(f64::NAN, -12.0, 0.5, 24, true), None);
    }

    #[test]
    fn test_point_on_fitted_fov_max_is_kept() {
        // The red point has azimuth 0, which is also the ceiled maximum azimuth of the cloud
        let cloud = PointCloud::from_positions_and_colors(
            vec![
                Vector3::new(10.0, 0.0, -5.0),
                Vector3::new(10.0, -1.0, -4.9),
                Vector3::new(10.0, -2.0, -5.1),
            ],
            vec![
                Vector3::new(250, 0, 0),
                Vector3::new(0, 250, 0),
                Vector3::new(0, 250, 0),
            ],
        )
        .unwrap();
        let params = ProjectionParameters {
            resolution_cm: 10.0,
            make_color_image: true,
            make_range_image: false,
            ..Default::default()
        };
        let projection = Projector::new(params).unwrap().project(&cloud, None).unwrap();
        assert_eq!(projection.frame.v_fov().1, 0.0);

        let image = &projection.images[0];
        assert!(image.as_raw().chunks(3).any(|pixel| pixel[0] > 0));
        assert!(image.as_raw().chunks(3).any(|pixel| pixel[1] > 0));
    }

    #[test]
    fn test_top_view_projection() {
        let cloud = setup_wall(300, 5);
        let bounds: AABB = cloud.bounds().unwrap();
        let params = ProjectionParameters {
            top_view: true,
            camera_position: bounds.center() + Vector3::new(0.0, 0.0, 30.0),
            ..Default::default()
        };
        let projection = Projector::new(params).unwrap().project(&cloud, None).unwrap();
        assert!(projection.images[0].metadata().top_view);
        assert!(projection.frame.width() > 0);
    }
}
