use std::{any::Any, collections::BTreeMap, fmt::Display, str::FromStr};

use nalgebra::Vector3;

use super::{Metadata, ReferenceFrame};
use crate::{
    error::MetadataError,
    math::{cartesian_to_spherical, rotate_to_top_view, wrap_angles_by_span},
};

/// Names of the tags under which [RasterMetadata] is persisted
pub mod tags {
    pub const PC_PATH: &str = "pc_path";
    pub const IMAGE_TYPE: &str = "image_type";
    pub const RESOLUTION_CM: &str = "resolution_cm";
    pub const TOP_VIEW: &str = "top_view";
    pub const CAMERA_POSITION_X: &str = "camera_position_x";
    pub const CAMERA_POSITION_Y: &str = "camera_position_y";
    pub const CAMERA_POSITION_Z: &str = "camera_position_z";
    pub const PC_MEAN_X: &str = "pc_mean_x";
    pub const PC_MEAN_Y: &str = "pc_mean_y";
    pub const PC_MEAN_Z: &str = "pc_mean_z";
    pub const RGB_LIGHT_INTENSITY: &str = "rgb_light_intensity";
    pub const RANGE_LIGHT_INTENSITY: &str = "range_light_intensity";
    pub const H_IMG_RES: &str = "h_img_res";
    pub const V_IMG_RES: &str = "v_img_res";
    pub const H_FOV_X: &str = "h_fov_x";
    pub const H_FOV_Y: &str = "h_fov_y";
    pub const V_FOV_X: &str = "v_fov_x";
    pub const V_FOV_Y: &str = "v_fov_y";
    pub const RES: &str = "res";
}

/// Which quantity a raster visualizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Shaded point colors
    Color,
    /// Shaded distance to the camera
    Range,
}

impl Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageKind::Color => write!(f, "Color"),
            ImageKind::Range => write!(f, "Range"),
        }
    }
}

impl FromStr for ImageKind {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Color" => Ok(ImageKind::Color),
            "Range" => Ok(ImageKind::Range),
            other => Err(MetadataError::InvalidTag {
                key: tags::IMAGE_TYPE.into(),
                value: other.into(),
            }),
        }
    }
}

/// Position of a 3D point in the pixel grid of a raster, before the final left-right flip. `u` indexes
/// rows (polar angle), `v` indexes columns (azimuth). Values outside the raster are kept as they are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoordinate {
    pub u: i64,
    pub v: i64,
}

/// Everything needed to map pixels of a projected raster back to 3D space and vice versa
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub image_kind: ImageKind,
    pub source_path: String,
    pub resolution_cm: f64,
    pub top_view: bool,
    pub camera_position: Vector3<f64>,
    pub anchor: Vector3<f64>,
    pub rgb_light_intensity: f64,
    pub range_light_intensity: f64,
    /// Number of rows (polar angle direction)
    pub h_img_res: usize,
    /// Number of columns (azimuth direction)
    pub v_img_res: usize,
    pub h_fov: (f64, f64),
    pub v_fov: (f64, f64),
    /// Angular size of a pixel in degrees
    pub angular_resolution: f64,
}

impl RasterMetadata {
    /// Rebuilds `RasterMetadata` from the tag map produced by [Metadata::tags]
    pub fn from_tags(tags: &BTreeMap<String, String>) -> Result<Self, MetadataError> {
        let top_view = match get_tag(tags, tags::TOP_VIEW)?.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(MetadataError::InvalidTag {
                    key: tags::TOP_VIEW.into(),
                    value: other.into(),
                })
            }
        };

        Ok(Self {
            image_kind: get_tag(tags, tags::IMAGE_TYPE)?.parse()?,
            source_path: get_tag(tags, tags::PC_PATH)?.to_owned(),
            resolution_cm: parse_tag(tags, tags::RESOLUTION_CM)?,
            top_view,
            camera_position: Vector3::new(
                parse_tag(tags, tags::CAMERA_POSITION_X)?,
                parse_tag(tags, tags::CAMERA_POSITION_Y)?,
                parse_tag(tags, tags::CAMERA_POSITION_Z)?,
            ),
            anchor: Vector3::new(
                parse_tag(tags, tags::PC_MEAN_X)?,
                parse_tag(tags, tags::PC_MEAN_Y)?,
                parse_tag(tags, tags::PC_MEAN_Z)?,
            ),
            rgb_light_intensity: parse_tag(tags, tags::RGB_LIGHT_INTENSITY)?,
            range_light_intensity: parse_tag(tags, tags::RANGE_LIGHT_INTENSITY)?,
            h_img_res: parse_tag(tags, tags::H_IMG_RES)?,
            v_img_res: parse_tag(tags, tags::V_IMG_RES)?,
            h_fov: (
                parse_tag(tags, tags::H_FOV_X)?,
                parse_tag(tags, tags::H_FOV_Y)?,
            ),
            v_fov: (
                parse_tag(tags, tags::V_FOV_X)?,
                parse_tag(tags, tags::V_FOV_Y)?,
            ),
            angular_resolution: parse_tag(tags, tags::RES)?,
        })
    }

    /// The frame this raster was projected in. Passing it to a later projection aligns the later raster
    /// with this one
    pub fn reference_frame(&self) -> ReferenceFrame {
        ReferenceFrame::new(
            self.h_fov,
            self.v_fov,
            self.angular_resolution,
            self.v_img_res,
            self.h_img_res,
            self.anchor,
        )
    }

    /// Maps 3D positions into the pixel grid of this raster, applying the same top-view rotation and camera
    /// recentering the projection used. Angles are wrapped as a group when they span more than 180°
    pub fn pixel_coordinates(&self, positions: &[Vector3<f64>]) -> Vec<PixelCoordinate> {
        let positions = if self.top_view {
            rotate_to_top_view(positions, &self.anchor)
        } else {
            positions.to_vec()
        };

        let spherical = positions
            .iter()
            .map(|position| cartesian_to_spherical(&(position - self.camera_position)))
            .collect::<Vec<_>>();
        let mut h_angles = spherical.iter().map(|s| s.theta_degrees()).collect::<Vec<_>>();
        let mut v_angles = spherical.iter().map(|s| s.phi_degrees()).collect::<Vec<_>>();
        wrap_angles_by_span(&mut h_angles);
        wrap_angles_by_span(&mut v_angles);

        h_angles
            .iter()
            .zip(v_angles.iter())
            .map(|(h, v)| PixelCoordinate {
                u: ((h - self.h_fov.0) / self.angular_resolution).round_ties_even() as i64,
                v: ((v - self.v_fov.0) / self.angular_resolution).round_ties_even() as i64,
            })
            .collect()
    }

    /// The (polar angle, azimuth) in degrees at the center of the given pixel of the unflipped grid
    pub fn pixel_to_angles(&self, pixel: &PixelCoordinate) -> (f64, f64) {
        (
            self.h_fov.0 + pixel.u as f64 * self.angular_resolution,
            self.v_fov.0 + pixel.v as f64 * self.angular_resolution,
        )
    }

    /// The (row, column) of a pixel coordinate in the stored raster, which is flipped left to right
    pub fn stored_pixel(&self, pixel: &PixelCoordinate) -> (i64, i64) {
        (pixel.u, self.v_img_res as i64 - 1 - pixel.v)
    }
}

fn get_tag<'a>(tags: &'a BTreeMap<String, String>, key: &str) -> Result<&'a str, MetadataError> {
    tags.get(key)
        .map(|value| value.as_str())
        .ok_or_else(|| MetadataError::MissingTag(key.into()))
}

fn parse_tag<T: FromStr>(tags: &BTreeMap<String, String>, key: &str) -> Result<T, MetadataError> {
    let value = get_tag(tags, key)?;
    value.trim().parse().map_err(|_| MetadataError::InvalidTag {
        key: key.into(),
        value: value.into(),
    })
}

impl Metadata for RasterMetadata {
    fn tags(&self) -> BTreeMap<String, String> {
        let entries = [
            (tags::PC_PATH, self.source_path.clone()),
            (tags::IMAGE_TYPE, self.image_kind.to_string()),
            (tags::RESOLUTION_CM, self.resolution_cm.to_string()),
            (
                tags::TOP_VIEW,
                if self.top_view { "True" } else { "False" }.to_owned(),
            ),
            (tags::CAMERA_POSITION_X, self.camera_position.x.to_string()),
            (tags::CAMERA_POSITION_Y, self.camera_position.y.to_string()),
            (tags::CAMERA_POSITION_Z, self.camera_position.z.to_string()),
            (tags::PC_MEAN_X, self.anchor.x.to_string()),
            (tags::PC_MEAN_Y, self.anchor.y.to_string()),
            (tags::PC_MEAN_Z, self.anchor.z.to_string()),
            (tags::RGB_LIGHT_INTENSITY, self.rgb_light_intensity.to_string()),
            (
                tags::RANGE_LIGHT_INTENSITY,
                self.range_light_intensity.to_string(),
            ),
            (tags::H_IMG_RES, self.h_img_res.to_string()),
            (tags::V_IMG_RES, self.v_img_res.to_string()),
            (tags::H_FOV_X, self.h_fov.0.to_string()),
            (tags::H_FOV_Y, self.h_fov.1.to_string()),
            (tags::V_FOV_X, self.v_fov.0.to_string()),
            (tags::V_FOV_Y, self.v_fov.1.to_string()),
            (tags::RES, self.angular_resolution.to_string()),
        ];
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    fn get_named_field(&self, field_name: &str) -> Option<Box<dyn Any>> {
        match field_name {
            tags::PC_PATH => Some(Box::new(self.source_path.clone())),
            tags::IMAGE_TYPE => Some(Box::new(self.image_kind)),
            tags::RESOLUTION_CM => Some(Box::new(self.resolution_cm)),
            tags::TOP_VIEW => Some(Box::new(self.top_view)),
            tags::CAMERA_POSITION_X => Some(Box::new(self.camera_position.x)),
            tags::CAMERA_POSITION_Y => Some(Box::new(self.camera_position.y)),
            tags::CAMERA_POSITION_Z => Some(Box::new(self.camera_position.z)),
            tags::PC_MEAN_X => Some(Box::new(self.anchor.x)),
            tags::PC_MEAN_Y => Some(Box::new(self.anchor.y)),
            tags::PC_MEAN_Z => Some(Box::new(self.anchor.z)),
            tags::RGB_LIGHT_INTENSITY => Some(Box::new(self.rgb_light_intensity)),
            tags::RANGE_LIGHT_INTENSITY => Some(Box::new(self.range_light_intensity)),
            tags::H_IMG_RES => Some(Box::new(self.h_img_res)),
            tags::V_IMG_RES => Some(Box::new(self.v_img_res)),
            tags::H_FOV_X => Some(Box::new(self.h_fov.0)),
            tags::H_FOV_Y => Some(Box::new(self.h_fov.1)),
            tags::V_FOV_X => Some(Box::new(self.v_fov.0)),
            tags::V_FOV_Y => Some(Box::new(self.v_fov.1)),
            tags::RES => Some(Box::new(self.angular_resolution)),
            _ => None,
        }
    }
}

impl Display for RasterMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Image type:                  {}", self.image_kind)?;
        writeln!(f, "Source point cloud:          {}", self.source_path)?;
        writeln!(f, "Size (columns x rows):       {} x {}", self.v_img_res, self.h_img_res)?;
        writeln!(f, "Pixel pitch (cm):            {}", self.resolution_cm)?;
        writeln!(f, "Angular resolution (deg):    {}", self.angular_resolution)?;
        writeln!(
            f,
            "Polar angle range (deg):     [{}, {}]",
            self.h_fov.0, self.h_fov.1
        )?;
        writeln!(
            f,
            "Azimuth range (deg):         [{}, {}]",
            self.v_fov.0, self.v_fov.1
        )?;
        writeln!(
            f,
            "Camera position:             ({}, {}, {})",
            self.camera_position.x, self.camera_position.y, self.camera_position.z
        )?;
        writeln!(
            f,
            "Anchor:                      ({}, {}, {})",
            self.anchor.x, self.anchor.y, self.anchor.z
        )?;
        writeln!(f, "Top view:                    {}", self.top_view)?;
        writeln!(
            f,
            "Light intensity (rgb/range): {} / {}",
            self.rgb_light_intensity, self.range_light_intensity
        )
    }
}
