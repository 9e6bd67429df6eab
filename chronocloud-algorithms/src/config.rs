use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    change_events::{check_temporal_format, EpochParseError, DEFAULT_TEMPORAL_FORMAT},
    clustering::{ChangeClusterer, ClusteringError},
    projection::{ProjectionError, ProjectionParameters},
};
use chronocloud_core::nalgebra::Vector3;

/// Invalid pipeline configuration. Always detected before any data is processed
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("project_name must not be empty")]
    EmptyProjectName,
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Clustering(#[from] ClusteringError),
    #[error(transparent)]
    TemporalFormat(#[from] EpochParseError),
}

fn default_temporal_format() -> String {
    DEFAULT_TEMPORAL_FORMAT.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSetting {
    pub project_name: String,
    pub output_folder: String,
    /// strftime format of the acquisition times in input file names
    #[serde(default = "default_temporal_format")]
    pub temporal_format: String,
    #[serde(default)]
    pub silent_mode: bool,
    /// Append the start time of the run to the project name
    #[serde(default)]
    pub include_timestamp: bool,
}

/// Settings of the point cloud projection, see [ProjectionParameters]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcProjection {
    pub pc_path: String,
    pub make_range_image: bool,
    pub make_color_image: bool,
    pub top_view: bool,
    pub resolution_cm: f64,
    pub camera_position: [f64; 3],
    pub rgb_light_intensity: f64,
    pub range_light_intensity: f64,
    pub fov_buffer_m: f64,
}

impl Default for PcProjection {
    fn default() -> Self {
        let defaults = ProjectionParameters::default();
        Self {
            pc_path: defaults.source_path,
            make_range_image: defaults.make_range_image,
            make_color_image: defaults.make_color_image,
            top_view: defaults.top_view,
            resolution_cm: defaults.resolution_cm,
            camera_position: [
                defaults.camera_position.x,
                defaults.camera_position.y,
                defaults.camera_position.z,
            ],
            rgb_light_intensity: defaults.rgb_light_intensity,
            range_light_intensity: defaults.range_light_intensity,
            fov_buffer_m: defaults.fov_buffer_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeClustering {
    /// Neighbourhood radius in meters
    pub epsilon: f64,
    /// Minimum number of neighbours of a core point
    pub min_size: usize,
}

impl Default for ChangeClustering {
    fn default() -> Self {
        Self {
            epsilon: 0.5,
            min_size: 5,
        }
    }
}

/// Configuration of a chronocloud run, usually read from a JSON file:
///
/// ```
/// # use chronocloud_algorithms::config::PipelineConfig;
/// let config: PipelineConfig = serde_json::from_str(r#"{
///     "project_setting": {"project_name": "Cliff", "output_folder": "./out"},
///     "pc_projection": {"make_color_image": true, "camera_position": [0.0, 0.0, 1.5]},
///     "change_clustering": {"epsilon": 0.3, "min_size": 8}
/// }"#).unwrap();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.project_setting.temporal_format, "%y%m%d_%H%M%S");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub project_setting: ProjectSetting,
    #[serde(default)]
    pub pc_projection: PcProjection,
    #[serde(default)]
    pub change_clustering: ChangeClustering,
}

impl PipelineConfig {
    /// Checks every section of the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_setting.project_name.trim().is_empty() {
            return Err(ConfigError::EmptyProjectName);
        }
        check_temporal_format(&self.project_setting.temporal_format)?;
        self.projection_parameters().validate()?;
        self.clusterer()?;
        Ok(())
    }

    pub fn projection_parameters(&self) -> ProjectionParameters {
        let projection = &self.pc_projection;
        ProjectionParameters {
            source_path: projection.pc_path.clone(),
            camera_position: Vector3::from(projection.camera_position),
            resolution_cm: projection.resolution_cm,
            rgb_light_intensity: projection.rgb_light_intensity,
            range_light_intensity: projection.range_light_intensity,
            make_color_image: projection.make_color_image,
            make_range_image: projection.make_range_image,
            top_view: projection.top_view,
            fov_buffer_m: projection.fov_buffer_m,
        }
    }

    pub fn clusterer(&self) -> Result<ChangeClusterer, ClusteringError> {
        ChangeClusterer::new(
            self.change_clustering.epsilon,
            self.change_clustering.min_size,
        )
    }

    /// The project name, followed by `timestamp` if `include_timestamp` is set
    pub fn project_name(&self, timestamp: &str) -> String {
        if self.project_setting.include_timestamp {
            format!("{}_{}", self.project_setting.project_name, timestamp)
        } else {
            self.project_setting.project_name.clone()
        }
    }
}
