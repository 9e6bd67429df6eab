use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chronocloud_algorithms::config::PipelineConfig;
use log::info;

pub const CHANGE_ANALYSIS_FOLDER: &str = "01_change_analysis";
pub const CHANGE_EVENTS_FOLDER: &str = "02_change_events";
pub const PROJECTED_IMAGES_FOLDER: &str = "03_projected_images";
pub const PROJECTED_CHANGE_EVENTS_FOLDER: &str = "04_projected_change_events";
pub const DOCUMENTATION_FOLDER: &str = "documentation";

/// Reads a pipeline configuration from a JSON file and validates it
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Could not open configuration {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse configuration {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration {}", path.display()))?;
    Ok(config)
}

/// Folder structure of a chronocloud project:
///
/// ```text
/// <output_folder>/<project_name>/
///     01_change_analysis/
///     02_change_events/<epoch pair>/change_events.json
///     03_projected_images/
///     04_projected_change_events/
///     documentation/<project_name>.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    name: String,
    root: PathBuf,
}

impl ProjectLayout {
    /// Creates all folders of the project below `output_folder`. Existing folders are reused
    pub fn create<P: AsRef<Path>>(output_folder: P, project_name: &str) -> Result<Self> {
        let layout = Self {
            name: project_name.to_owned(),
            root: output_folder.as_ref().join(project_name),
        };
        for folder in [
            layout.change_analysis(),
            layout.change_events(),
            layout.projected_images(),
            layout.projected_change_events(),
            layout.documentation(),
        ]
        .iter()
        {
            fs::create_dir_all(folder)
                .with_context(|| format!("Could not create folder {}", folder.display()))?;
        }
        info!("Project folder is {}", layout.root.display());
        Ok(layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn change_analysis(&self) -> PathBuf {
        self.root.join(CHANGE_ANALYSIS_FOLDER)
    }

    pub fn change_events(&self) -> PathBuf {
        self.root.join(CHANGE_EVENTS_FOLDER)
    }

    pub fn projected_images(&self) -> PathBuf {
        self.root.join(PROJECTED_IMAGES_FOLDER)
    }

    pub fn projected_change_events(&self) -> PathBuf {
        self.root.join(PROJECTED_CHANGE_EVENTS_FOLDER)
    }

    pub fn documentation(&self) -> PathBuf {
        self.root.join(DOCUMENTATION_FOLDER)
    }

    /// Creates (if needed) and returns the change-event folder of one epoch pair
    pub fn pair_folder(&self, pair_name: &str) -> Result<PathBuf> {
        let folder = self.change_events().join(pair_name);
        fs::create_dir_all(&folder)
            .with_context(|| format!("Could not create folder {}", folder.display()))?;
        Ok(folder)
    }

    /// Stores the configuration a run was started with as `documentation/<project_name>.json`
    pub fn write_config(&self, config: &PipelineConfig) -> Result<PathBuf> {
        let path = self.documentation().join(format!("{}.json", self.name));
        let file = File::create(&path)
            .with_context(|| format!("Could not create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), config)
            .with_context(|| format!("Could not write configuration to {}", path.display()))?;
        Ok(path)
    }
}
