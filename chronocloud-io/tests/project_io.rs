use std::fs;

use anyhow::Result;
use chronocloud_algorithms::config::PipelineConfig;
use chronocloud_io::project::{read_config, ProjectLayout, CHANGE_EVENTS_FOLDER};

use crate::common::TestDir;

mod common;

const CONFIG: &str = r#"{
    "project_setting": {
        "project_name": "Cliff",
        "output_folder": "unused",
        "temporal_format": "%y%m%d_%H%M%S",
        "silent_mode": true,
        "include_timestamp": false
    },
    "pc_projection": {
        "make_range_image": true,
        "make_color_image": true,
        "resolution_cm": 8.0,
        "camera_position": [0.0, 0.0, 2.0],
        "epsg": 25832
    },
    "change_clustering": {"epsilon": 0.4, "min_size": 6}
}"#;

#[test]
fn test_layout_and_config() -> Result<()> {
    let dir = TestDir::new("project_layout");
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, CONFIG)?;
    let config = read_config(&config_path)?;
    assert_eq!(config.pc_projection.resolution_cm, 8.0);
    assert!(config.project_setting.silent_mode);

    let layout = ProjectLayout::create(dir.path(), &config.project_name("unused"))?;
    assert_eq!(layout.name(), "Cliff");
    assert!(layout.change_events().is_dir());
    assert!(layout.projected_images().is_dir());
    assert!(layout.documentation().is_dir());

    let pair = layout.pair_folder("231014_120000_231015_120000")?;
    assert!(pair.is_dir());
    assert!(pair.starts_with(dir.path().join("Cliff").join(CHANGE_EVENTS_FOLDER)));

    // The stored configuration is complete and reads back to the same values
    let stored = layout.write_config(&config)?;
    let stored_config: PipelineConfig = serde_json::from_str(&fs::read_to_string(stored)?)?;
    assert_eq!(stored_config, config);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
    let dir = TestDir::new("project_invalid_config");
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, CONFIG.replace("\"epsilon\": 0.4", "\"epsilon\": 0.0"))?;
    let error = read_config(&config_path).unwrap_err();
    assert!(format!("{:#}", error).contains("epsilon"));

    assert!(read_config(dir.path().join("missing.json")).is_err());
    Ok(())
}
