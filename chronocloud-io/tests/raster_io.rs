use anyhow::Result;
use chronocloud_algorithms::projection::{ProjectionParameters, Projector};
use chronocloud_core::meta::{ImageKind, Metadata};
use chronocloud_io::raster::{read_raster, read_raster_metadata, read_raster_tags, write_raster};

use crate::common::{random_wall, TestDir};

mod common;

fn project_wall() -> Result<Vec<chronocloud_core::containers::RasterImage>> {
    let cloud = random_wall(1500, 21);
    let projector = Projector::new(ProjectionParameters {
        source_path: "wall.xyz".into(),
        resolution_cm: 10.0,
        make_color_image: true,
        make_range_image: true,
        fov_buffer_m: 0.5,
        ..Default::default()
    })?;
    Ok(projector.project(&cloud, None)?.images)
}

#[test]
fn test_raster_roundtrip() -> Result<()> {
    let dir = TestDir::new("raster_roundtrip");
    for image in project_wall()? {
        let path = dir
            .path()
            .join(format!("wall_{}.png", image.metadata().image_kind));
        write_raster(&image, &path)?;

        assert_eq!(&read_raster_metadata(&path)?, image.metadata());
        assert_eq!(read_raster_tags(&path)?, image.metadata().tags());
        assert_eq!(read_raster(&path)?, image);
    }
    Ok(())
}

#[test]
fn test_tag_file_has_all_keys() -> Result<()> {
    let dir = TestDir::new("raster_tags");
    let images = project_wall()?;
    let range = images
        .iter()
        .find(|image| image.metadata().image_kind == ImageKind::Range)
        .ok_or_else(|| anyhow::anyhow!("No range image"))?;
    let path = dir.path().join("range.png");
    write_raster(range, &path)?;

    let tags = read_raster_tags(&path)?;
    for key in [
        "pc_path",
        "image_type",
        "resolution_cm",
        "top_view",
        "camera_position_x",
        "camera_position_y",
        "camera_position_z",
        "pc_mean_x",
        "pc_mean_y",
        "pc_mean_z",
        "rgb_light_intensity",
        "range_light_intensity",
        "h_img_res",
        "v_img_res",
        "h_fov_x",
        "h_fov_y",
        "v_fov_x",
        "v_fov_y",
        "res",
    ]
    .iter()
    {
        assert!(tags.contains_key(*key), "missing tag {}", key);
    }
    assert_eq!(tags.len(), 19);
    assert_eq!(tags["image_type"], "Range");
    assert_eq!(tags["pc_path"], "wall.xyz");
    Ok(())
}

#[test]
fn test_missing_sidecar_is_an_error() -> Result<()> {
    let dir = TestDir::new("raster_no_sidecar");
    let path = dir.path().join("orphan.png");
    std::fs::write(&path, b"not a png")?;
    assert!(read_raster_metadata(&path).is_err());
    Ok(())
}
