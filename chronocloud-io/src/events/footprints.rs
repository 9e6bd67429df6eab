use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chronocloud_algorithms::change_events::ChangeEventCollection;
use chronocloud_core::{meta::RasterMetadata, nalgebra::Vector3};
use serde::Serialize;

/// The hull vertices of a change event mapped into the pixel grid of a projected raster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFootprint {
    pub object_id: String,
    pub event_type: String,
    /// `[row, column]` of each hull vertex in the stored (flipped) raster. Vertices outside the raster keep
    /// their out-of-range coordinates
    pub pixels: Vec<[i64; 2]>,
}

/// Maps the hull vertices of every event in `collection` into the raster described by `metadata`
pub fn event_footprints(
    collection: &ChangeEventCollection,
    metadata: &RasterMetadata,
) -> Vec<EventFootprint> {
    collection
        .iter()
        .map(|event| {
            let vertices = event
                .convex_hull()
                .points_building
                .iter()
                .map(|p| Vector3::new(p[0], p[1], p[2]))
                .collect::<Vec<_>>();
            let pixels = metadata
                .pixel_coordinates(&vertices)
                .iter()
                .map(|pixel| {
                    let (row, col) = metadata.stored_pixel(pixel);
                    [row, col]
                })
                .collect();
            EventFootprint {
                object_id: event.object_id().to_string(),
                event_type: event.event_type().to_owned(),
                pixels,
            }
        })
        .collect()
}

/// Writes footprints as a JSON array to `path`
pub fn write_footprints<P: AsRef<Path>>(path: P, footprints: &[EventFootprint]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Could not create footprint file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, footprints)
        .with_context(|| format!("Could not write footprints to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
