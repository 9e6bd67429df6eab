//! Persistence of projected rasters. The pixels are written as an RGB PNG, the [RasterMetadata] as a JSON
//! map of string tags in a sidecar file next to it (`<image>.png.json`). The tags are stored verbatim, so
//! reading them back yields metadata equal to the one that was written.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chronocloud_core::{
    containers::RasterImage,
    meta::{Metadata, RasterMetadata},
};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
use log::debug;

/// Path of the tag file that accompanies the raster at `path`
pub fn sidecar_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut sidecar = path.as_ref().as_os_str().to_owned();
    sidecar.push(".json");
    PathBuf::from(sidecar)
}

/// Writes `image` as PNG to `path` and its metadata tags to the sidecar file
pub fn write_raster<P: AsRef<Path>>(image: &RasterImage, path: P) -> Result<()> {
    let path = path.as_ref();
    {
        let file = File::create(path)
            .with_context(|| format!("Could not create raster file {}", path.display()))?;
        let encoder = PngEncoder::new(BufWriter::new(file));
        encoder
            .write_image(
                image.as_raw(),
                image.width() as u32,
                image.height() as u32,
                ExtendedColorType::Rgb8,
            )
            .with_context(|| format!("Could not encode raster {}", path.display()))?;
    }

    let tags_path = sidecar_path(path);
    let tags_file = File::create(&tags_path)
        .with_context(|| format!("Could not create tag file {}", tags_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(tags_file), &image.metadata().tags())
        .with_context(|| format!("Could not write tag file {}", tags_path.display()))?;
    debug!(
        "Wrote {}x{} raster to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// Reads the raw tag map of the raster at `path`
pub fn read_raster_tags<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, String>> {
    let tags_path = sidecar_path(path);
    let file = File::open(&tags_path)
        .with_context(|| format!("Could not open tag file {}", tags_path.display()))?;
    let tags = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse tag file {}", tags_path.display()))?;
    Ok(tags)
}

/// Rebuilds the metadata of the raster at `path` from its tag file
pub fn read_raster_metadata<P: AsRef<Path>>(path: P) -> Result<RasterMetadata> {
    let path = path.as_ref();
    let tags = read_raster_tags(path)?;
    RasterMetadata::from_tags(&tags)
        .with_context(|| format!("Invalid metadata for raster {}", path.display()))
}

/// Reads pixels and metadata of the raster at `path`
pub fn read_raster<P: AsRef<Path>>(path: P) -> Result<RasterImage> {
    let path = path.as_ref();
    let metadata = read_raster_metadata(path)?;
    let pixels = image::open(path)
        .with_context(|| format!("Could not decode raster {}", path.display()))?
        .into_rgb8();
    let (width, height) = (pixels.width() as usize, pixels.height() as usize);
    Ok(RasterImage::new(width, height, pixels.into_raw(), metadata)?)
}
