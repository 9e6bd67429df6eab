use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{bail, Context, Result};
use chronocloud_core::{
    containers::{ChangePoint, Epoch, PointCloud},
    nalgebra::Vector3,
};
use log::{debug, info};

use super::{AsciiRecord, ColumnType, RawAsciiReader};

/// Reads a [PointCloud] from a delimited text file. The format string names the meaning of each column:
///
/// ```text
/// s - skip this column
/// x - x coordinate
/// y - y coordinate
/// z - z coordinate
/// R - red channel of RGB color
/// G - green channel of RGB color
/// B - blue channel of RGB color
/// ```
///
/// Colors are optional, but if one channel is given all three must be. 16-bit colors are detected from
/// the value range and scaled down to 8 bits
pub struct AsciiPointCloudReader<T: BufRead> {
    raw_reader: RawAsciiReader<T>,
}

impl<T: BufRead> AsciiPointCloudReader<T> {
    pub fn from_read(read: T, format: &str, delimiter: &str) -> Result<Self> {
        let raw_reader = RawAsciiReader::from_read(
            read,
            format,
            delimiter,
            &[
                ColumnType::CoordinateX,
                ColumnType::CoordinateY,
                ColumnType::CoordinateZ,
            ],
        )?;
        let color_columns = [ColumnType::ColorR, ColumnType::ColorG, ColumnType::ColorB];
        let num_color_columns = color_columns
            .iter()
            .filter(|column| raw_reader.has_column(**column))
            .count();
        if num_color_columns != 0 && num_color_columns != 3 {
            bail!(
                "FormatError format string '{}' must contain all of 'R', 'G', 'B' or none of them.",
                format
            );
        }
        Ok(Self { raw_reader })
    }

    pub fn has_colors(&self) -> bool {
        self.raw_reader.has_column(ColumnType::ColorR)
    }

    /// Reads all points of the file
    pub fn read(mut self) -> Result<PointCloud> {
        let has_colors = self.has_colors();
        let records = self.raw_reader.read_records()?;
        let positions = records.iter().map(|record| record.position).collect();
        if !has_colors {
            return Ok(PointCloud::from_positions(positions));
        }
        let colors = normalize_colors(&records);
        Ok(PointCloud::from_positions_and_colors(positions, colors)?)
    }
}

impl AsciiPointCloudReader<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P, format: &str, delimiter: &str) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        Self::from_read(file, format, delimiter)
    }
}

/// Maps the colors of all records to 8 bits. If any channel of any record exceeds 255 the colors are
/// treated as 16-bit values
fn normalize_colors(records: &[AsciiRecord]) -> Vec<Vector3<u8>> {
    let max_channel = records
        .iter()
        .map(|record| record.color.max())
        .fold(0.0, f64::max);
    let is_16_bit = max_channel > 255.0;
    if is_16_bit {
        debug!("Detected 16-bit colors, scaling to 8 bits");
    }
    records
        .iter()
        .map(|record| {
            record.color.map(|c| {
                let c = if is_16_bit { c / 65535.0 * 255.0 } else { c };
                c.max(0.0).min(255.0) as u8
            })
        })
        .collect()
}

/// Reads a point cloud file, see [AsciiPointCloudReader] for the format string
pub fn read_point_cloud<P: AsRef<Path>>(path: P, format: &str, delimiter: &str) -> Result<PointCloud> {
    let path = path.as_ref();
    let cloud = AsciiPointCloudReader::from_path(path, format, delimiter)
        .and_then(|reader| reader.read())
        .with_context(|| format!("Could not read point cloud {}", path.display()))?;
    info!("Read {} points from {}", cloud.len(), path.display());
    Ok(cloud)
}

/// Reads [ChangePoint]s from a delimited text file. Besides the coordinate literals `x`, `y`, `z` and `s`
/// the format string must contain `m` (change magnitude) and `E` (epoch, `1` or `2`)
pub struct AsciiChangePointReader<T: BufRead> {
    raw_reader: RawAsciiReader<T>,
}

impl<T: BufRead> AsciiChangePointReader<T> {
    pub fn from_read(read: T, format: &str, delimiter: &str) -> Result<Self> {
        let raw_reader = RawAsciiReader::from_read(
            read,
            format,
            delimiter,
            &[
                ColumnType::CoordinateX,
                ColumnType::CoordinateY,
                ColumnType::CoordinateZ,
                ColumnType::Magnitude,
                ColumnType::Epoch,
            ],
        )?;
        Ok(Self { raw_reader })
    }

    pub fn read(mut self) -> Result<Vec<ChangePoint>> {
        self.raw_reader
            .read_records()?
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let epoch = epoch_from_value(record.epoch)
                    .with_context(|| format!("ReadError in record {}.", index + 1))?;
                Ok(ChangePoint::new(record.position, record.magnitude, epoch))
            })
            .collect()
    }
}

impl AsciiChangePointReader<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P, format: &str, delimiter: &str) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        Self::from_read(file, format, delimiter)
    }
}

fn epoch_from_value(value: f64) -> Result<Epoch> {
    if value.fract() == 0.0 && (1.0..=2.0).contains(&value) {
        if let Some(epoch) = Epoch::from_number(value as u8) {
            return Ok(epoch);
        }
    }
    bail!("ParseError expected epoch 1 or 2 found '{}'.", value)
}

/// Reads a change point file, see [AsciiChangePointReader] for the format string
pub fn read_change_points<P: AsRef<Path>>(
    path: P,
    format: &str,
    delimiter: &str,
) -> Result<Vec<ChangePoint>> {
    let path = path.as_ref();
    let points = AsciiChangePointReader::from_path(path, format, delimiter)
        .and_then(|reader| reader.read())
        .with_context(|| format!("Could not read change points {}", path.display()))?;
    info!("Read {} change points from {}", points.len(), path.display());
    Ok(points)
}
