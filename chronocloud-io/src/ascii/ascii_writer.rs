use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chronocloud_core::containers::ChangePoint;

/// Writes [ChangePoint]s as delimited text in the column order `x y z m E`, which
/// [AsciiChangePointReader](super::AsciiChangePointReader) reads back with the format string `"xyzmE"`
pub struct AsciiChangePointWriter<T: Write> {
    writer: T,
    delimiter: String,
    precision: usize,
}

impl<T: Write> AsciiChangePointWriter<T> {
    pub fn from_write(write: T) -> Self {
        Self {
            writer: write,
            delimiter: String::from(" "),
            precision: 5,
        }
    }

    pub fn set_delimiter(&mut self, delimiter: &str) {
        self.delimiter = String::from(delimiter);
    }

    /// Number of decimal places of coordinates and magnitudes
    pub fn set_precision(&mut self, precision: usize) {
        self.precision = precision;
    }

    pub fn write(&mut self, points: &[ChangePoint]) -> Result<()> {
        for point in points {
            let values = [
                point.position.x,
                point.position.y,
                point.position.z,
                point.magnitude,
            ];
            for value in values.iter() {
                let formatted = format!("{:.*}", self.precision, value);
                self.writer
                    .write_all(trim_unnecessary_tailing_zeros(&formatted).as_bytes())?;
                self.writer.write_all(self.delimiter.as_bytes())?;
            }
            writeln!(self.writer, "{}", point.epoch.number())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes `points` to a new text file at `path`
pub fn write_change_points<P: AsRef<Path>>(path: P, points: &[ChangePoint]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Could not create change point file {}", path.display()))?;
    let mut writer = AsciiChangePointWriter::from_write(BufWriter::new(file));
    writer.write(points)?;
    writer.flush()
}

fn trim_unnecessary_tailing_zeros(slice: &str) -> &str {
    if !slice.contains('.') {
        return slice;
    }
    let mut end = slice.len();
    while slice[..end].ends_with('0') && !slice[..end].ends_with(".0") {
        end -= 1;
    }
    &slice[..end]
}
