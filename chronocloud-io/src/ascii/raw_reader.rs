use std::{io::BufRead, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use chronocloud_core::nalgebra::Vector3;
use itertools::{EitherOrBoth::*, Itertools};

use super::{is_ignored_line, split_line, ColumnType};

/// The values of one line. Columns missing from the format keep their default of zero
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct AsciiRecord {
    pub position: Vector3<f64>,
    pub color: Vector3<f64>,
    pub magnitude: f64,
    pub epoch: f64,
}

pub(crate) struct RawAsciiReader<T: BufRead> {
    reader: T,
    delimiter: String,
    parse_layout: Vec<ColumnType>,
}

impl<T: BufRead> RawAsciiReader<T> {
    /// Creates a reader for `format`. Fails if the format lacks any of the `required` columns
    pub fn from_read(
        read: T,
        format: &str,
        delimiter: &str,
        required: &[ColumnType],
    ) -> Result<Self> {
        let parse_layout = ColumnType::get_parse_layout(format)?;
        if let Some(missing) = required.iter().find(|column| !parse_layout.contains(column)) {
            bail!(
                "FormatError format string '{}' lacks the literal '{}' ({}).",
                format,
                missing.literal(),
                missing
            );
        }
        Ok(Self {
            reader: read,
            delimiter: delimiter.to_string(),
            parse_layout,
        })
    }

    pub fn has_column(&self, column: ColumnType) -> bool {
        self.parse_layout.contains(&column)
    }

    /// Reads all remaining records. Blank lines and comment lines are skipped
    pub fn read_records(&mut self) -> Result<Vec<AsciiRecord>> {
        let mut records = vec![];
        for (index, line) in (&mut self.reader).lines().enumerate() {
            let line = line?;
            if is_ignored_line(&line) {
                continue;
            }
            let record = Self::get_record(&line, &self.delimiter, &self.parse_layout)
                .with_context(|| format!("ReadError in line {}.", index + 1))?;
            records.push(record);
        }
        Ok(records)
    }

    fn get_record(
        line: &str,
        delimiter: &str,
        parse_layout: &[ColumnType],
    ) -> Result<AsciiRecord> {
        let mut record = AsciiRecord::default();
        for pair in split_line(line, delimiter).zip_longest(parse_layout) {
            match pair {
                Both(value_str, column) => {
                    let target = match column {
                        ColumnType::Skip => continue,
                        ColumnType::CoordinateX => &mut record.position.x,
                        ColumnType::CoordinateY => &mut record.position.y,
                        ColumnType::CoordinateZ => &mut record.position.z,
                        ColumnType::ColorR => &mut record.color.x,
                        ColumnType::ColorG => &mut record.color.y,
                        ColumnType::ColorB => &mut record.color.z,
                        ColumnType::Magnitude => &mut record.magnitude,
                        ColumnType::Epoch => &mut record.epoch,
                    };
                    *target = parse_string::<f64>(value_str)
                        .with_context(|| generate_parse_error(column))?;
                }
                Left(_) => continue,
                Right(_) => {
                    bail!("Input format string expected more items in the line. Found End-of-Line.")
                }
            }
        }
        Ok(record)
    }
}

fn parse_string<V: FromStr>(value_str: &str) -> Result<V> {
    value_str.parse::<V>().map_err(|_| {
        anyhow!(
            "ParseError expected {} found '{}'.",
            std::any::type_name::<V>(),
            value_str
        )
    })
}

fn generate_parse_error(column: &ColumnType) -> String {
    format!(
        "ParseError at parsing {} for format literal '{}'.",
        column,
        column.literal()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_records() -> Result<()> {
        let data = "// x y z m\n1.0 2.0 3.0 -0.5 extra\n\n4 5 6 0.25\n";
        let mut reader = RawAsciiReader::from_read(
            Cursor::new(data),
            "xyzm",
            " ",
            &[ColumnType::CoordinateX],
        )?;
        let records = reader.read_records()?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(records[0].magnitude, -0.5);
        assert_eq!(records[1].magnitude, 0.25);
        Ok(())
    }

    #[test]
    fn test_missing_required_column() {
        let result = RawAsciiReader::from_read(
            Cursor::new(""),
            "xy",
            " ",
            &[ColumnType::CoordinateX, ColumnType::CoordinateZ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_errors_name_the_line() -> Result<()> {
        let mut reader =
            RawAsciiReader::from_read(Cursor::new("1 2 3\n1 two 3\n"), "xyz", " ", &[])?;
        let error = reader.read_records().unwrap_err();
        assert_eq!(error.to_string(), "ReadError in line 2.");

        let mut reader = RawAsciiReader::from_read(Cursor::new("1 2\n"), "xyz", " ", &[])?;
        assert!(reader.read_records().is_err());
        Ok(())
    }
}
