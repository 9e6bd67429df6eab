use anyhow::{bail, Result};

/// Meaning of a single column of a delimited text file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnType {
    Skip,
    CoordinateX,
    CoordinateY,
    CoordinateZ,
    ColorR,
    ColorG,
    ColorB,
    Magnitude,
    Epoch,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ColumnType {
    pub(crate) fn literal(&self) -> char {
        match self {
            ColumnType::Skip => 's',
            ColumnType::CoordinateX => 'x',
            ColumnType::CoordinateY => 'y',
            ColumnType::CoordinateZ => 'z',
            ColumnType::ColorR => 'R',
            ColumnType::ColorG => 'G',
            ColumnType::ColorB => 'B',
            ColumnType::Magnitude => 'm',
            ColumnType::Epoch => 'E',
        }
    }

    //s - skip this column
    //x - x coordinate
    //y - y coordinate
    //z - z coordinate
    //R - red channel of RGB color
    //G - green channel of RGB color
    //B - blue channel of RGB color
    //m - change magnitude
    //E - epoch (1 or 2)
    // Whitespace in the format string is ignored, so "x y z" and "xyz" are equivalent
    pub(crate) fn get_parse_layout(format: &str) -> Result<Vec<ColumnType>> {
        let mut parse_layout = Vec::<ColumnType>::new();
        for character in format.chars().filter(|c| !c.is_whitespace()) {
            let column = match character {
                's' => ColumnType::Skip,
                'x' => ColumnType::CoordinateX,
                'y' => ColumnType::CoordinateY,
                'z' => ColumnType::CoordinateZ,
                'R' => ColumnType::ColorR,
                'G' => ColumnType::ColorG,
                'B' => ColumnType::ColorB,
                'm' => ColumnType::Magnitude,
                'E' => ColumnType::Epoch,
                _ => {
                    bail!(
                        "FormatError can't interpret format literal '{}' in format string '{}'.",
                        character,
                        format
                    );
                }
            };
            if column != ColumnType::Skip && parse_layout.contains(&column) {
                bail!(
                    "FormatError format literal '{}' appears more than once in format string '{}'.",
                    character,
                    format
                );
            }
            parse_layout.push(column);
        }
        Ok(parse_layout)
    }
}

/// Splits a line at `delimiter`. A blank delimiter splits at any run of whitespace
pub(crate) fn split_line<'a>(
    line: &'a str,
    delimiter: &'a str,
) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    if delimiter.trim().is_empty() {
        Box::new(line.split_whitespace())
    } else {
        Box::new(line.split(delimiter).map(|value| value.trim()))
    }
}

/// Lines without data: empty lines and comments starting with `#` or `//`
pub(crate) fn is_ignored_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//")
}
