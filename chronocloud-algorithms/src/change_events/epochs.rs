use std::{fmt::Write, path::Path};

use chrono::{
    format::{Item, StrftimeItems},
    NaiveDate, NaiveDateTime,
};
use thiserror::Error;

/// Timestamp format of the acquisition times embedded in file names, e.g. `231014_120000`
pub const DEFAULT_TEMPORAL_FORMAT: &str = "%y%m%d_%H%M%S";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EpochParseError {
    #[error("invalid temporal format '{0}'")]
    InvalidFormat(String),
    #[error("no timestamp matching '{format}' found in '{identifier}'")]
    NoTimestamp { identifier: String, format: String },
    #[error("no pair of timestamps matching '{format}' found in '{identifier}'")]
    NoTimestampPair { identifier: String, format: String },
}

/// The acquisition times of the two epochs a change was detected between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochPair {
    t_min: NaiveDateTime,
    t_max: NaiveDateTime,
}

impl EpochPair {
    /// Creates a pair from two acquisition times in any order
    pub fn new(first: NaiveDateTime, second: NaiveDateTime) -> Self {
        Self {
            t_min: first.min(second),
            t_max: first.max(second),
        }
    }

    /// Parses the pair from the identifiers (usually file paths) of the two epochs
    pub fn from_identifiers(
        first: &str,
        second: &str,
        format: &str,
    ) -> Result<Self, EpochParseError> {
        Ok(Self::new(
            parse_epoch(first, format)?,
            parse_epoch(second, format)?,
        ))
    }

    pub fn t_min(&self) -> NaiveDateTime {
        self.t_min
    }

    pub fn t_max(&self) -> NaiveDateTime {
        self.t_max
    }

    /// Time between the two epochs in hours
    pub fn delta_t_hours(&self) -> f64 {
        (self.t_max - self.t_min).num_seconds() as f64 / 3600.0
    }
}

/// Checks that `format` is a valid strftime format that can represent and recover a full date and time
pub fn check_temporal_format(format: &str) -> Result<(), EpochParseError> {
    let invalid = || EpochParseError::InvalidFormat(format.to_string());
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let sample = NaiveDate::from_ymd_opt(2023, 10, 14)
        .and_then(|date| date.and_hms_opt(12, 34, 56))
        .ok_or_else(invalid)?;
    let mut formatted = String::new();
    write!(formatted, "{}", sample.format(format)).map_err(|_| invalid())?;
    match NaiveDateTime::parse_from_str(&formatted, format) {
        Ok(parsed) if parsed == sample => Ok(()),
        _ => Err(invalid()),
    }
}

/// Token of an identifier that carries the timestamp(s): the last whitespace separated part of the file name,
/// without extension
fn timestamp_token(identifier: &str) -> &str {
    let stem = Path::new(identifier)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(identifier);
    stem.split_whitespace().last().unwrap_or(stem)
}

/// Parses the acquisition time of a single epoch from its identifier, e.g. `scans/ScanPos001 231014_120000.txt`
pub fn parse_epoch(identifier: &str, format: &str) -> Result<NaiveDateTime, EpochParseError> {
    let token = timestamp_token(identifier);
    NaiveDateTime::parse_from_str(token, format).map_err(|_| EpochParseError::NoTimestamp {
        identifier: identifier.to_string(),
        format: format.to_string(),
    })
}

/// Parses both acquisition times from the identifier of a change detection result that names the two epochs,
/// e.g. `change/m3c2 231014_120000_231015_120000.txt`. The token is split at the first `_` for which both
/// halves match `format`
pub fn parse_epoch_pair(identifier: &str, format: &str) -> Result<EpochPair, EpochParseError> {
    let token = timestamp_token(identifier);
    token
        .match_indices('_')
        .find_map(|(split, _)| {
            let first = NaiveDateTime::parse_from_str(&token[..split], format).ok()?;
            let second = NaiveDateTime::parse_from_str(&token[split + 1..], format).ok()?;
            Some(EpochPair::new(first, second))
        })
        .ok_or_else(|| EpochParseError::NoTimestampPair {
            identifier: identifier.to_string(),
            format: format.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_epoch_pair() {
        let pair = parse_epoch_pair(
            "/data/change/m3c2 231014_120000_231015_180000.txt",
            DEFAULT_TEMPORAL_FORMAT,
        )
        .unwrap();
        assert_eq!(pair.t_min(), datetime(2023, 10, 14, 12, 0, 0));
        assert_eq!(pair.t_max(), datetime(2023, 10, 15, 18, 0, 0));
        assert_eq!(pair.delta_t_hours(), 30.0);
    }

    #[test]
    fn test_pair_order_is_normalized() {
        let pair = parse_epoch_pair("231015_000000_231014_233000", DEFAULT_TEMPORAL_FORMAT).unwrap();
        assert_eq!(pair.t_min(), datetime(2023, 10, 14, 23, 30, 0));
        assert_eq!(pair.delta_t_hours(), 0.5);
    }

    #[test]
    fn test_parse_single_epochs() {
        let pair = EpochPair::from_identifiers(
            "scans/ScanPos001 - 230101_000000.txt",
            "scans/ScanPos001 - 230102_060000.txt",
            DEFAULT_TEMPORAL_FORMAT,
        )
        .unwrap();
        assert_eq!(pair.delta_t_hours(), 30.0);
    }

    #[test]
    fn test_custom_format() {
        let epoch = parse_epoch("epoch_2021-06-01T08:15.xyz", "epoch_%Y-%m-%dT%H:%M").unwrap();
        assert_eq!(epoch, datetime(2021, 6, 1, 8, 15, 0));
    }

    #[test]
    fn test_missing_timestamp() {
        assert!(matches!(
            parse_epoch_pair("change.txt", DEFAULT_TEMPORAL_FORMAT),
            Err(EpochParseError::NoTimestampPair { .. })
        ));
        assert!(matches!(
            parse_epoch("scan_final.txt", DEFAULT_TEMPORAL_FORMAT),
            Err(EpochParseError::NoTimestamp { .. })
        ));
    }

    #[test]
    fn test_check_temporal_format() {
        assert!(check_temporal_format(DEFAULT_TEMPORAL_FORMAT).is_ok());
        assert!(check_temporal_format("%Y-%m-%d %H:%M:%S").is_ok());
        assert_eq!(
            check_temporal_format("%Q"),
            Err(EpochParseError::InvalidFormat("%Q".to_string()))
        );
        // Parses, but loses the time of day
        assert!(check_temporal_format("%Y%m%d").is_err());
    }
}
