use thiserror::Error;

/// Errors raised while assembling a [PointCloud](crate::containers::PointCloud)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointCloudError {
    #[error("point cloud has {positions} positions but {colors} colors")]
    ColorCountMismatch { positions: usize, colors: usize },
}

/// Errors raised while assembling a [RasterImage](crate::containers::RasterImage)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("raster of {width}x{height} pixels needs {expected} bytes, got {actual}")]
    DataSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while rebuilding [RasterMetadata](crate::meta::RasterMetadata) from its tag map
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("raster metadata is missing the tag '{0}'")]
    MissingTag(String),
    #[error("raster metadata tag '{key}' has the invalid value '{value}'")]
    InvalidTag { key: String, value: String },
}
