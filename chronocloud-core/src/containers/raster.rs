use crate::{error::RasterError, meta::RasterMetadata};

/// A dense 8-bit RGB raster produced by projecting a point cloud. Pixels are stored row-major with three
/// interleaved channels. Rows follow the polar angle, columns the azimuth
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
    metadata: RasterMetadata,
}

impl RasterImage {
    pub const CHANNELS: usize = 3;

    /// Creates a `RasterImage` from raw interleaved RGB data. Fails if `data` does not hold exactly
    /// `width * height * 3` bytes
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<u8>,
        metadata: RasterMetadata,
    ) -> Result<Self, RasterError> {
        let expected = width * height * Self::CHANNELS;
        if data.len() != expected {
            return Err(RasterError::DataSizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            metadata,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The RGB value at the given row and column
    ///
    /// # Panics
    ///
    /// If `row` or `col` is out of bounds
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        assert!(row < self.height && col < self.width, "pixel out of bounds");
        let offset = (row * self.width + col) * Self::CHANNELS;
        [self.data[offset], self.data[offset + 1], self.data[offset + 2]]
    }

    /// The raw interleaved RGB bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }
}
