/// A point that survived occlusion resolution, together with the pixel it occupies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisiblePoint {
    pub row: usize,
    pub col: usize,
    /// Index of the point in the projected point cloud
    pub index: usize,
    /// Distance of the point to the camera
    pub range: f64,
}

/// Dense depth buffer that keeps, per pixel, the point closest to the camera. Points have to be inserted in
/// point cloud order: a later point only replaces the stored one if it is strictly closer, so on equal range
/// the point with the lowest index wins
pub struct ZBuffer {
    width: usize,
    height: usize,
    cells: Vec<Option<(usize, f64)>>,
}

impl ZBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// Offers the point with the given `index` and `range` for pixel (`row`, `col`). Returns `false` if the
    /// pixel lies outside of the buffer, in which case the point is ignored
    pub fn insert(&mut self, row: usize, col: usize, index: usize, range: f64) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        let cell = &mut self.cells[row * self.width + col];
        match cell {
            Some((_, stored_range)) if range >= *stored_range => {}
            _ => *cell = Some((index, range)),
        }
        true
    }

    /// All occupied pixels in row-major order
    pub fn visible_points(&self) -> Vec<VisiblePoint> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(cell_index, cell)| {
                cell.map(|(index, range)| VisiblePoint {
                    row: cell_index / self.width,
                    col: cell_index % self.width,
                    index,
                    range,
                })
            })
            .collect()
    }
}
