/// A row-major 2D grid of elevation samples.
///
/// Used both for single-sector grids (grid_size x grid_size) and for the
/// assembled mosaic. Unlike a world map there is no horizontal wrapping:
/// sector edges are hard edges.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    pub width: usize,
    pub height: usize,
    data: Vec<f32>,
}

impl HeightGrid {
    /// Create a zero-filled grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Create a grid filled with a constant value.
    pub fn new_with(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "grid access out of bounds");
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Fill the entire grid with a value.
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.data.iter().enumerate().map(move |(idx, &val)| {
            let x = idx % self.width;
            let y = idx / self.width;
            (x, y, val)
        })
    }

    /// Minimum and maximum over all cells, or None for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in &self.data {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if self.data.is_empty() {
            None
        } else {
            Some((min, max))
        }
    }

    /// Copy `src` into this grid with its top-left corner at (x0, y0).
    pub fn blit(&mut self, src: &HeightGrid, x0: usize, y0: usize) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                self.set(x0 + sx, y0 + sy, src.get(sx, sy));
            }
        }
    }

    /// Extract a w x h sub-grid with its top-left corner at (x0, y0).
    pub fn block(&self, x0: usize, y0: usize, w: usize, h: usize) -> HeightGrid {
        let mut out = HeightGrid::new(w, h);
        for y in 0..h {
            for x in 0..w {
                out.set(x, y, self.get(x0 + x, y0 + y));
            }
        }
        out
    }

    /// Reverse the row order (top row becomes bottom row).
    pub fn flip_vertical(&self) -> HeightGrid {
        let mut out = HeightGrid::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.set(x, y, self.get(x, self.height - 1 - y));
            }
        }
        out
    }

    /// Reverse the column order (left column becomes right column).
    pub fn flip_horizontal(&self) -> HeightGrid {
        let mut out = HeightGrid::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.set(x, y, self.get(self.width - 1 - x, y));
            }
        }
        out
    }

    /// Rotate 90 degrees counter-clockwise. The right column becomes the top row.
    pub fn rotate_ccw(&self) -> HeightGrid {
        let mut out = HeightGrid::new(self.height, self.width);
        for y in 0..out.height {
            for x in 0..out.width {
                out.set(x, y, self.get(self.width - 1 - y, x));
            }
        }
        out
    }

    /// Rotate 90 degrees clockwise. Exact inverse of `rotate_ccw`.
    pub fn rotate_cw(&self) -> HeightGrid {
        let mut out = HeightGrid::new(self.height, self.width);
        for y in 0..out.height {
            for x in 0..out.width {
                out.set(x, y, self.get(y, self.height - 1 - x));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 wide, 2 tall: rows [1 2 3] / [4 5 6]
    fn sample_grid() -> HeightGrid {
        let mut g = HeightGrid::new(3, 2);
        g.set(0, 0, 1.0);
        g.set(1, 0, 2.0);
        g.set(2, 0, 3.0);
        g.set(0, 1, 4.0);
        g.set(1, 1, 5.0);
        g.set(2, 1, 6.0);
        g
    }

    #[test]
    fn test_rotate_ccw_reference_values() {
        let r = sample_grid().rotate_ccw();
        // [[1 2 3], [4 5 6]] rotated CCW -> [[3 6], [2 5], [1 4]]
        assert_eq!(r.width, 2);
        assert_eq!(r.height, 3);
        assert_eq!(r.get(0, 0), 3.0);
        assert_eq!(r.get(1, 0), 6.0);
        assert_eq!(r.get(0, 1), 2.0);
        assert_eq!(r.get(1, 1), 5.0);
        assert_eq!(r.get(0, 2), 1.0);
        assert_eq!(r.get(1, 2), 4.0);
    }

    #[test]
    fn test_rotate_cw_reference_values() {
        let r = sample_grid().rotate_cw();
        // [[1 2 3], [4 5 6]] rotated CW -> [[4 1], [5 2], [6 3]]
        assert_eq!(r.width, 2);
        assert_eq!(r.height, 3);
        assert_eq!(r.get(0, 0), 4.0);
        assert_eq!(r.get(1, 0), 1.0);
        assert_eq!(r.get(0, 1), 5.0);
        assert_eq!(r.get(1, 1), 2.0);
        assert_eq!(r.get(0, 2), 6.0);
        assert_eq!(r.get(1, 2), 3.0);
    }

    #[test]
    fn test_rotations_invert() {
        let g = sample_grid();
        assert_eq!(g.rotate_ccw().rotate_cw(), g);
        assert_eq!(g.rotate_cw().rotate_ccw(), g);
    }

    #[test]
    fn test_flips_are_involutions() {
        let g = sample_grid();
        assert_eq!(g.flip_vertical().flip_vertical(), g);
        assert_eq!(g.flip_horizontal().flip_horizontal(), g);
    }

    #[test]
    fn test_flip_vertical_reference_values() {
        let f = sample_grid().flip_vertical();
        assert_eq!(f.get(0, 0), 4.0);
        assert_eq!(f.get(2, 0), 6.0);
        assert_eq!(f.get(0, 1), 1.0);
        assert_eq!(f.get(2, 1), 3.0);
    }

    #[test]
    fn test_blit_block_round_trip() {
        let mut canvas = HeightGrid::new(5, 5);
        let g = sample_grid();
        canvas.blit(&g, 1, 2);
        assert_eq!(canvas.block(1, 2, 3, 2), g);
        // Untouched cells stay zero
        assert_eq!(canvas.get(0, 0), 0.0);
        assert_eq!(canvas.get(4, 4), 0.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(sample_grid().min_max(), Some((1.0, 6.0)));
        assert_eq!(HeightGrid::new(0, 0).min_max(), None);
        assert_eq!(HeightGrid::new_with(2, 2, 7.5).min_max(), Some((7.5, 7.5)));
    }
}
