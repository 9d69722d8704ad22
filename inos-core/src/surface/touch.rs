//! Touchscreen coverage grid.

/// Grid of tiles the user must touch, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchGrid {
    rows: usize,
    columns: usize,
    touched: Vec<bool>,
}

impl Default for TouchGrid {
    fn default() -> Self {
        Self::new(Self::ROWS, Self::COLUMNS)
    }
}

impl TouchGrid {
    pub const ROWS: usize = 19;
    pub const COLUMNS: usize = 13;

    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            touched: vec![false; rows * columns],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Mark a tile. Returns true when the tile was not touched before.
    pub fn touch(&mut self, row: usize, column: usize) -> bool {
        if row >= self.rows || column >= self.columns {
            return false;
        }
        let tile = &mut self.touched[row * self.columns + column];
        !std::mem::replace(tile, true)
    }

    /// Mark the tile under a point on a surface of the given size, as a
    /// drag gesture would.
    pub fn touch_at(&mut self, x: f64, y: f64, width: f64, height: f64) -> bool {
        if width <= 0.0 || height <= 0.0 || x < 0.0 || y < 0.0 {
            return false;
        }
        let column = (x / (width / self.columns as f64)) as usize;
        let row = (y / (height / self.rows as f64)) as usize;
        self.touch(row, column)
    }

    pub fn is_touched(&self, row: usize, column: usize) -> bool {
        row < self.rows && column < self.columns && self.touched[row * self.columns + column]
    }

    pub fn remaining(&self) -> usize {
        self.touched.iter().filter(|touched| !**touched).count()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Fraction of tiles touched.
    pub fn progress(&self) -> f64 {
        if self.touched.is_empty() {
            return 1.0;
        }
        1.0 - self.remaining() as f64 / self.touched.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_is_13_by_19() {
        let grid = TouchGrid::default();
        assert_eq!(grid.columns(), 13);
        assert_eq!(grid.rows(), 19);
        assert_eq!(grid.remaining(), 247);
    }

    #[test]
    fn touching_every_tile_completes() {
        let mut grid = TouchGrid::new(2, 3);
        for row in 0..2 {
            for column in 0..3 {
                assert!(grid.touch(row, column));
            }
        }
        assert!(grid.is_complete());
        assert!(!grid.touch(0, 0));
        assert_eq!(grid.progress(), 1.0);
    }

    #[test]
    fn drag_point_maps_to_tile() {
        let mut grid = TouchGrid::new(4, 2);
        assert!(grid.touch_at(150.0, 310.0, 200.0, 400.0));
        assert!(grid.is_touched(3, 1));
        assert!(!grid.touch_at(250.0, 10.0, 200.0, 400.0));
        assert!(!grid.touch_at(-1.0, 10.0, 200.0, 400.0));
    }
}
