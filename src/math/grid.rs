//! Dense row-major 2D grid

use super::extent::GridExtent;

/// Dense row-major array of cells
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Copy out the cells of `extent`, given in this grid's local coordinates
    pub fn crop(&self, extent: &GridExtent) -> Grid<T> {
        let mut data = Vec::with_capacity(extent.area());
        for (r, c) in extent.cells() {
            data.push(self.data[r * self.cols + c].clone());
        }
        Grid {
            rows: extent.rows,
            cols: extent.cols,
            data,
        }
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer; returns None if the length does not match
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get a cell, or None if out of range
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Set a cell; out-of-range writes are ignored
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Row-major iterator of (row, col, &value)
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let cols = self.cols.max(1);
        self.data.iter().enumerate().map(move |(i, v)| (i / cols, i % cols, v))
    }
}

impl<T: Copy> std::ops::Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_and_set() {
        let mut g = Grid::filled(2, 3, 0u8);
        g.set(1, 2, 7);
        assert_eq!(g[(1, 2)], 7);
        assert_eq!(g.get(2, 0), None);
        g.set(5, 5, 1);
        assert_eq!(g.as_slice().iter().filter(|&&v| v != 0).count(), 1);
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        assert!(Grid::from_vec(2, 2, vec![1, 2, 3]).is_none());
        assert!(Grid::from_vec(2, 2, vec![1, 2, 3, 4]).is_some());
    }

    #[test]
    fn test_crop() {
        let g = Grid::from_vec(3, 3, (0..9).collect::<Vec<u32>>()).unwrap();
        let c = g.crop(&GridExtent::new(1, 1, 2, 2));
        assert_eq!(c.as_slice(), &[4, 5, 7, 8]);
    }

    #[test]
    fn test_iter_positions() {
        let g = Grid::from_vec(2, 2, vec!['a', 'b', 'c', 'd']).unwrap();
        let cells: Vec<_> = g.iter().map(|(r, c, v)| (r, c, *v)).collect();
        assert_eq!(cells[3], (1, 1, 'd'));
    }
}
