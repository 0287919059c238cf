//! Row-major 2-D field container
//!
//! Every environmental field of a landscape (landcover, energy, activation,
//! release, burn generation) is stored as a [`Grid`]. All grids of one
//! landscape share the same `(height, width)` shape and are index-aligned
//! pixel-for-pixel.

use crate::error::{FireSpreadError, Result};
use nalgebra::{DMatrix, Scalar};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Integer pixel coordinate `(y, x)`: row first, column second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pixel {
    /// Row index
    pub y: usize,
    /// Column index
    pub x: usize,
}

impl Pixel {
    /// Create a pixel coordinate
    #[must_use]
    pub const fn new(y: usize, x: usize) -> Self {
        Self { y, x }
    }
}

impl From<(usize, usize)> for Pixel {
    fn from((y, x): (usize, usize)) -> Self {
        Self { y, x }
    }
}

/// 2-D field stored as a flat `Vec<T>` in row-major order (`y * width + x`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    data: Vec<T>,
    height: usize,
    width: usize,
}

impl<T: Copy + Default> Grid<T> {
    /// Create a grid filled with `T::default()`
    #[must_use]
    pub fn new(height: usize, width: usize) -> Self {
        Self::with_value(height, width, T::default())
    }
}

impl<T: Copy> Grid<T> {
    /// Create a grid with every cell set to `value`
    #[must_use]
    pub fn with_value(height: usize, width: usize, value: T) -> Self {
        Self {
            data: vec![value; height * width],
            height,
            width,
        }
    }

    /// Create a grid by evaluating `f` at every pixel in row-major order
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(Pixel) -> T) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                data.push(f(Pixel::new(y, x)));
            }
        }
        Self {
            data,
            height,
            width,
        }
    }

    /// Build a grid from nested rows.
    ///
    /// # Errors
    ///
    /// Returns [`FireSpreadError::ShapeMismatch`] if the rows are ragged.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(height * width);
        for row in rows {
            if row.len() != width {
                return Err(FireSpreadError::ShapeMismatch {
                    expected: (height, width),
                    found: (height, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            height,
            width,
        })
    }

    /// Number of rows
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Total number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the grid has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True if `pixel` lies inside the grid
    #[must_use]
    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.y < self.height && pixel.x < self.width
    }

    /// Check that `pixel` lies inside the grid.
    ///
    /// # Errors
    ///
    /// Returns [`FireSpreadError::InvalidCoordinate`] otherwise.
    pub fn check_bounds(&self, pixel: Pixel) -> Result<()> {
        if self.contains(pixel) {
            Ok(())
        } else {
            Err(FireSpreadError::InvalidCoordinate {
                y: pixel.y,
                x: pixel.x,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// Check that `other` has the same shape.
    ///
    /// # Errors
    ///
    /// Returns [`FireSpreadError::ShapeMismatch`] otherwise.
    pub fn check_shape<U: Copy>(&self, other: &Grid<U>) -> Result<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(FireSpreadError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            })
        }
    }

    /// Value at `pixel`, or `None` when out of bounds
    #[must_use]
    pub fn get(&self, pixel: Pixel) -> Option<T> {
        self.contains(pixel)
            .then(|| self.data[pixel.y * self.width + pixel.x])
    }

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get mutable reference to field data
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Fill entire field with a value
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Iterate `(pixel, value)` pairs in row-major order
    pub fn iter_pixels(&self) -> impl Iterator<Item = (Pixel, T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, &v)| (Pixel::new(idx / width, idx % width), v))
    }

    /// Number of cells satisfying `pred`
    pub fn count(&self, mut pred: impl FnMut(T) -> bool) -> usize {
        self.data.iter().filter(|&&v| pred(v)).count()
    }

    #[inline]
    fn offset(&self, pixel: Pixel) -> usize {
        assert!(self.contains(pixel), "Coordinates out of bounds");
        pixel.y * self.width + pixel.x
    }
}

impl<T: Copy + Scalar> Grid<T> {
    /// Copy the field into a `nalgebra` matrix (rows = y, columns = x)
    #[must_use]
    pub fn to_matrix(&self) -> DMatrix<T> {
        DMatrix::from_row_slice(self.height, self.width, &self.data)
    }
}

impl<T: Copy> Index<Pixel> for Grid<T> {
    type Output = T;

    fn index(&self, pixel: Pixel) -> &T {
        &self.data[self.offset(pixel)]
    }
}

impl<T: Copy> IndexMut<Pixel> for Grid<T> {
    fn index_mut(&mut self, pixel: Pixel) -> &mut T {
        let idx = self.offset(pixel);
        &mut self.data[idx]
    }
}

impl<T: Copy> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (y, x): (usize, usize)) -> &T {
        &self[Pixel::new(y, x)]
    }
}

impl<T: Copy> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (y, x): (usize, usize)) -> &mut T {
        &mut self[Pixel::new(y, x)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid: Grid<f64> = Grid::new(20, 10);
        assert_eq!(grid.height(), 20);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.len(), 200);
        assert!(grid.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_grid_with_value() {
        let grid = Grid::with_value(5, 5, 42_u32);
        assert_eq!(grid.shape(), (5, 5));
        assert!(grid.as_slice().iter().all(|&v| v == 42));
    }

    #[test]
    fn test_grid_index_is_row_major() {
        let mut grid: Grid<f64> = Grid::new(10, 10);
        grid[(4, 3)] = 123.45;
        assert_eq!(grid[Pixel::new(4, 3)], 123.45);
        assert_eq!(grid.as_slice()[4 * 10 + 3], 123.45);
    }

    #[test]
    fn test_grid_from_rows_rejects_ragged() {
        let rows = vec![vec![1_u8, 2, 3], vec![4, 5]];
        assert!(matches!(
            Grid::from_rows(&rows),
            Err(FireSpreadError::ShapeMismatch { .. })
        ));

        let grid = Grid::from_rows(&[vec![1_u8, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid[(1, 0)], 4);
    }

    #[test]
    fn test_grid_bounds() {
        let grid: Grid<u8> = Grid::new(3, 4);
        assert!(grid.contains(Pixel::new(2, 3)));
        assert!(!grid.contains(Pixel::new(3, 0)));
        assert_eq!(grid.get(Pixel::new(0, 4)), None);
        assert_eq!(
            grid.check_bounds(Pixel::new(3, 1)),
            Err(FireSpreadError::InvalidCoordinate {
                y: 3,
                x: 1,
                height: 3,
                width: 4
            })
        );
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_grid_index_out_of_bounds_panics() {
        let grid: Grid<f64> = Grid::new(10, 10);
        let _ = grid[(5, 10)];
    }

    #[test]
    fn test_iter_pixels_and_count() {
        let grid = Grid::from_fn(2, 3, |p| p.y * 3 + p.x);
        let collected: Vec<_> = grid.iter_pixels().collect();
        assert_eq!(collected[4], (Pixel::new(1, 1), 4));
        assert_eq!(grid.count(|v| (v & 1) == 0), 3);
    }

    #[test]
    fn test_to_matrix_orientation() {
        let grid = Grid::from_fn(2, 3, |p| (p.y * 10 + p.x) as f64);
        let m = grid.to_matrix();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m[(1, 2)], 12.0);
    }
}
