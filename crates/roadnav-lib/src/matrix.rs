//! Dense weight matrices for graph search.
//!
//! [`Matrix`] stores a row-major grid of costs. [`OverlayMatrix`] grows an
//! existing matrix by a few rows and columns without copying it: a query adds
//! its transient start/goal nodes around the shared base graph, and the base
//! stays untouched so other queries can read it concurrently.

use crate::error::{Error, Result};

/// Read/write access to a rectangular grid of edge costs.
///
/// Row `y` holds the outgoing costs of node `y`, so `get(x, y)` is the cost
/// of the edge `y -> x`. Road graphs are symmetric.
pub trait WeightMatrix {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Value at `(x, y)`, or `None` outside the matrix.
    fn get(&self, x: usize, y: usize) -> Option<f64>;

    /// Store `value` at `(x, y)`.
    fn set(&mut self, x: usize, y: usize, value: f64) -> Result<()>;

    /// Store `value` at `(x, y)` and `(y, x)`.
    fn set_symmetric(&mut self, x: usize, y: usize, value: f64) -> Result<()> {
        self.set(x, y, value)?;
        self.set(y, x, value)
    }
}

/// Row-major matrix of `f64` costs.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Matrix with every cell set to `f64::INFINITY` (no edge).
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, f64::INFINITY)
    }

    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build from row-major values; `None` if the length does not match.
    pub fn from_rows(width: usize, height: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(Error::MatrixIndexOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y * self.width + x)
    }
}

impl WeightMatrix for Matrix {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.index(x, y).ok().map(|index| self.data[index])
    }

    fn set(&mut self, x: usize, y: usize, value: f64) -> Result<()> {
        let index = self.index(x, y)?;
        self.data[index] = value;
        Ok(())
    }
}

/// Which backing store an overlay coordinate resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Horizontal(usize),
    Vertical(usize),
    Base(usize, usize),
}

/// A larger matrix layered around a borrowed base matrix.
///
/// The base occupies the window `[start_x, start_x + base.width) x
/// [start_y, start_y + base.height)`. Rows above and below the window live in
/// the horizontal band (full width); columns left and right of the window,
/// within the window's rows, live in the vertical band. The base is read
/// through and never written.
#[derive(Debug, Clone)]
pub struct OverlayMatrix<'a> {
    base: &'a Matrix,
    start_x: usize,
    start_y: usize,
    width: usize,
    height: usize,
    horizontal: Vec<f64>,
    vertical: Vec<f64>,
}

impl<'a> OverlayMatrix<'a> {
    /// Overlay of `width x height` with `base` at `(start_x, start_y)`.
    /// Added cells start at `f64::INFINITY`.
    pub fn new(
        base: &'a Matrix,
        start_x: usize,
        start_y: usize,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        Self::filled(base, start_x, start_y, width, height, f64::INFINITY)
    }

    pub fn filled(
        base: &'a Matrix,
        start_x: usize,
        start_y: usize,
        width: usize,
        height: usize,
        value: f64,
    ) -> Result<Self> {
        if start_x + base.width > width || start_y + base.height > height {
            return Err(Error::InvalidOverlay {
                start_x,
                start_y,
                width,
                height,
                base_width: base.width,
                base_height: base.height,
            });
        }

        let horizontal_rows = height - base.height;
        let vertical_columns = width - base.width;
        Ok(Self {
            base,
            start_x,
            start_y,
            width,
            height,
            horizontal: vec![value; horizontal_rows * width],
            vertical: vec![value; vertical_columns * base.height],
        })
    }

    /// The wrapped base matrix.
    pub fn base(&self) -> &Matrix {
        self.base
    }

    fn band(&self, x: usize, y: usize) -> Option<Band> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let base_end_y = self.start_y + self.base.height;
        if y < self.start_y {
            return Some(Band::Horizontal(y * self.width + x));
        }
        if y >= base_end_y {
            return Some(Band::Horizontal((y - self.base.height) * self.width + x));
        }

        let row = y - self.start_y;
        let side_width = self.width - self.base.width;
        let base_end_x = self.start_x + self.base.width;
        if x < self.start_x {
            return Some(Band::Vertical(row * side_width + x));
        }
        if x >= base_end_x {
            return Some(Band::Vertical(row * side_width + x - self.base.width));
        }

        Some(Band::Base(x - self.start_x, row))
    }

    /// Full contiguous copy, for inspection and debugging.
    pub fn to_dense(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push(self.get(x, y).unwrap_or(f64::INFINITY));
            }
        }
        Matrix {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl WeightMatrix for OverlayMatrix<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get(&self, x: usize, y: usize) -> Option<f64> {
        match self.band(x, y)? {
            Band::Horizontal(index) => Some(self.horizontal[index]),
            Band::Vertical(index) => Some(self.vertical[index]),
            Band::Base(bx, by) => self.base.get(bx, by),
        }
    }

    fn set(&mut self, x: usize, y: usize, value: f64) -> Result<()> {
        match self.band(x, y) {
            Some(Band::Horizontal(index)) => {
                self.horizontal[index] = value;
                Ok(())
            }
            Some(Band::Vertical(index)) => {
                self.vertical[index] = value;
                Ok(())
            }
            Some(Band::Base(..)) => Err(Error::OverlayReadOnly { x, y }),
            None => Err(Error::MatrixIndexOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_routing_covers_every_cell_once() {
        let base = Matrix::new(2, 3);
        let overlay = OverlayMatrix::new(&base, 1, 2, 5, 7).expect("overlay fits");

        let mut horizontal = vec![0usize; overlay.horizontal.len()];
        let mut vertical = vec![0usize; overlay.vertical.len()];
        let mut base_hits = 0;
        for y in 0..7 {
            for x in 0..5 {
                match overlay.band(x, y).expect("in range") {
                    Band::Horizontal(i) => horizontal[i] += 1,
                    Band::Vertical(i) => vertical[i] += 1,
                    Band::Base(..) => base_hits += 1,
                }
            }
        }

        assert!(horizontal.iter().all(|&n| n == 1));
        assert!(vertical.iter().all(|&n| n == 1));
        assert_eq!(base_hits, 6);
    }
}
