//! Dense 2D grid storage for the terrain simulation.
//!
//! Cells are stored column by column: the flat index of `(x, y)` is
//! `x * dim.y + y`. Every accessor clamps its coordinates into the grid, so
//! probes near the edges never read or write outside the lattice.

use serde::{Deserialize, Serialize};

/// Extent of a grid in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dim {
    pub x: usize,
    pub y: usize,
}

impl Dim {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Number of cells.
    pub const fn area(&self) -> usize {
        self.x * self.y
    }

    pub const fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0
    }

    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x < self.x && y < self.y
    }

    /// Flat index of an in-bounds cell.
    #[inline]
    pub const fn index(&self, x: usize, y: usize) -> usize {
        x * self.y + y
    }

    /// Cell coordinates of a flat index.
    #[inline]
    pub const fn cell(&self, index: usize) -> (usize, usize) {
        (index / self.y, index % self.y)
    }

    /// Clamp signed coordinates into the grid.
    #[inline]
    pub fn clamp_cell(&self, x: i64, y: i64) -> (usize, usize) {
        (
            x.clamp(0, self.x as i64 - 1) as usize,
            y.clamp(0, self.y as i64 - 1) as usize,
        )
    }

    /// Cell containing a continuous position, clamped into the grid.
    #[inline]
    pub fn cell_at(&self, px: f64, py: f64) -> (usize, usize) {
        self.clamp_cell(px.floor() as i64, py.floor() as i64)
    }

    /// True when a continuous position lies inside `[0, dim)` on both axes.
    #[inline]
    pub fn contains_pos(&self, px: f64, py: f64) -> bool {
        px >= 0.0 && py >= 0.0 && px < self.x as f64 && py < self.y as f64
    }
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// A 2D grid of values with clamped access.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    dim: Dim,
    data: Vec<T>,
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(dim: Dim, value: T) -> Self {
        Self {
            dim,
            data: vec![value; dim.area()],
        }
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    /// Flat index of `(x, y)` after clamping into the grid.
    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        let x = x.min(self.dim.x - 1);
        let y = y.min(self.dim.y - 1);
        self.dim.index(x, y)
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Value at a flat index, clamped to the last cell.
    pub fn at(&self, index: usize) -> &T {
        &self.data[index.min(self.data.len() - 1)]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut T {
        let last = self.data.len() - 1;
        &mut self.data[index.min(last)]
    }

    /// Fill the entire map with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 8-connected neighbors of a cell, clipped at the grid edges.
    pub fn neighbors_8(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(8);

        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx >= 0 && ny >= 0 && (nx as usize) < self.dim.x && (ny as usize) < self.dim.y {
                    result.push((nx as usize, ny as usize));
                }
            }
        }

        result
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let dim = self.dim;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let (x, y) = dim.cell(idx);
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let dim = self.dim;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let (x, y) = dim.cell(idx);
            (x, y, val)
        })
    }
}

impl Tilemap<f64> {
    /// Smallest and largest value in the map.
    pub fn min_max(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sample with bilinear interpolation, clamping the position into the grid.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> f64 {
        let (x0, y0, x1, y1, fx, fy) = self.bilinear_corners(x, y);

        let v00 = *self.get(x0, y0);
        let v10 = *self.get(x1, y0);
        let v01 = *self.get(x0, y1);
        let v11 = *self.get(x1, y1);

        let v0 = v00 * (1.0 - fx) + v10 * fx;
        let v1 = v01 * (1.0 - fx) + v11 * fx;
        v0 * (1.0 - fy) + v1 * fy
    }

    /// Corner cells and fractional offsets for bilinear sampling.
    pub(crate) fn bilinear_corners(&self, x: f64, y: f64) -> (usize, usize, usize, usize, f64, f64) {
        let max_x = (self.dim.x - 1) as f64;
        let max_y = (self.dim.y - 1) as f64;
        let x = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 };
        let y = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 };

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.dim.x - 1);
        let y1 = (y0 + 1).min(self.dim.y - 1);

        (x0, y0, x1, y1, x - x0 as f64, y - y0 as f64)
    }
}
