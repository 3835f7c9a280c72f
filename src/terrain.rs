//! The terrain grid shared by every simulation stage.

use crate::erosion::utils::{gradient_at, height_at, surface_normal};
use crate::error::{Result, SimError};
use crate::heightmap::{generate_heightmap, TerrainParams};
use crate::tilemap::{Dim, Tilemap};

/// Elevation, flow signal and standing water over one fixed lattice.
///
/// All three maps share the same `dim`, which never changes after creation.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    dim: Dim,
    /// Elevation per cell
    pub heightmap: Tilemap<f64>,
    /// Recent flow intensity per cell, in `[0, 1]`
    pub waterpath: Tilemap<f64>,
    /// Standing water depth per cell, never negative
    pub waterpool: Tilemap<f64>,
}

impl TerrainGrid {
    /// Generate noise terrain with dry water maps.
    pub fn generate(dim: Dim, seed: u32, params: &TerrainParams) -> Result<Self> {
        let heightmap = generate_heightmap(dim, seed, params)?;
        Self::from_heightmap(heightmap)
    }

    /// Wrap an existing heightmap. Water maps start dry.
    pub fn from_heightmap(heightmap: Tilemap<f64>) -> Result<Self> {
        let dim = heightmap.dim();
        if dim.is_empty() {
            return Err(SimError::InvalidDimensions(dim));
        }
        if let Some(bad) = heightmap.as_slice().iter().find(|h| !h.is_finite()) {
            return Err(SimError::invalid("heightmap", format!("non-finite height {bad}")));
        }

        Ok(Self {
            dim,
            heightmap,
            waterpath: Tilemap::new_with(dim, 0.0),
            waterpool: Tilemap::new_with(dim, 0.0),
        })
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    /// Interpolated ground height at a continuous position.
    pub fn height_at(&self, x: f64, y: f64) -> f64 {
        height_at(&self.heightmap, x, y)
    }

    /// Interpolated ground gradient at a continuous position.
    pub fn gradient_at(&self, x: f64, y: f64) -> (f64, f64) {
        gradient_at(&self.heightmap, x, y)
    }

    /// Water surface (ground plus standing water) of a cell.
    pub fn surface(&self, x: usize, y: usize) -> f64 {
        *self.heightmap.get(x, y) + *self.waterpool.get(x, y)
    }

    pub fn is_submerged(&self, x: usize, y: usize) -> bool {
        *self.waterpool.get(x, y) > 0.0
    }

    pub fn normal(&self, x: usize, y: usize, scale: f64) -> [f64; 3] {
        surface_normal(&self.heightmap, x, y, scale)
    }

    /// Total standing water volume in height units.
    pub fn pooled_water(&self) -> f64 {
        self.waterpool.sum()
    }
}
