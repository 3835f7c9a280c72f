//! Read-only world state for consumers outside the simulation.
//!
//! A [`Snapshot`] is a full copy taken between frames, so renderers and
//! exporters never observe a half-applied erosion batch.

use serde::{Deserialize, Serialize};

use crate::erosion::utils::surface_normal;
use crate::tilemap::{Dim, Tilemap};
use crate::vegetation::Plant;

/// Colours mixed into the per-cell hydro signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydroPalette {
    /// Ground colour at height 0
    pub terrain_low: [f64; 3],
    /// Ground colour at height 1
    pub terrain_high: [f64; 3],
    /// Colour of flowing water, weighted by `waterpath`
    pub flow: [f64; 3],
    /// Colour of standing water
    pub water: [f64; 3],
    /// Pool depth that reaches full water colour is `1 / depth_gain`
    pub depth_gain: f64,
}

impl Default for HydroPalette {
    fn default() -> Self {
        Self {
            terrain_low: [0.40, 0.55, 0.28],
            terrain_high: [0.62, 0.58, 0.50],
            flow: [0.35, 0.55, 0.85],
            water: [0.15, 0.30, 0.60],
            depth_gain: 50.0,
        }
    }
}

#[inline]
fn mix(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    // Exact at both t = 0 and t = 1
    let s = 1.0 - t;
    [a[0] * s + b[0] * t, a[1] * s + b[1] * t, a[2] * s + b[2] * t]
}

/// Copy of the terrain grids and plant list at one frame.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub dim: Dim,
    /// Vertical scale used for normals and rendering
    pub scale: f64,
    /// Frames simulated when the snapshot was taken
    pub frame: u64,
    pub heightmap: Tilemap<f64>,
    pub waterpath: Tilemap<f64>,
    pub waterpool: Tilemap<f64>,
    pub plants: Vec<Plant>,
}

impl Snapshot {
    /// Hydro colour of one cell, each channel in `[0, 1]`.
    pub fn hydro_at(&self, x: usize, y: usize, palette: &HydroPalette) -> [f64; 3] {
        let height = *self.heightmap.get(x, y);
        let path = *self.waterpath.get(x, y);
        let pool = *self.waterpool.get(x, y);

        let ground = mix(palette.terrain_low, palette.terrain_high, height);
        let flowing = mix(ground, palette.flow, path);
        mix(flowing, palette.water, (pool * palette.depth_gain).min(1.0))
    }

    /// Hydro colour for every cell.
    pub fn hydro(&self, palette: &HydroPalette) -> Tilemap<[f64; 3]> {
        let mut map = Tilemap::new_with(self.dim, [0.0; 3]);
        for (x, y, colour) in map.iter_mut() {
            *colour = self.hydro_at(x, y, palette);
        }
        map
    }

    pub fn normal(&self, x: usize, y: usize) -> [f64; 3] {
        surface_normal(&self.heightmap, x, y, self.scale)
    }
}
