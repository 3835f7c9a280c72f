use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::tilemap::{Dim, Tilemap};

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

/// Parameters for noise terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Base frequency over the unit square (lower = larger features)
    pub base_frequency: f64,
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            base_frequency: 1.0,
            octaves: 8,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Err(SimError::invalid("terrain.octaves", "must be at least 1"));
        }
        if !(self.base_frequency.is_finite() && self.base_frequency > 0.0) {
            return Err(SimError::invalid("terrain.base_frequency", "must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// HEIGHTMAP GENERATION
// =============================================================================

/// Generate a heightmap from multi-octave Perlin noise.
///
/// Each cell samples the noise at its position over the unit square
/// `(x / dim.x, y / dim.y)`, and the result is normalized to `[0, 1]`.
/// The same `seed` always produces the same terrain.
pub fn generate_heightmap(dim: Dim, seed: u32, params: &TerrainParams) -> Result<Tilemap<f64>> {
    if dim.is_empty() {
        return Err(SimError::InvalidDimensions(dim));
    }
    params.validate()?;

    let noise = Perlin::new(seed);
    let mut heightmap = Tilemap::new_with(dim, 0.0f64);

    for (x, y, h) in heightmap.iter_mut() {
        let nx = x as f64 / dim.x as f64;
        let ny = y as f64 / dim.y as f64;
        *h = fbm(
            &noise,
            nx * params.base_frequency,
            ny * params.base_frequency,
            params.octaves,
            params.persistence,
            params.lacunarity,
        );
    }

    normalize_heightmap(&mut heightmap);
    Ok(heightmap)
}

/// Fractional Brownian Motion - multi-octave noise
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}

/// Rescale heightmap values to the 0.0-1.0 range in place.
/// A map with no variation becomes flat zero.
pub fn normalize_heightmap(heightmap: &mut Tilemap<f64>) {
    let (min_val, max_val) = heightmap.min_max();
    let range = max_val - min_val;

    if !(range > 1e-12) {
        heightmap.fill(0.0);
        return;
    }

    for (_, _, h) in heightmap.iter_mut() {
        *h = (*h - min_val) / range;
    }
}
