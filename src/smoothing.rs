//! Separable low-pass filter over the heightmap.
//!
//! One pass along x, then one along y, each blending a cell towards the
//! average of its two neighbors by `smoothness`. At the edges the single
//! neighbor takes the full `smoothness` weight.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::tilemap::Tilemap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Weight given to the neighbors (0.0-1.0)
    pub smoothness: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self { smoothness: 0.01 }
    }
}

impl SmoothingParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.smoothness) {
            return Err(SimError::invalid(
                "smoothing.smoothness",
                format!("{} is outside [0, 1]", self.smoothness),
            ));
        }
        Ok(())
    }
}

/// Smooth the heightmap in place with one x pass and one y pass.
pub fn smooth_heightmap(heightmap: &mut Tilemap<f64>, params: &SmoothingParams) {
    let dim = heightmap.dim();
    if dim.is_empty() {
        return;
    }
    let w = params.smoothness;

    // x pass: each chunk is the column at one x, neighbors come from `source`
    let source = heightmap.as_slice();
    let mut scratch = vec![0.0; dim.area()];
    scratch
        .par_chunks_mut(dim.y)
        .enumerate()
        .for_each(|(x, column)| {
            for (y, out) in column.iter_mut().enumerate() {
                let at = |x: usize| source[dim.index(x, y)];
                let prev = (x > 0).then(|| at(x - 1));
                let next = (x + 1 < dim.x).then(|| at(x + 1));
                *out = blend(at(x), prev, next, w);
            }
        });

    // y pass: each column is contiguous
    heightmap
        .as_mut_slice()
        .par_chunks_mut(dim.y)
        .zip(scratch.par_chunks(dim.y))
        .for_each(|(column, line)| {
            for (y, out) in column.iter_mut().enumerate() {
                let prev = y.checked_sub(1).map(|i| line[i]);
                let next = line.get(y + 1).copied();
                *out = blend(line[y], prev, next, w);
            }
        });
}

/// `center + w * (neighbor_avg - center)`, one-sided when a neighbor is
/// missing. A lone cell is returned unchanged.
#[inline]
fn blend(center: f64, prev: Option<f64>, next: Option<f64>, w: f64) -> f64 {
    let neighbors = match (prev, next) {
        (Some(a), Some(b)) => 0.5 * (a + b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return center,
    };
    center + w * (neighbors - center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Dim;

    #[test]
    fn test_flat_input_unchanged() {
        let mut map = Tilemap::new_with(Dim::new(9, 5), 0.37);
        let before = map.clone();
        smooth_heightmap(&mut map, &SmoothingParams { smoothness: 0.3 });
        assert_eq!(map, before);
    }

    #[test]
    fn test_spike_spreads_to_neighbors() {
        let mut map = Tilemap::new_with(Dim::new(5, 5), 0.0);
        map.set(2, 2, 1.0);
        smooth_heightmap(&mut map, &SmoothingParams { smoothness: 0.2 });

        // Separable weights: 0.8 for self, 0.1 per neighbor on each axis
        assert!((*map.get(2, 2) - 0.64).abs() < 1e-12);
        assert!((*map.get(1, 2) - 0.08).abs() < 1e-12);
        assert!((*map.get(2, 3) - 0.08).abs() < 1e-12);
        assert!((*map.get(1, 1) - 0.01).abs() < 1e-12);
        assert_eq!(*map.get(0, 0), 0.0);
    }

    #[test]
    fn test_edge_uses_single_neighbor() {
        let mut map = Tilemap::new_with(Dim::new(3, 1), 0.0);
        map.set(1, 0, 1.0);
        smooth_heightmap(&mut map, &SmoothingParams { smoothness: 0.1 });
        assert!((*map.get(0, 0) - 0.1).abs() < 1e-12);
        assert!((*map.get(1, 0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_matches_sequential_definition() {
        let dim = Dim::new(6, 4);
        let mut map = Tilemap::new_with(dim, 0.0);
        for (x, y, h) in map.iter_mut() {
            *h = ((x * 7 + y * 3) % 5) as f64;
        }
        let params = SmoothingParams { smoothness: 0.25 };

        let mut mid = map.clone();
        for (x, y, h) in mid.iter_mut() {
            let prev = (x > 0).then(|| *map.get(x - 1, y));
            let next = (x + 1 < dim.x).then(|| *map.get(x + 1, y));
            *h = blend(*map.get(x, y), prev, next, 0.25);
        }
        let mut expected = mid.clone();
        for (x, y, h) in expected.iter_mut() {
            let prev = (y > 0).then(|| *mid.get(x, y - 1));
            let next = (y + 1 < dim.y).then(|| *mid.get(x, y + 1));
            *h = blend(*mid.get(x, y), prev, next, 0.25);
        }

        smooth_heightmap(&mut map, &params);
        assert_eq!(map, expected);
    }
}
