//! Standing water at local minima.
//!
//! A stalled drop's volume floods outward from the stall cell as one flat
//! water plane. Rim cells are visited lowest first (priority flood), so the
//! plane absorbs each hollow it reaches before it climbs any higher.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::erosion::params::ErosionParams;
use crate::terrain::TerrainGrid;

/// Surfaces closer than this count as one water plane.
const LEVEL_EPSILON: f64 = 1e-12;

/// Result of resolving one drop's water into a pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PoolOutcome {
    /// All volume was stored; the lake surface now sits at `level`.
    Absorbed { level: f64, cells: usize },
    /// The plane reached a rim cell lower than itself. `volume` is left over
    /// and flows on from `cell`.
    Overflow { cell: (usize, usize), volume: f64 },
    /// The basin hit the size cap; the rest of the volume is dropped.
    Exhausted { level: f64, cells: usize },
}

#[derive(Clone, Copy, Debug)]
struct RimCell {
    surface: f64,
    index: usize,
}

impl PartialEq for RimCell {
    fn eq(&self, other: &Self) -> bool {
        self.surface == other.surface && self.index == other.index
    }
}

impl Eq for RimCell {}

// Min-heap by surface via reversed ordering, lowest index first on ties.
impl PartialOrd for RimCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RimCell {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .surface
            .partial_cmp(&self.surface)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Store `volume` of drop water as a flat pool grown from `start`.
///
/// Raising the plane by `dh` over `n` cells costs `volume_factor * n * dh`.
/// The pool depth of every basin cell is set to `level - height` (never
/// negative), so the basin ends up with a single free surface.
pub fn resolve_pool(
    terrain: &mut TerrainGrid,
    start: (usize, usize),
    volume: f64,
    params: &ErosionParams,
) -> PoolOutcome {
    let dim = terrain.dim();
    let (sx, sy) = dim.clamp_cell(start.0 as i64, start.1 as i64);

    let mut level = terrain.surface(sx, sy);
    let mut remaining = volume.max(0.0);
    let mut basin = vec![dim.index(sx, sy)];
    // Bounded by the basin plus its rim, not by the grid
    let mut visited = HashSet::new();
    let mut heap = BinaryHeap::new();

    visited.insert(dim.index(sx, sy));
    push_rim(terrain, &mut visited, &mut heap, sx, sy);

    let outcome = loop {
        let Some(rim) = heap.pop() else {
            // The whole grid is one basin; raise it uniformly.
            level += remaining / (basin.len() as f64 * params.volume_factor);
            break PoolOutcome::Absorbed {
                level,
                cells: basin.len(),
            };
        };

        if rim.surface < level - LEVEL_EPSILON {
            break PoolOutcome::Overflow {
                cell: dim.cell(rim.index),
                volume: remaining,
            };
        }

        let n = basin.len() as f64;
        let needed = (rim.surface - level).max(0.0) * n * params.volume_factor;
        if needed >= remaining {
            level += remaining / (n * params.volume_factor);
            break PoolOutcome::Absorbed {
                level,
                cells: basin.len(),
            };
        }

        if basin.len() >= params.max_pool_cells {
            break PoolOutcome::Exhausted {
                level,
                cells: basin.len(),
            };
        }

        remaining -= needed;
        level = level.max(rim.surface);
        basin.push(rim.index);
        let (rx, ry) = dim.cell(rim.index);
        push_rim(terrain, &mut visited, &mut heap, rx, ry);
    };

    for &index in &basin {
        let ground = *terrain.heightmap.at(index);
        *terrain.waterpool.at_mut(index) = (level - ground).max(0.0);
    }

    outcome
}

fn push_rim(
    terrain: &TerrainGrid,
    visited: &mut HashSet<usize>,
    heap: &mut BinaryHeap<RimCell>,
    x: usize,
    y: usize,
) {
    let dim = terrain.dim();
    for (nx, ny) in terrain.heightmap.neighbors_8(x, y) {
        let index = dim.index(nx, ny);
        if visited.insert(index) {
            heap.push(RimCell {
                surface: terrain.surface(nx, ny),
                index,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::{Dim, Tilemap};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// A bowl with rim 1.0 around a 3x3 floor at 0.0. The rim has a notch at
    /// (4, 2) leading down to an outlet at (5, 2).
    fn bowl(notch: f64) -> TerrainGrid {
        let mut map = Tilemap::new_with(Dim::new(6, 5), 1.0);
        for x in 1..4 {
            for y in 1..4 {
                map.set(x, y, 0.0);
            }
        }
        map.set(4, 2, notch);
        map.set(5, 2, 0.0);
        TerrainGrid::from_heightmap(map).unwrap()
    }

    #[test]
    fn test_small_volume_fills_floor_flat() {
        let mut terrain = bowl(1.0);
        let params = ErosionParams::default();

        let outcome = resolve_pool(&mut terrain, (2, 2), 1.0, &params);
        let PoolOutcome::Absorbed { level, cells } = outcome else {
            panic!("expected absorbed, got {outcome:?}");
        };

        assert_eq!(cells, 9);
        assert!((level - 1.0 / (9.0 * params.volume_factor)).abs() < 1e-12);
        for x in 1..4 {
            for y in 1..4 {
                assert!((terrain.surface(x, y) - level).abs() < 1e-12);
            }
        }
        assert_eq!(*terrain.waterpool.get(0, 0), 0.0);
        let stored = terrain.pooled_water() * params.volume_factor;
        assert!((stored - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_overflow_at_lowest_rim() {
        let mut terrain = bowl(0.05);
        let params = ErosionParams::default();

        // Filling the floor to the notch costs 9 * 0.05 * 100 = 45.
        let outcome = resolve_pool(&mut terrain, (2, 2), 60.0, &params);
        match outcome {
            PoolOutcome::Overflow { cell, volume } => {
                assert_eq!(cell, (5, 2));
                assert!((volume - 15.0).abs() < 1e-9);
            }
            other => panic!("expected overflow, got {other:?}"),
        }
        assert!(terrain.is_submerged(2, 2));
        for x in 1..4 {
            for y in 1..4 {
                assert!((terrain.surface(x, y) - 0.05).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_basin_cap_exhausts() {
        let mut terrain = bowl(1.0);
        let params = ErosionParams {
            max_pool_cells: 4,
            ..Default::default()
        };
        let outcome = resolve_pool(&mut terrain, (2, 2), 1000.0, &params);
        assert!(matches!(outcome, PoolOutcome::Exhausted { cells: 4, .. }));
        assert!(terrain.waterpool.as_slice().iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_ulp_below_level_joins_lake() {
        let mut terrain = bowl(1.0);
        for x in 1..4 {
            for y in 1..4 {
                terrain.waterpool.set(x, y, 0.5);
            }
        }
        // One floor cell a single ulp under the rest of the plane
        terrain
            .waterpool
            .set(1, 1, f64::from_bits(0.5f64.to_bits() - 1));
        let params = ErosionParams::default();

        let outcome = resolve_pool(&mut terrain, (2, 2), 1.0, &params);
        let PoolOutcome::Absorbed { level, cells } = outcome else {
            panic!("expected absorbed, got {outcome:?}");
        };
        assert_eq!(cells, 9);
        assert!(level > 0.5);
        for x in 1..4 {
            for y in 1..4 {
                assert!((terrain.surface(x, y) - level).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_flooded_lake_never_overflows_into_itself() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let params = ErosionParams::default();

        for _ in 0..8 {
            let mut map = Tilemap::new_with(Dim::new(9, 9), 1.0);
            for x in 1..8 {
                for y in 1..8 {
                    map.set(x, y, rng.gen_range(0.0..0.5));
                }
            }
            let mut lake = TerrainGrid::from_heightmap(map).unwrap();
            let level: f64 = rng.gen_range(0.55..0.9);
            for x in 1..8 {
                for y in 1..8 {
                    let ground = *lake.heightmap.get(x, y);
                    lake.waterpool.set(x, y, level - ground);
                }
            }

            for x in 1..8 {
                for y in 1..8 {
                    let mut terrain = lake.clone();
                    let outcome = resolve_pool(&mut terrain, (x, y), 0.5, &params);
                    assert!(
                        matches!(outcome, PoolOutcome::Absorbed { cells: 49, .. }),
                        "start ({x}, {y}) gave {outcome:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_pool_on_large_grid_stays_local() {
        let dim = Dim::new(1024, 1024);
        let mut map = Tilemap::new_with(dim, 1.0);
        for x in 500..503 {
            for y in 500..503 {
                map.set(x, y, 0.0);
            }
        }
        let mut terrain = TerrainGrid::from_heightmap(map).unwrap();
        let params = ErosionParams::default();

        let outcome = resolve_pool(&mut terrain, (501, 501), 1.0, &params);
        assert!(matches!(outcome, PoolOutcome::Absorbed { cells: 9, .. }));
        let wet = terrain.waterpool.as_slice().iter().filter(|&&p| p > 0.0).count();
        assert_eq!(wet, 9);
    }
}
