//! Hydraulic erosion simulation using particle-based water drops.
//!
//! Each drop follows the terrain gradient, picking up sediment where it
//! speeds up and depositing it when it slows down or climbs. Drops run
//! strictly one after another, so every drop sees the terrain left behind by
//! the previous one.
//!
//! A drop ends in one of four ways (see [`DropFate`]):
//! - it leaves the grid,
//! - it dries up or runs out of steps,
//! - it stalls in a hollow and fills a pool,
//! - it flows into standing water.
//!
//! Stalled drops hand their water to [`resolve_pool`]. When the pool spills
//! over its rim the leftover water continues as a fresh drop from the spill
//! cell, up to `max_spills` times.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::erosion::params::ErosionParams;
use crate::erosion::pool::{resolve_pool, PoolOutcome};
use crate::erosion::utils::create_erosion_brush;
use crate::erosion::{DropFate, ErosionStats};
use crate::terrain::TerrainGrid;
use crate::tilemap::Tilemap;

/// A water drop for hydraulic erosion simulation
#[derive(Clone, Debug)]
struct WaterDrop {
    /// Position (continuous grid coordinates)
    x: f64,
    y: f64,
    /// Movement direction (normalized once moving)
    dir_x: f64,
    dir_y: f64,
    /// Current speed
    velocity: f64,
    /// Water volume
    volume: f64,
    /// Carried sediment
    sediment: f64,
}

impl WaterDrop {
    fn new(x: f64, y: f64, volume: f64) -> Self {
        Self {
            x,
            y,
            dir_x: 0.0,
            dir_y: 0.0,
            velocity: 0.0,
            volume,
            sediment: 0.0,
        }
    }
}

/// How one uninterrupted stretch of flow ended.
enum Segment {
    Escaped,
    Evaporated,
    /// Came to rest at a local minimum
    Stalled((usize, usize)),
    /// Reached a submerged cell
    EnteredPool((usize, usize)),
}

/// Run `cycles` drops spawned at uniformly random positions.
///
/// Flow intensity is tracked over the whole batch and folded into
/// `terrain.waterpath` when the batch ends.
pub fn simulate(
    terrain: &mut TerrainGrid,
    roots: &Tilemap<f64>,
    params: &ErosionParams,
    rng: &mut ChaCha8Rng,
    cycles: usize,
) -> ErosionStats {
    let dim = terrain.dim();
    let width = dim.x as f64;
    let height = dim.y as f64;

    let mut sim = DropSimulator::new(terrain, roots, params);
    for _ in 0..cycles {
        let x = rng.gen_range(0.0..width);
        let y = rng.gen_range(0.0..height);
        sim.run_drop(x, y);
    }
    sim.finish()
}

/// Runs drops against one terrain and accumulates their flow track.
///
/// Call [`DropSimulator::finish`] to fold the track into the terrain's
/// `waterpath` and collect the batch statistics.
pub struct DropSimulator<'a> {
    terrain: &'a mut TerrainGrid,
    roots: &'a Tilemap<f64>,
    params: &'a ErosionParams,
    brush: Vec<(i64, i64, f64)>,
    track: Tilemap<f64>,
    stats: ErosionStats,
}

impl<'a> DropSimulator<'a> {
    pub fn new(terrain: &'a mut TerrainGrid, roots: &'a Tilemap<f64>, params: &'a ErosionParams) -> Self {
        let track = Tilemap::new_with(terrain.dim(), 0.0);
        Self {
            terrain,
            roots,
            params,
            brush: create_erosion_brush(params.erosion_radius),
            track,
            stats: ErosionStats::default(),
        }
    }

    /// Simulate a single drop spawned at `(x, y)` until it reaches a
    /// terminal state.
    pub fn run_drop(&mut self, x: f64, y: f64) -> DropFate {
        let fate = self.run_drop_inner(x, y);
        self.stats.record(fate);
        fate
    }

    fn run_drop_inner(&mut self, x: f64, y: f64) -> DropFate {
        let mut drop = WaterDrop::new(x, y, self.params.initial_volume);
        let mut spills = 0;

        loop {
            let (cell, fate) = match self.flow(&mut drop) {
                Segment::Escaped => return DropFate::Escaped,
                Segment::Evaporated => return DropFate::Evaporated,
                Segment::Stalled(cell) => (cell, DropFate::Pooled),
                Segment::EnteredPool(cell) => (cell, DropFate::Deposited),
            };

            match resolve_pool(self.terrain, cell, drop.volume, self.params) {
                PoolOutcome::Absorbed { .. } => return fate,
                PoolOutcome::Exhausted { .. } => {
                    self.stats.exhausted_pools += 1;
                    return fate;
                }
                PoolOutcome::Overflow { cell: (ox, oy), volume } => {
                    if spills >= self.params.max_spills || volume < self.params.min_volume {
                        return DropFate::Evaporated;
                    }
                    spills += 1;
                    self.stats.spills += 1;
                    drop = WaterDrop::new(ox as f64 + 0.5, oy as f64 + 0.5, volume);
                }
            }
        }
    }

    /// Move a drop until it stops flowing. All carried sediment is dropped
    /// before returning.
    fn flow(&mut self, drop: &mut WaterDrop) -> Segment {
        let p = self.params;
        let dim = self.terrain.dim();

        for _ in 0..p.max_steps {
            let (cx, cy) = dim.cell_at(drop.x, drop.y);

            if self.terrain.is_submerged(cx, cy) {
                self.deposit_all(drop, cx, cy);
                return Segment::EnteredPool((cx, cy));
            }

            self.stats.steps_taken += 1;
            *self.track.get_mut(cx, cy) += drop.volume;

            // Blend previous direction with the downhill gradient
            let (grad_x, grad_y) = self.terrain.gradient_at(drop.x, drop.y);
            drop.dir_x = drop.dir_x * p.inertia - grad_x * (1.0 - p.inertia);
            drop.dir_y = drop.dir_y * p.inertia - grad_y * (1.0 - p.inertia);

            let dir_len = (drop.dir_x * drop.dir_x + drop.dir_y * drop.dir_y).sqrt();
            if !(dir_len >= p.min_direction) {
                self.deposit_all(drop, cx, cy);
                return Segment::Stalled((cx, cy));
            }
            drop.dir_x /= dir_len;
            drop.dir_y /= dir_len;

            let old_x = drop.x;
            let old_y = drop.y;
            let old_height = self.terrain.height_at(old_x, old_y);

            drop.x += drop.dir_x * p.step_length;
            drop.y += drop.dir_y * p.step_length;

            if !dim.contains_pos(drop.x, drop.y) {
                self.deposit_all(drop, cx, cy);
                return Segment::Escaped;
            }

            let new_height = self.terrain.height_at(drop.x, drop.y);
            let delta_height = new_height - old_height;
            if !delta_height.is_finite() {
                self.deposit_all(drop, cx, cy);
                return Segment::Evaporated;
            }

            // Climbing costs kinetic energy; a drop that cannot pay is stuck
            let energy = drop.velocity * drop.velocity - delta_height * p.gravity;
            if delta_height > 0.0 && energy <= 0.0 {
                drop.x = old_x;
                drop.y = old_y;
                self.deposit_all(drop, cx, cy);
                return Segment::Stalled((cx, cy));
            }
            drop.velocity = energy.max(0.0).sqrt() * (1.0 - p.friction);

            let capacity =
                (-delta_height).max(p.min_slope) * drop.velocity * drop.volume * p.capacity_factor;

            if delta_height > 0.0 || drop.sediment > capacity {
                let amount = if delta_height > 0.0 {
                    delta_height.min(drop.sediment)
                } else {
                    (drop.sediment - capacity) * p.deposition_rate
                };
                self.deposit(drop, cx, cy, amount);
            } else {
                let roots = *self.roots.get(cx, cy);
                let erodibility = 1.0 / (1.0 + p.root_resistance * roots.max(0.0));
                let amount =
                    ((capacity - drop.sediment) * p.erosion_rate * erodibility).min(-delta_height);
                self.erode(drop, cx, cy, amount, new_height);
            }

            drop.volume *= 1.0 - p.evaporation;
            if drop.volume < p.min_volume {
                let (nx, ny) = dim.cell_at(drop.x, drop.y);
                self.deposit_all(drop, nx, ny);
                return Segment::Evaporated;
            }
        }

        let (nx, ny) = dim.cell_at(drop.x, drop.y);
        self.deposit_all(drop, nx, ny);
        Segment::Evaporated
    }

    /// Remove up to `amount` around `(cx, cy)` using the brush. No cell is
    /// lowered below `floor`; only material actually removed is picked up.
    fn erode(&mut self, drop: &mut WaterDrop, cx: usize, cy: usize, amount: f64, floor: f64) {
        if !(amount > 0.0) {
            return;
        }

        let dim = self.terrain.dim();
        let in_bounds = |&(dx, dy, _): &(i64, i64, f64)| {
            let x = cx as i64 + dx;
            let y = cy as i64 + dy;
            x >= 0 && y >= 0 && dim.contains(x as usize, y as usize)
        };

        // Brush cells clipped by the edge give their share to the rest
        let total_weight: f64 = self.brush.iter().filter(|&b| in_bounds(b)).map(|b| b.2).sum();
        if !(total_weight > 0.0) {
            return;
        }

        let mut removed = 0.0;
        for brush_cell in self.brush.iter().filter(|&b| in_bounds(b)) {
            let (dx, dy, weight) = *brush_cell;
            let x = (cx as i64 + dx) as usize;
            let y = (cy as i64 + dy) as usize;

            let h = self.terrain.heightmap.get_mut(x, y);
            let take = (amount * weight / total_weight).min((*h - floor).max(0.0));
            if take > 0.0 {
                *h -= take;
                *self.track.get_mut(x, y) += take;
                removed += take;
            }
        }

        drop.sediment += removed;
        self.stats.total_eroded += removed;
        self.stats.max_erosion = self.stats.max_erosion.max(removed);
    }

    /// Lay down up to `amount` of carried sediment on a single cell.
    /// Standing water on that cell is displaced by the same amount.
    fn deposit(&mut self, drop: &mut WaterDrop, cx: usize, cy: usize, amount: f64) {
        let amount = amount.min(drop.sediment);
        if !(amount > 0.0) {
            return;
        }

        drop.sediment -= amount;
        *self.terrain.heightmap.get_mut(cx, cy) += amount;
        let pool = self.terrain.waterpool.get_mut(cx, cy);
        *pool = (*pool - amount).max(0.0);

        self.stats.total_deposited += amount;
        self.stats.max_deposition = self.stats.max_deposition.max(amount);
    }

    fn deposit_all(&mut self, drop: &mut WaterDrop, cx: usize, cy: usize) {
        let amount = drop.sediment;
        self.deposit(drop, cx, cy, amount);
    }

    /// End the batch: fold the flow track into `waterpath` and return the
    /// batch statistics.
    pub fn finish(self) -> ErosionStats {
        let decay = self.params.path_decay;
        let waterpath = self.terrain.waterpath.as_mut_slice();
        for (path, &track) in waterpath.iter_mut().zip(self.track.as_slice()) {
            *path = ((1.0 - decay) * *path + decay * track.min(1.0)).clamp(0.0, 1.0);
        }
        self.stats
    }
}
