//! World simulation context
//!
//! Owns the terrain, the plant population, the scheduler and the random
//! streams, and drives them through the frame loop:
//! erosion batch, then (every `base_cycles` drops) a growth cycle and a
//! smoothing pass.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, debug_span, info};

use crate::config::SimConfig;
use crate::erosion::{self, DropFate, DropSimulator, ErosionStats};
use crate::error::{Result, SimError};
use crate::scheduler::AdaptiveScheduler;
use crate::seeds::WorldSeeds;
use crate::smoothing::smooth_heightmap;
use crate::snapshot::Snapshot;
use crate::terrain::TerrainGrid;
use crate::tilemap::{Dim, Tilemap};
use crate::vegetation::{GrowthReport, Plant, Vegetation};

/// Outcome of one scheduled frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    /// Index of the frame (starting at 0)
    pub frame: u64,
    /// Drops simulated this frame
    pub erodes: usize,
    /// Growth cycle result, if one ran (a smoothing pass ran with it)
    pub growth: Option<GrowthReport>,
    /// Wall time of the frame, as fed to the scheduler
    pub elapsed: Duration,
    /// Scheduler rate after this frame
    pub rate: usize,
    pub erosion: ErosionStats,
}

/// The simulated world.
pub struct World {
    seeds: WorldSeeds,
    config: SimConfig,
    terrain: TerrainGrid,
    vegetation: Vegetation,
    scheduler: AdaptiveScheduler,
    erosion_rng: ChaCha8Rng,
    vegetation_rng: ChaCha8Rng,
    frame: u64,
}

impl World {
    /// Generate a world from noise terrain.
    pub fn generate(seeds: WorldSeeds, config: SimConfig) -> Result<Self> {
        config.validate()?;
        info!(dim = %config.dim(), seed = seeds.master, "generating terrain");

        let terrain = TerrainGrid::generate(config.dim(), seeds.noise_seed(), &config.terrain)?;
        Ok(Self::assemble(seeds, config, terrain))
    }

    /// Build a world around an existing heightmap. The grid size is taken
    /// from the heightmap.
    pub fn from_heightmap(heightmap: Tilemap<f64>, seeds: WorldSeeds, mut config: SimConfig) -> Result<Self> {
        let dim = heightmap.dim();
        if dim.is_empty() {
            return Err(SimError::InvalidDimensions(dim));
        }
        config.width = dim.x;
        config.height = dim.y;
        config.validate()?;

        let terrain = TerrainGrid::from_heightmap(heightmap)?;
        Ok(Self::assemble(seeds, config, terrain))
    }

    fn assemble(seeds: WorldSeeds, config: SimConfig, terrain: TerrainGrid) -> Self {
        Self {
            vegetation: Vegetation::new(terrain.dim()),
            scheduler: AdaptiveScheduler::new(config.scheduler.clone()),
            erosion_rng: ChaCha8Rng::seed_from_u64(seeds.erosion),
            vegetation_rng: ChaCha8Rng::seed_from_u64(seeds.vegetation),
            frame: 0,
            seeds,
            config,
            terrain,
        }
    }

    pub fn seeds(&self) -> &WorldSeeds {
        &self.seeds
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn dim(&self) -> Dim {
        self.terrain.dim()
    }

    pub fn scale(&self) -> f64 {
        self.config.scale
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    pub fn vegetation(&self) -> &Vegetation {
        &self.vegetation
    }

    pub fn plants(&self) -> &[Plant] {
        self.vegetation.plants()
    }

    pub fn scheduler(&self) -> &AdaptiveScheduler {
        &self.scheduler
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run `cycles` drops at random positions.
    pub fn erode(&mut self, cycles: usize) -> ErosionStats {
        let stats = erosion::simulate(
            &mut self.terrain,
            self.vegetation.root_density(),
            &self.config.erosion,
            &mut self.erosion_rng,
            cycles,
        );
        debug!(
            drops = stats.drops,
            eroded = stats.total_eroded,
            deposited = stats.total_deposited,
            escaped = stats.escaped,
            pooled = stats.pooled,
            "erosion batch"
        );
        stats
    }

    /// Run a single drop from a chosen position.
    pub fn erode_drop_at(&mut self, x: f64, y: f64) -> (DropFate, ErosionStats) {
        let mut sim = DropSimulator::new(
            &mut self.terrain,
            self.vegetation.root_density(),
            &self.config.erosion,
        );
        let fate = sim.run_drop(x, y);
        (fate, sim.finish())
    }

    /// Run one growth cycle.
    pub fn grow(&mut self) -> GrowthReport {
        let report = self.vegetation.grow_cycle(
            &self.terrain,
            self.config.scale,
            &self.config.vegetation,
            &mut self.vegetation_rng,
        );
        debug!(
            plants = self.vegetation.len(),
            seeded = report.seeded,
            spread = report.spread,
            died = report.died,
            "growth cycle"
        );
        report
    }

    /// Run one smoothing pass over the heightmap.
    pub fn smooth(&mut self) {
        smooth_heightmap(&mut self.terrain.heightmap, &self.config.smoothing);
    }

    /// Run one scheduled frame and feed its duration back to the scheduler.
    ///
    /// The measured time covers the erosion batch and, when one fires, the
    /// growth cycle and smoothing pass.
    pub fn step_frame(&mut self) -> FrameReport {
        let _span = debug_span!("frame", frame = self.frame).entered();
        let start = Instant::now();

        let plan = self.scheduler.plan_frame();
        let erosion = self.erode(plan.erodes);
        let growth = plan.grow.then(|| {
            let report = self.grow();
            self.smooth();
            report
        });

        let elapsed = start.elapsed();
        self.scheduler.record(plan.erodes, elapsed);

        let report = FrameReport {
            frame: self.frame,
            erodes: plan.erodes,
            growth,
            elapsed,
            rate: self.scheduler.rate(),
            erosion,
        };
        self.frame += 1;
        report
    }

    /// Immutable copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            dim: self.dim(),
            scale: self.config.scale,
            frame: self.frame,
            heightmap: self.terrain.heightmap.clone(),
            waterpath: self.terrain.waterpath.clone(),
            waterpool: self.terrain.waterpool.clone(),
            plants: self.vegetation.plants().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            width: 32,
            height: 32,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let mut a = World::generate(WorldSeeds::from_master(42), small_config()).unwrap();
        let mut b = World::generate(WorldSeeds::from_master(42), small_config()).unwrap();
        a.erode(100);
        b.erode(100);
        assert_eq!(a.terrain().heightmap, b.terrain().heightmap);
        assert_eq!(a.terrain().waterpool, b.terrain().waterpool);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = SimConfig {
            height: 0,
            ..small_config()
        };
        assert!(World::generate(WorldSeeds::from_master(1), config).is_err());
    }

    #[test]
    fn test_step_frame_counts_drops() {
        let mut world = World::generate(WorldSeeds::from_master(9), small_config()).unwrap();
        let report = world.step_frame();
        assert_eq!(report.frame, 0);
        assert_eq!(report.erodes, 250);
        assert_eq!(report.erosion.drops, 250);
        assert!(report.growth.is_none());
        assert!((1..=250).contains(&report.rate));
        assert_eq!(world.frame(), 1);
    }

    #[test]
    fn test_from_heightmap_takes_grid_size() {
        let map = Tilemap::new_with(Dim::new(5, 7), 0.0);
        let world = World::from_heightmap(map, WorldSeeds::from_master(0), SimConfig::default()).unwrap();
        assert_eq!(world.dim(), Dim::new(5, 7));
        assert_eq!(world.config().width, 5);
        assert_eq!(world.snapshot().heightmap.dim(), Dim::new(5, 7));
    }
}
