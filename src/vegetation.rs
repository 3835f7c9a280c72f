//! Vegetation growth and root-density feedback.
//!
//! Plants grow towards a fixed maximum size and spread onto nearby dry, flat
//! ground. Their roots add to a density map that erosion reads as
//! resistance: the denser the roots, the less a drop can carve.

use std::collections::HashSet;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::terrain::TerrainGrid;
use crate::tilemap::{Dim, Tilemap};

/// A single plant anchored to a grid cell.
///
/// Position and cell index are fixed by the constructors and only read
/// afterwards, so the index always names the cell containing the position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Plant {
    pos: (f64, f64),
    index: usize,
    size: f64,
}

impl Plant {
    pub const MAX_SIZE: f64 = 5.0;
    pub const GROWTH_RATE: f64 = 0.05;
    pub const INITIAL_SIZE: f64 = 0.5;

    /// Plant at the corner of the cell with flat index `index`.
    pub fn from_index(index: usize, dim: Dim) -> Self {
        let (x, y) = dim.cell(index);
        Self {
            pos: (x as f64, y as f64),
            index,
            size: Self::INITIAL_SIZE,
        }
    }

    /// Plant at a continuous position, or `None` when it lies off the grid.
    pub fn from_position(x: f64, y: f64, dim: Dim) -> Option<Self> {
        if !dim.contains_pos(x, y) {
            return None;
        }
        let (cx, cy) = dim.cell_at(x, y);
        Some(Self {
            pos: (x, y),
            index: dim.index(cx, cy),
            size: Self::INITIAL_SIZE,
        })
    }

    /// Continuous grid position.
    pub fn pos(&self) -> (f64, f64) {
        self.pos
    }

    /// Flat index of the cell containing [`Plant::pos`].
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current size, never above [`Plant::MAX_SIZE`].
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Close a fixed fraction of the gap to the maximum size.
    pub fn grow(&mut self) {
        self.size += Self::GROWTH_RATE * (Self::MAX_SIZE - self.size);
        self.size = self.size.min(Self::MAX_SIZE);
    }

    /// Add `factor` to every cell of the square of radius `round(MAX_SIZE)`
    /// around the plant's cell, clipped at the grid edges.
    pub fn root(&self, density: &mut Tilemap<f64>, factor: f64) {
        let dim = density.dim();
        let (ix, iy) = dim.cell(self.index);
        let r = Self::MAX_SIZE.round() as usize;

        let x_lo = ix.saturating_sub(r);
        let x_hi = (ix + r).min(dim.x - 1);
        let y_lo = iy.saturating_sub(r);
        let y_hi = (iy + r).min(dim.y - 1);

        for x in x_lo..=x_hi {
            for y in y_lo..=y_hi {
                *density.get_mut(x, y) += factor;
            }
        }
    }
}

/// Plant admission, spreading and mortality parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationParams {
    /// Root density added per plant to each cell under its roots
    pub root_factor: f64,
    /// Each plant spreads with probability `1 / spread_chance` per cycle
    pub spread_chance: u32,
    /// Largest offset, in cells, between a plant and its offspring
    pub spread_radius: i64,
    /// Cells with at least this much flow are streams and stay bare
    pub max_waterpath: f64,
    /// Minimum normal `y` component for a cell to host a plant
    pub min_flatness: f64,
    /// Remove plants standing in water, and a random few each cycle
    pub mortality: bool,
    /// With mortality on, each plant dies with probability `1 / death_chance`
    pub death_chance: u32,
}

impl Default for VegetationParams {
    fn default() -> Self {
        Self {
            root_factor: 1.0,
            spread_chance: 50,
            spread_radius: 4,
            max_waterpath: 0.2,
            min_flatness: 0.8,
            mortality: false,
            death_chance: 1000,
        }
    }
}

impl VegetationParams {
    pub fn validate(&self) -> Result<()> {
        if self.spread_chance == 0 {
            return Err(SimError::invalid("vegetation.spread_chance", "must be at least 1"));
        }
        if self.death_chance == 0 {
            return Err(SimError::invalid("vegetation.death_chance", "must be at least 1"));
        }
        if self.spread_radius < 0 {
            return Err(SimError::invalid("vegetation.spread_radius", "must not be negative"));
        }
        if !(self.root_factor.is_finite() && self.root_factor >= 0.0) {
            return Err(SimError::invalid("vegetation.root_factor", "must not be negative"));
        }
        Ok(())
    }
}

/// What happened during one growth cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowthReport {
    /// Plants that grew this cycle
    pub grown: usize,
    /// Seedlings admitted at a random cell
    pub seeded: usize,
    /// Offspring admitted next to a parent
    pub spread: usize,
    /// Plants removed by mortality
    pub died: usize,
}

/// The plant population and its root-density map.
#[derive(Clone, Debug)]
pub struct Vegetation {
    plants: Vec<Plant>,
    root_density: Tilemap<f64>,
}

impl Vegetation {
    pub fn new(dim: Dim) -> Self {
        Self {
            plants: Vec::new(),
            root_density: Tilemap::new_with(dim, 0.0),
        }
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    /// Sum of every plant's root contribution, per cell.
    pub fn root_density(&self) -> &Tilemap<f64> {
        &self.root_density
    }

    /// Add a plant directly, bypassing admission. Returns false if its cell
    /// already hosts a plant.
    pub fn insert(&mut self, plant: Plant, root_factor: f64) -> bool {
        if self.plants.iter().any(|p| p.index == plant.index) {
            return false;
        }
        plant.root(&mut self.root_density, root_factor);
        self.plants.push(plant);
        true
    }

    /// Rebuild the root-density map from the current population.
    pub fn recompute_roots(&mut self, root_factor: f64) {
        self.root_density.fill(0.0);
        for plant in &self.plants {
            plant.root(&mut self.root_density, root_factor);
        }
    }

    /// Advance the population by one cycle.
    ///
    /// Every plant grows, mortality (if enabled) removes plants standing in
    /// water, one random cell is tried as a seedling, and each plant may seed
    /// a neighbor. The root-density map is rebuilt at the end.
    pub fn grow_cycle(
        &mut self,
        terrain: &TerrainGrid,
        scale: f64,
        params: &VegetationParams,
        rng: &mut ChaCha8Rng,
    ) -> GrowthReport {
        let dim = terrain.dim();
        let mut report = GrowthReport::default();

        for plant in self.plants.iter_mut() {
            plant.grow();
        }
        report.grown = self.plants.len();

        if params.mortality {
            let before = self.plants.len();
            self.plants.retain(|plant| {
                let (x, y) = dim.cell(plant.index);
                let drowned = terrain.is_submerged(x, y)
                    || *terrain.waterpath.get(x, y) >= params.max_waterpath;
                !drowned && rng.gen_range(0..params.death_chance) != 0
            });
            report.died = before - self.plants.len();
        }

        let mut occupied: HashSet<usize> = self.plants.iter().map(|p| p.index).collect();
        let eligible = |x: usize, y: usize| {
            !terrain.is_submerged(x, y)
                && *terrain.waterpath.get(x, y) < params.max_waterpath
                && terrain.normal(x, y, scale)[1] > params.min_flatness
        };

        let index = rng.gen_range(0..dim.area());
        let (x, y) = dim.cell(index);
        if !occupied.contains(&index) && eligible(x, y) {
            occupied.insert(index);
            self.plants.push(Plant::from_index(index, dim));
            report.seeded += 1;
        }

        let parents = self.plants.len();
        for i in 0..parents {
            if rng.gen_range(0..params.spread_chance) != 0 {
                continue;
            }

            let (px, py) = self.plants[i].pos;
            let dx = rng.gen_range(-params.spread_radius..=params.spread_radius) as f64;
            let dy = rng.gen_range(-params.spread_radius..=params.spread_radius) as f64;
            let Some(child) = Plant::from_position(px + dx, py + dy, dim) else {
                continue;
            };

            let (cx, cy) = dim.cell(child.index);
            if occupied.contains(&child.index) || !eligible(cx, cy) {
                continue;
            }
            // Steeper ground is more likely to take a seed
            let flatness = terrain.normal(cx, cy, scale)[1];
            if rng.gen::<f64>() <= flatness {
                continue;
            }

            occupied.insert(child.index);
            self.plants.push(child);
            report.spread += 1;
        }

        self.recompute_roots(params.root_factor);
        report
    }
}
