//! Erosion simulation module
//!
//! Water drops flow over the terrain one at a time, carving material where
//! they accelerate and dropping it where they slow down. Drops that come to
//! rest in a hollow hand their water to the pool resolver, which raises a
//! flat lake and lets any surplus spill over the lowest rim.

pub mod hydraulic;
pub mod params;
pub mod pool;
pub mod utils;

pub use hydraulic::{simulate, DropSimulator};
pub use params::{ErosionParams, ErosionPreset};
pub use pool::{resolve_pool, PoolOutcome};

/// Terminal state of a single drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropFate {
    /// Flowed into standing water and left its sediment on the lake floor
    Deposited,
    /// Came to rest in a local minimum and filled a pool
    Pooled,
    /// Ran out of water, steps or spills
    Evaporated,
    /// Left the grid
    Escaped,
}

impl std::fmt::Display for DropFate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposited => write!(f, "deposited"),
            Self::Pooled => write!(f, "pooled"),
            Self::Evaporated => write!(f, "evaporated"),
            Self::Escaped => write!(f, "escaped"),
        }
    }
}

/// Statistics from an erosion batch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErosionStats {
    /// Number of drops simulated
    pub drops: usize,
    /// Total number of drop steps taken
    pub steps_taken: u64,
    /// Total material eroded (in height units)
    pub total_eroded: f64,
    /// Total material deposited
    pub total_deposited: f64,
    /// Largest amount removed by a single step
    pub max_erosion: f64,
    /// Largest amount laid down by a single deposit
    pub max_deposition: f64,
    /// Drops that ended in standing water
    pub deposited: usize,
    /// Drops that filled a pool
    pub pooled: usize,
    /// Drops that dried up
    pub evaporated: usize,
    /// Drops that left the grid
    pub escaped: usize,
    /// Times a drop spilled over a basin rim and flowed on
    pub spills: usize,
    /// Pools that hit the basin size cap
    pub exhausted_pools: usize,
}

impl ErosionStats {
    pub fn record(&mut self, fate: DropFate) {
        self.drops += 1;
        match fate {
            DropFate::Deposited => self.deposited += 1,
            DropFate::Pooled => self.pooled += 1,
            DropFate::Evaporated => self.evaporated += 1,
            DropFate::Escaped => self.escaped += 1,
        }
    }

    /// Fold another batch into this one.
    pub fn merge(&mut self, other: &ErosionStats) {
        self.drops += other.drops;
        self.steps_taken += other.steps_taken;
        self.total_eroded += other.total_eroded;
        self.total_deposited += other.total_deposited;
        self.max_erosion = self.max_erosion.max(other.max_erosion);
        self.max_deposition = self.max_deposition.max(other.max_deposition);
        self.deposited += other.deposited;
        self.pooled += other.pooled;
        self.evaporated += other.evaporated;
        self.escaped += other.escaped;
        self.spills += other.spills;
        self.exhausted_pools += other.exhausted_pools;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fates_are_counted() {
        let mut stats = ErosionStats::default();
        stats.record(DropFate::Escaped);
        stats.record(DropFate::Escaped);
        stats.record(DropFate::Pooled);
        assert_eq!(stats.drops, 3);
        assert_eq!(stats.escaped, 2);
        assert_eq!(stats.pooled, 1);
    }

    #[test]
    fn test_merge_keeps_maxima() {
        let mut a = ErosionStats {
            max_erosion: 0.5,
            total_eroded: 1.0,
            ..Default::default()
        };
        let b = ErosionStats {
            max_erosion: 0.25,
            total_eroded: 2.0,
            drops: 4,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.max_erosion, 0.5);
        assert_eq!(a.total_eroded, 3.0);
        assert_eq!(a.drops, 4);
    }
}
