//! Seed management for world generation
//!
//! Every subsystem that draws random numbers gets its own seed, derived from a
//! master seed. Re-running with the same master seed reproduces the world.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Seeds for all simulation systems.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Noise terrain generation
    pub heightmap: u64,
    /// Drop spawn positions
    pub erosion: u64,
    /// Plant admission, spreading and mortality lotteries
    pub vegetation: u64,
}

impl WorldSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            heightmap: derive_seed(master, "heightmap"),
            erosion: derive_seed(master, "erosion"),
            vegetation: derive_seed(master, "vegetation"),
        }
    }

    /// Noise seed for the terrain generator. The noise crate takes 32 bits.
    pub fn noise_seed(&self) -> u32 {
        (self.heightmap ^ (self.heightmap >> 32)) as u32
    }
}

/// Seeds derived from a random master seed.
impl Default for WorldSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Derive a sub-seed from a master seed and a system name.
fn derive_seed(master: u64, system: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    system.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for WorldSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorldSeeds {{ master: {}, heightmap: {}, erosion: {}, vegetation: {} }}",
            self.master, self.heightmap, self.erosion, self.vegetation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        let seeds1 = WorldSeeds::from_master(12345);
        let seeds2 = WorldSeeds::from_master(12345);
        assert_eq!(seeds1, seeds2);
    }

    #[test]
    fn test_different_systems_get_different_seeds() {
        let seeds = WorldSeeds::from_master(12345);
        assert_ne!(seeds.heightmap, seeds.erosion);
        assert_ne!(seeds.erosion, seeds.vegetation);
    }

    #[test]
    fn test_random_default_is_derived_from_master() {
        let seeds = WorldSeeds::default();
        assert_eq!(seeds, WorldSeeds::from_master(seeds.master));
    }
}
