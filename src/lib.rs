//! Terrain hydrology library
//!
//! Generates a noise heightfield and evolves it under particle water erosion,
//! standing-water pools and vegetation whose roots hold the soil together.
//! Re-exports modules for use by binaries and tools.

pub mod config;
pub mod erosion;
pub mod error;
pub mod export;
pub mod heightmap;
pub mod logging;
pub mod scheduler;
pub mod seeds;
pub mod smoothing;
pub mod snapshot;
pub mod terrain;
pub mod tilemap;
pub mod vegetation;
pub mod world;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use seeds::WorldSeeds;
pub use snapshot::{HydroPalette, Snapshot};
pub use tilemap::{Dim, Tilemap};
pub use world::{FrameReport, World};
