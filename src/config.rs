//! Simulation configuration.
//!
//! Every parameter group has defaults, so a JSON config file only needs the
//! fields it changes:
//!
//! ```json
//! { "width": 128, "erosion": { "erosion_rate": 0.5 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::erosion::{ErosionParams, ErosionPreset};
use crate::error::{Result, SimError};
use crate::heightmap::TerrainParams;
use crate::scheduler::SchedulerParams;
use crate::smoothing::SmoothingParams;
use crate::snapshot::HydroPalette;
use crate::tilemap::Dim;
use crate::vegetation::VegetationParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Vertical scale applied to heights for normals
    pub scale: f64,
    pub terrain: TerrainParams,
    pub erosion: ErosionParams,
    pub vegetation: VegetationParams,
    pub smoothing: SmoothingParams,
    pub scheduler: SchedulerParams,
    pub hydro: HydroPalette,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            scale: 80.0,
            terrain: TerrainParams::default(),
            erosion: ErosionParams::default(),
            vegetation: VegetationParams::default(),
            smoothing: SmoothingParams::default(),
            scheduler: SchedulerParams::default(),
            hydro: HydroPalette::default(),
        }
    }
}

impl SimConfig {
    /// Default configuration with the given erosion preset.
    pub fn with_preset(preset: ErosionPreset) -> Self {
        Self {
            erosion: ErosionParams::from_preset(preset),
            ..Default::default()
        }
    }

    pub fn dim(&self) -> Dim {
        Dim::new(self.width, self.height)
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every parameter group.
    pub fn validate(&self) -> Result<()> {
        if self.dim().is_empty() {
            return Err(SimError::InvalidDimensions(self.dim()));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(SimError::invalid("scale", "must be positive"));
        }
        self.terrain.validate()?;
        self.erosion.validate()?;
        self.vegetation.validate()?;
        self.smoothing.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }
}
