//! Erosion simulation parameters and configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Erosion intensity preset
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ErosionPreset {
    /// Slow carving, long-lived drops
    Gentle,
    /// Balanced erosion
    #[default]
    Normal,
    /// Deep channels and fast lake formation
    Dramatic,
}

impl ErosionPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Gentle, Self::Normal, Self::Dramatic]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Gentle => "Slow carving, long-lived drops",
            Self::Normal => "Balanced erosion",
            Self::Dramatic => "Deep channels and fast lake formation",
        }
    }
}

impl std::fmt::Display for ErosionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gentle => write!(f, "gentle"),
            Self::Normal => write!(f, "normal"),
            Self::Dramatic => write!(f, "dramatic"),
        }
    }
}

/// Water-drop erosion and pool resolution parameters.
///
/// Heights are in normalized units (the generator produces `[0, 1]`), so the
/// defaults are tuned for that range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    // =========================================================================
    // Drop Motion
    // =========================================================================

    /// Weight of the previous direction against the downhill gradient (0.0-1.0)
    pub inertia: f64,

    /// Distance travelled per step, in cells
    pub step_length: f64,

    /// Blended direction length below which a drop counts as stalled
    pub min_direction: f64,

    /// Acceleration gained per unit of height dropped
    pub gravity: f64,

    /// Fraction of speed lost per step
    pub friction: f64,

    /// Initial water volume for each drop
    pub initial_volume: f64,

    /// Fraction of volume evaporated per step (0.0-1.0)
    pub evaporation: f64,

    /// Volume below which a drop has evaporated
    pub min_volume: f64,

    /// Maximum path length (steps) per drop segment
    pub max_steps: usize,

    // =========================================================================
    // Sediment Transport
    // =========================================================================

    /// Sediment capacity multiplier
    pub capacity_factor: f64,

    /// Smallest slope used in the capacity formula, so flat runs still carry
    pub min_slope: f64,

    /// Fraction of the capacity gap eroded per step (0.0-1.0)
    pub erosion_rate: f64,

    /// Fraction of the excess sediment deposited per step (0.0-1.0)
    pub deposition_rate: f64,

    /// Radius of the erosion brush, in cells
    pub erosion_radius: usize,

    /// How strongly root density resists erosion
    pub root_resistance: f64,

    /// Blend factor folding a batch's flow track into `waterpath`
    pub path_decay: f64,

    // =========================================================================
    // Pools
    // =========================================================================

    /// Drop volume needed to raise one cell of standing water by one height unit
    pub volume_factor: f64,

    /// How many times a drop may spill out of a basin and flow on
    pub max_spills: usize,

    /// Largest basin a single drop may flood
    pub max_pool_cells: usize,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            inertia: 0.05,
            step_length: 1.0,
            min_direction: 1e-6,
            gravity: 4.0,
            friction: 0.05,
            initial_volume: 1.0,
            evaporation: 0.01,
            min_volume: 0.01,
            max_steps: 512,

            capacity_factor: 4.0,
            min_slope: 0.01,
            erosion_rate: 0.3,
            deposition_rate: 0.3,
            erosion_radius: 2,
            root_resistance: 0.25,
            path_decay: 0.01,

            volume_factor: 100.0,
            max_spills: 5,
            max_pool_cells: 4096,
        }
    }
}

impl ErosionParams {
    /// Create parameters from a preset
    pub fn from_preset(preset: ErosionPreset) -> Self {
        match preset {
            ErosionPreset::Gentle => Self {
                erosion_rate: 0.1,
                deposition_rate: 0.2,
                evaporation: 0.005,
                ..Default::default()
            },
            ErosionPreset::Normal => Self::default(),
            ErosionPreset::Dramatic => Self {
                erosion_rate: 0.5,
                capacity_factor: 8.0,
                volume_factor: 50.0,
                ..Default::default()
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &'static str, v: f64| {
            if (0.0..1.0).contains(&v) {
                Ok(())
            } else {
                Err(SimError::invalid(name, format!("{v} is outside [0, 1)")))
            }
        };
        let positive = |name: &'static str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SimError::invalid(name, format!("{v} must be positive")))
            }
        };

        unit("erosion.inertia", self.inertia)?;
        unit("erosion.friction", self.friction)?;
        unit("erosion.evaporation", self.evaporation)?;
        unit("erosion.path_decay", self.path_decay)?;
        positive("erosion.erosion_rate", self.erosion_rate)?;
        positive("erosion.deposition_rate", self.deposition_rate)?;
        positive("erosion.step_length", self.step_length)?;
        positive("erosion.min_volume", self.min_volume)?;
        positive("erosion.initial_volume", self.initial_volume)?;
        positive("erosion.volume_factor", self.volume_factor)?;
        positive("erosion.capacity_factor", self.capacity_factor)?;

        if self.gravity < 0.0 || self.min_slope < 0.0 || self.root_resistance < 0.0 {
            return Err(SimError::invalid(
                "erosion",
                "gravity, min_slope and root_resistance must not be negative",
            ));
        }
        if self.max_steps == 0 {
            return Err(SimError::invalid("erosion.max_steps", "must be at least 1"));
        }
        if self.max_pool_cells == 0 {
            return Err(SimError::invalid("erosion.max_pool_cells", "must be at least 1"));
        }
        Ok(())
    }
}
