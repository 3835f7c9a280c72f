//! Error types for world setup and export.
//!
//! The simulation itself never fails: degenerate drops end in a terminal
//! state and out-of-range queries clamp. Errors only come from invalid
//! configuration and from file I/O.

use std::path::PathBuf;

use thiserror::Error;

use crate::tilemap::Dim;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("grid dimensions must be positive, got {0}")]
    InvalidDimensions(Dim),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to read config {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write image {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
