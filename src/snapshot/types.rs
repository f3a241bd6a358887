// Core types for capture persistence and comparison

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use super::compare::DEFAULT_TOLERANCE;

/// Where captures go, where baselines live, and how close is close enough
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory where captures are written
    pub capture_dir: PathBuf,

    /// Directory holding approved reference images
    pub reference_dir: PathBuf,

    /// Minimum similarity (0.0-1.0, inclusive) for a capture to match
    pub tolerance: f64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            capture_dir: PathBuf::from("./screenshots"),
            reference_dir: PathBuf::from("./screenshots/reference"),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Unrecoverable capture persistence failures
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The capture could not be written to disk
    #[error("Failed to write capture {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
