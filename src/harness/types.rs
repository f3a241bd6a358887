use thiserror::Error;

use crate::device::DeviceError;
use crate::snapshot::SnapshotError;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fatal errors. Any of these aborts a run; verification failures are not errors.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The device channel failed (connection drop, install failure, ...)
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// A capture could not be persisted
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Invalid or unreadable scenario configuration
    #[error("Config error: {0}")]
    Config(String),
}
