//! Device Vision - screenshot regression testing for Android apps.
//!
//! This crate provides:
//! - A device channel abstraction with an `adb` implementation and an in-memory mock
//! - Scripted scenarios of activity launches, touches, waits and checkpoints
//! - Deterministically named captures compared against reference images
//! - Per-run aggregation of verdicts into a pass/fail summary
//!
//! # Example
//!
//! ```rust,no_run
//! use device_vision::{AdbDevice, ScenarioConfig, run_harness};
//! use std::time::Duration;
//!
//! let config = ScenarioConfig::load("scenarios/alarm_morning.toml".as_ref()).unwrap();
//! let mut device = AdbDevice::connect("adb", None, Duration::from_secs(30)).unwrap();
//! let report = run_harness(&mut device, &config).unwrap();
//! println!("{}", report.summary);
//! ```

pub mod config;
pub mod device;
pub mod harness;
pub mod results;
pub mod scenario;
pub mod snapshot;

// Re-export configuration
pub use config::{Point, ScenarioConfig};

// Re-export device channels
pub use device::{AdbDevice, DeviceChannel, DeviceError, DeviceResult, MockDevice, MockScreen};

// Re-export harness entry point and errors
pub use harness::{HarnessError, HarnessResult, run_harness};

// Re-export result types
pub use results::{CheckpointResult, ResultAggregator, RunReport, RunSummary, Verdict};

// Re-export scenario types
pub use scenario::{Scenario, ScenarioRunner, Step};

// Re-export snapshot types
pub use snapshot::{
    DEFAULT_TOLERANCE, ImageStore, ScreenshotRecorder, SnapshotConfig, SnapshotError,
    checkpoint_filename, similarity,
};
