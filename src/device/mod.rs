//! Device channel abstraction for driving a phone or emulator.
//!
//! This module provides a unified interface for the actions a scenario needs:
//! - `AdbDevice` drives a real device or emulator through the `adb` tool
//! - `MockDevice` records actions in memory and serves canned screens (testing and dry runs)

pub mod adb;
pub mod mock;

use image::RgbImage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use adb::AdbDevice;
pub use mock::{DeviceAction, FailPoint, MockDevice, MockScreen};

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Connection-class failures. Any of these aborts a run.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device answered, or it is not in the `device` state
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// Package installation failed
    #[error("Failed to install {path}: {reason}")]
    Install { path: PathBuf, reason: String },

    /// A device command exited unsuccessfully or reported an error
    #[error("Command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    /// The screen could not be captured or decoded
    #[error("Screen capture failed: {0}")]
    Capture(String),

    /// Spawning the device tool failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for device channels
///
/// A channel is an already-connected handle; constructing one is the
/// connection step. Every method blocks until the device has accepted the
/// action.
pub trait DeviceChannel {
    /// Install (or reinstall) an application package
    fn install(&mut self, apk_path: &Path) -> DeviceResult<()>;

    /// Start an application component given as `package/activity`
    fn start_activity(&mut self, component: &str) -> DeviceResult<()>;

    /// Simulate a tap (down and up) at pixel coordinates
    fn touch(&mut self, x: i32, y: i32) -> DeviceResult<()>;

    /// Block the calling thread while the UI settles
    fn sleep(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }

    /// Capture the full screen
    fn capture_screen(&mut self) -> DeviceResult<RgbImage>;

    /// Get the source type identifier (e.g., "adb", "mock")
    fn source_type(&self) -> &str;
}
