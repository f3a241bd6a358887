//! `adb`-backed device channel.

use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{DeviceChannel, DeviceError, DeviceResult};

/// How often a pending `wait-for-device` is polled
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Device channel that shells out to the Android Debug Bridge
#[derive(Debug, Clone)]
pub struct AdbDevice {
    /// Path to the `adb` executable
    adb_path: PathBuf,
    /// Serial of the target device (None = the only attached device)
    serial: Option<String>,
}

impl AdbDevice {
    /// Return a handle to an online device, waiting at most `timeout` for one.
    ///
    /// The state is checked first; `adb wait-for-device` is only started when
    /// the device is not ready yet, and is killed once the timeout elapses.
    pub fn connect(
        adb_path: impl Into<PathBuf>,
        serial: Option<String>,
        timeout: Duration,
    ) -> DeviceResult<Self> {
        let device = Self {
            adb_path: adb_path.into(),
            serial,
        };

        if matches!(device.state().as_deref(), Ok("device")) {
            return Ok(device);
        }

        info!(timeout = ?timeout, "Waiting for device...");
        device.wait_for_device(timeout)?;

        let state = device.state()?;
        if state != "device" {
            return Err(DeviceError::Unreachable(format!(
                "device is in state '{}'",
                state
            )));
        }

        Ok(device)
    }

    /// Current state as reported by `adb get-state`
    fn state(&self) -> DeviceResult<String> {
        let stdout = self
            .run(&["get-state"])
            .map_err(|e| DeviceError::Unreachable(e.to_string()))?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Run `adb wait-for-device`, killing it if it outlives `timeout`
    fn wait_for_device(&self, timeout: Duration) -> DeviceResult<()> {
        let full = self.command_args(&["wait-for-device"]);
        debug!(adb = %self.adb_path.display(), args = ?full, "running adb");

        let mut child = Command::new(&self.adb_path)
            .args(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                DeviceError::Unreachable(format!(
                    "failed to run {}: {}",
                    self.adb_path.display(),
                    e
                ))
            })?;

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(DeviceError::Unreachable(format!(
                        "adb wait-for-device exited with {}",
                        status
                    )));
                }
                Ok(None) => {}
                Err(e) => return Err(DeviceError::Unreachable(e.to_string())),
            }

            if start.elapsed() >= timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(DeviceError::Unreachable(format!(
                    "no device came online within {:?}",
                    timeout
                )));
            }

            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    /// Full argument list for an adb invocation, including the serial selector
    fn command_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s");
            full.push(serial.as_str());
        }
        full.extend_from_slice(args);
        full
    }

    /// Run adb with the given arguments and return stdout
    fn run(&self, args: &[&str]) -> DeviceResult<Vec<u8>> {
        let full = self.command_args(args);
        debug!(adb = %self.adb_path.display(), args = ?full, "running adb");

        let output: Output = Command::new(&self.adb_path).args(&full).output()?;
        if !output.status.success() {
            return Err(DeviceError::Command {
                command: format!("adb {}", full.join(" ")),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Run an `adb shell` command and fail if the tool printed an error
    fn shell(&self, args: &[&str]) -> DeviceResult<()> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);
        let stdout = self.run(&full)?;
        let text = String::from_utf8_lossy(&stdout);
        if let Some(line) = text.lines().find(|l| l.contains("Error")) {
            return Err(DeviceError::Command {
                command: format!("adb {}", full.join(" ")),
                reason: line.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl DeviceChannel for AdbDevice {
    fn install(&mut self, apk_path: &Path) -> DeviceResult<()> {
        if !apk_path.is_file() {
            return Err(DeviceError::Install {
                path: apk_path.to_path_buf(),
                reason: "package file not found".to_string(),
            });
        }

        let path = apk_path.to_string_lossy().into_owned();
        let stdout = self
            .run(&["install", "-r", path.as_str()])
            .map_err(|e| DeviceError::Install {
                path: apk_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let text = String::from_utf8_lossy(&stdout);
        if !text.contains("Success") {
            return Err(DeviceError::Install {
                path: apk_path.to_path_buf(),
                reason: text.trim().to_string(),
            });
        }
        Ok(())
    }

    fn start_activity(&mut self, component: &str) -> DeviceResult<()> {
        self.shell(&["am", "start", "-n", component])
    }

    fn touch(&mut self, x: i32, y: i32) -> DeviceResult<()> {
        let (x, y) = (x.to_string(), y.to_string());
        self.shell(&["input", "tap", x.as_str(), y.as_str()])
    }

    fn capture_screen(&mut self) -> DeviceResult<RgbImage> {
        let png = self.run(&["exec-out", "screencap", "-p"])?;
        let img = image::load_from_memory(&png)
            .map_err(|e| DeviceError::Capture(format!("Failed to decode screencap: {}", e)))?;
        Ok(img.to_rgb8())
    }

    fn source_type(&self) -> &str {
        "adb"
    }
}
