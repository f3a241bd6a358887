//! Configuration management with environment variable and file support.
//!
//! Two layers:
//! - Environment variables for how to reach the device and for overriding the
//!   settle delay and tolerance (cached on first access)
//! - A TOML scenario file describing what to run: package, activities,
//!   touch coordinates, directories, settle delay and tolerance
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DEVICE_VISION_ADB` | Path to the `adb` executable | `adb` |
//! | `DEVICE_VISION_SERIAL` | Serial of the target device | (only attached device) |
//! | `DEVICE_VISION_CONNECT_TIMEOUT` | Seconds to wait for the device | `30` |
//! | `DEVICE_VISION_SETTLE_DELAY` | Settle delay override (seconds) | from scenario file |
//! | `DEVICE_VISION_TOLERANCE` | Similarity tolerance override | from scenario file |
//!
//! # Scenario file
//!
//! Relative paths in the file are resolved against the file's own directory.
//!
//! ```toml
//! apk_path = "../../app/build/outputs/apk/app-debug.apk"
//! package = "cz.jaro.alarmmorning"
//! capture_dir = "../screenshots"
//! reference_dir = "../screenshots/v0.21"
//! settle_delay_secs = 5.0
//! tolerance = 0.9
//!
//! [touches]
//! menu = { x = 80, y = 150 }
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::harness::{HarnessError, HarnessResult};
use crate::scenario::Step;
use crate::snapshot::{DEFAULT_TOLERANCE, SnapshotConfig};

// ============================================================================
// Default Values
// ============================================================================

/// Default adb executable (looked up on PATH)
pub const DEFAULT_ADB_PATH: &str = "adb";

/// Default settle delay after UI-mutating actions (seconds)
pub const DEFAULT_SETTLE_DELAY_SECS: f64 = 5.0;

/// Default application package
pub const DEFAULT_APK_PATH: &str = "app/build/outputs/apk/app-debug.apk";

/// Default package identifier
pub const DEFAULT_PACKAGE: &str = "cz.jaro.alarmmorning";

/// Default capture directory
pub const DEFAULT_CAPTURE_DIR: &str = "artifact/screenshots";

/// Default reference directory
pub const DEFAULT_REFERENCE_DIR: &str = "artifact/screenshots/v0.21";

/// Default time to wait for a device to come online (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 30;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the adb executable
pub const ENV_ADB_PATH: &str = "DEVICE_VISION_ADB";

/// Environment variable for the device serial
pub const ENV_SERIAL: &str = "DEVICE_VISION_SERIAL";

/// Environment variable for the settle delay override
pub const ENV_SETTLE_DELAY: &str = "DEVICE_VISION_SETTLE_DELAY";

/// Environment variable for the tolerance override
pub const ENV_TOLERANCE: &str = "DEVICE_VISION_TOLERANCE";

/// Environment variable for the device connection timeout
pub const ENV_CONNECT_TIMEOUT: &str = "DEVICE_VISION_CONNECT_TIMEOUT";

// ============================================================================
// Environment layer (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Device connection settings and scenario overrides from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the `adb` executable
    pub adb_path: PathBuf,
    /// Serial of the target device
    pub serial: Option<String>,
    /// How long to wait for the device to come online (seconds)
    pub connect_timeout: u64,
    /// Replaces the scenario file's settle delay when set
    pub settle_delay_secs: Option<f64>,
    /// Replaces the scenario file's tolerance when set
    pub tolerance: Option<f64>,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            adb_path: env::var(ENV_ADB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_ADB_PATH)),
            serial: env::var(ENV_SERIAL).ok().filter(|s| !s.is_empty()),
            connect_timeout: env::var(ENV_CONNECT_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            settle_delay_secs: env::var(ENV_SETTLE_DELAY)
                .ok()
                .and_then(|s| s.parse().ok()),
            tolerance: env::var(ENV_TOLERANCE).ok().and_then(|s| s.parse().ok()),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            adb_path: PathBuf::from(DEFAULT_ADB_PATH),
            serial: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            settle_delay_secs: None,
            tolerance: None,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check that a similarity tolerance lies within 0.0-1.0
pub fn validate_tolerance(tolerance: f64) -> HarnessResult<()> {
    if !(0.0..=1.0).contains(&tolerance) {
        return Err(HarnessError::Config(format!(
            "tolerance must be within 0.0-1.0, got {}",
            tolerance
        )));
    }
    Ok(())
}

/// Convert a non-negative number of seconds into a `Duration`
///
/// Negative, non-finite and unrepresentably large values are config errors.
pub fn seconds_to_duration(seconds: f64, field: &str) -> HarnessResult<Duration> {
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        HarnessError::Config(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, seconds
        ))
    })
}

// ============================================================================
// Scenario file
// ============================================================================

/// Pixel coordinates of a touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Fully-qualified activity names launched directly by the built-in scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Activities {
    pub calendar: String,
    pub ring: String,
}

impl Default for Activities {
    fn default() -> Self {
        Self {
            calendar: "cz.jaro.alarmmorning.AlarmMorningActivity".to_string(),
            ring: "cz.jaro.alarmmorning.RingActivity".to_string(),
        }
    }
}

/// Touch coordinates used by the built-in scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Touches {
    /// Opens the navigation menu
    pub menu: Point,
    /// Menu item for the defaults screen
    pub defaults: Point,
    /// Menu item for the settings screen
    pub settings: Point,
    /// Returns from a secondary screen
    pub back: Point,
    /// Dismisses the ring screen
    pub dismiss: Point,
}

impl Default for Touches {
    fn default() -> Self {
        Self {
            menu: Point::new(80, 150),
            defaults: Point::new(80, 430),
            settings: Point::new(80, 580),
            back: Point::new(80, 150),
            dismiss: Point::new(540, 1700),
        }
    }
}

/// Everything a run needs besides the device itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Application package to install before the scenario
    pub apk_path: PathBuf,

    /// Package identifier (the part before `/` in component names)
    pub package: String,

    /// Directory where captures are written
    pub capture_dir: PathBuf,

    /// Directory holding approved reference images
    pub reference_dir: PathBuf,

    /// Fixed wait after every UI-mutating action (seconds)
    pub settle_delay_secs: f64,

    /// Minimum similarity for a match (inclusive)
    pub tolerance: f64,

    pub activities: Activities,

    pub touches: Touches,

    /// Explicit step list; the built-in scenario is used when absent
    pub steps: Option<Vec<Step>>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            apk_path: PathBuf::from(DEFAULT_APK_PATH),
            package: DEFAULT_PACKAGE.to_string(),
            capture_dir: PathBuf::from(DEFAULT_CAPTURE_DIR),
            reference_dir: PathBuf::from(DEFAULT_REFERENCE_DIR),
            settle_delay_secs: DEFAULT_SETTLE_DELAY_SECS,
            tolerance: DEFAULT_TOLERANCE,
            activities: Activities::default(),
            touches: Touches::default(),
            steps: None,
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario file, resolving relative paths against its directory
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_relative_to(base);
        Ok(config)
    }

    /// Parse and validate scenario TOML (paths are left as written)
    pub fn parse(text: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| HarnessError::Config(format!("Invalid scenario file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Make relative paths relative to `base` instead of the working directory
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.apk_path,
            &mut self.capture_dir,
            &mut self.reference_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Check invariants the runner relies on
    pub fn validate(&self) -> HarnessResult<()> {
        validate_tolerance(self.tolerance)?;
        seconds_to_duration(self.settle_delay_secs, "settle_delay_secs")?;
        if self.package.trim().is_empty() {
            return Err(HarnessError::Config("package must not be empty".to_string()));
        }
        if let Some(steps) = &self.steps {
            if steps.is_empty() {
                return Err(HarnessError::Config("steps must not be empty".to_string()));
            }
            for step in steps {
                step.validate()?;
            }
        }
        Ok(())
    }

    /// Apply the settle delay and tolerance overrides from the environment
    pub fn apply_env(&mut self, env: &Config) {
        if let Some(delay) = env.settle_delay_secs {
            self.settle_delay_secs = delay;
        }
        if let Some(tolerance) = env.tolerance {
            self.tolerance = tolerance;
        }
    }

    /// Settle delay as a `Duration`. Saturates on values `validate` rejects.
    pub fn settle_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.settle_delay_secs).unwrap_or(Duration::MAX)
    }

    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig {
            capture_dir: self.capture_dir.clone(),
            reference_dir: self.reference_dir.clone(),
            tolerance: self.tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.adb_path, PathBuf::from(DEFAULT_ADB_PATH));
        assert_eq!(config.serial, None);
        assert_eq!(config.connect_timeout(), Duration::from_secs(DEFAULT_CONNECT_TIMEOUT));
        assert_eq!(config.settle_delay_secs, None);
    }

    #[test]
    fn test_scenario_defaults() {
        let config = ScenarioConfig::default();
        assert_eq!(config.package, "cz.jaro.alarmmorning");
        assert_eq!(config.tolerance, 0.9);
        assert_eq!(config.settle_delay(), Duration::from_secs(5));
        assert_eq!(config.touches.dismiss, Point::new(540, 1700));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = ScenarioConfig::parse(
            r#"
            package = "org.example.app"
            settle_delay_secs = 0.5

            [touches]
            menu = { x = 10, y = 20 }
            "#,
        )
        .unwrap();

        assert_eq!(config.package, "org.example.app");
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
        assert_eq!(config.touches.menu, Point::new(10, 20));
        // Unspecified fields keep their defaults
        assert_eq!(config.touches.settings, Point::new(80, 580));
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(ScenarioConfig::parse("tolerance = 1.5").is_err());
        assert!(ScenarioConfig::parse("settle_delay_secs = -1.0").is_err());
        assert!(ScenarioConfig::parse("package = \"\"").is_err());
        assert!(ScenarioConfig::parse("unknown_key = 1").is_err());
    }

    #[test]
    fn test_parse_rejects_unrepresentable_delay() {
        let err = ScenarioConfig::parse("settle_delay_secs = 1e30").unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));

        let err = ScenarioConfig::parse(
            r#"
            [[steps]]
            action = "wait"
            seconds = 1e30
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_settle_delay_saturates_instead_of_panicking() {
        let config = ScenarioConfig {
            settle_delay_secs: 1e30,
            ..ScenarioConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.settle_delay(), Duration::MAX);
    }

    #[test]
    fn test_validate_tolerance_range() {
        assert!(validate_tolerance(0.0).is_ok());
        assert!(validate_tolerance(0.9).is_ok());
        assert!(validate_tolerance(1.0).is_ok());
        assert!(validate_tolerance(5.0).is_err());
        assert!(validate_tolerance(-1.0).is_err());
        assert!(validate_tolerance(f64::NAN).is_err());
    }

    #[test]
    fn test_apply_env_overrides() {
        let env = Config {
            settle_delay_secs: Some(0.25),
            tolerance: Some(0.75),
            ..Config::defaults()
        };
        let mut config = ScenarioConfig::default();
        config.apply_env(&env);

        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.tolerance, 0.75);

        let mut untouched = ScenarioConfig::default();
        untouched.apply_env(&Config::defaults());
        assert_eq!(untouched.settle_delay(), Duration::from_secs(5));
        assert_eq!(untouched.tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scenario.toml");
        fs::write(
            &file,
            "capture_dir = \"shots\"\nreference_dir = \"/abs/reference\"\n",
        )
        .unwrap();

        let config = ScenarioConfig::load(&file).unwrap();
        assert_eq!(config.capture_dir, dir.path().join("shots"));
        assert_eq!(config.reference_dir, PathBuf::from("/abs/reference"));
        assert_eq!(config.apk_path, dir.path().join(DEFAULT_APK_PATH));
    }

    #[test]
    fn test_shipped_scenario_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/alarm_morning.toml");
        let config = ScenarioConfig::load(&path).unwrap();
        let defaults = ScenarioConfig::default();

        assert_eq!(config.package, defaults.package);
        assert_eq!(config.activities, defaults.activities);
        assert_eq!(config.touches, defaults.touches);
        assert_eq!(config.tolerance, defaults.tolerance);
        assert!(config.reference_dir.ends_with("artifact/screenshots/v0.21"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScenarioConfig::load(Path::new("/nonexistent/scenario.toml")).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}
