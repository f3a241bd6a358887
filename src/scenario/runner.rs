use tracing::info;

use super::{Scenario, Step};
use crate::config::seconds_to_duration;
use crate::device::DeviceChannel;
use crate::harness::HarnessResult;
use crate::results::{ResultAggregator, RunReport};
use crate::snapshot::ScreenshotRecorder;

/// Executes a scenario once against a device.
///
/// Owns the recorder (sequence counter) and the aggregator (tallies) for a
/// single run; nothing is shared across runners.
pub struct ScenarioRunner {
    recorder: ScreenshotRecorder,
    results: ResultAggregator,
}

impl ScenarioRunner {
    pub fn new(recorder: ScreenshotRecorder) -> Self {
        Self {
            recorder,
            results: ResultAggregator::new(),
        }
    }

    /// Install the package, then run every step in order.
    ///
    /// Steps are validated before the device is touched, so a malformed
    /// scenario fails without side effects.
    ///
    /// Each start_activity and touch is followed by the settle delay. A failed
    /// comparison is recorded and the run continues; a device or capture-write
    /// error ends the run immediately.
    pub fn run(
        mut self,
        device: &mut dyn DeviceChannel,
        scenario: &Scenario,
    ) -> HarnessResult<RunReport> {
        for step in &scenario.steps {
            step.validate()?;
        }

        info!(apk = %scenario.apk_path.display(), "Installing package...");
        device.install(&scenario.apk_path)?;

        for step in &scenario.steps {
            info!("{}...", step);
            match step {
                Step::StartActivity { activity, .. } => {
                    device.start_activity(&scenario.component(activity))?;
                }
                Step::Touch { x, y, .. } => device.touch(*x, *y)?,
                Step::Wait { seconds } => {
                    device.sleep(seconds_to_duration(*seconds, "wait seconds")?);
                }
                Step::Checkpoint { title } => {
                    let result = self.recorder.capture(device, title)?;
                    self.results.record(result);
                }
            }

            if step.is_ui_mutating() {
                device.sleep(scenario.settle_delay);
            }
        }

        let report = self.results.into_report();
        info!(
            total = report.summary.total_captures,
            failed = report.summary.failed_captures,
            "scenario finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Point, ScenarioConfig};
    use crate::device::{DeviceAction, MockDevice};
    use crate::harness::HarnessError;
    use crate::snapshot::{DEFAULT_TOLERANCE, ImageStore};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::time::Duration;

    fn runner_in(root: &std::path::Path) -> ScenarioRunner {
        let store = ImageStore::new(root.join("captures"), root.join("reference"));
        ScenarioRunner::new(ScreenshotRecorder::new(store, DEFAULT_TOLERANCE))
    }

    #[test]
    fn test_settle_follows_every_ui_action() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = Scenario {
            apk_path: PathBuf::from("app.apk"),
            package: "org.example".to_string(),
            settle_delay: Duration::from_secs(2),
            steps: vec![
                Step::start_activity("org.example.Main", "Main"),
                Step::checkpoint("main"),
                Step::touch(Point::new(5, 6), "Tap"),
                Step::Wait { seconds: 0.25 },
                Step::checkpoint("after_tap"),
            ],
        };
        let mut device = MockDevice::new(4, 4);

        runner_in(dir.path()).run(&mut device, &scenario).unwrap();

        assert_eq!(
            device.actions(),
            &[
                DeviceAction::Install(PathBuf::from("app.apk")),
                DeviceAction::StartActivity("org.example/org.example.Main".to_string()),
                DeviceAction::Sleep(Duration::from_secs(2)),
                DeviceAction::Capture,
                DeviceAction::Touch(5, 6),
                DeviceAction::Sleep(Duration::from_secs(2)),
                DeviceAction::Sleep(Duration::from_millis(250)),
                DeviceAction::Capture,
            ]
        );
    }

    #[test]
    fn test_unrepresentable_wait_rejected_before_install() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = Scenario {
            apk_path: PathBuf::from("app.apk"),
            package: "org.example".to_string(),
            settle_delay: Duration::ZERO,
            steps: vec![Step::checkpoint("main"), Step::Wait { seconds: 1e30 }],
        };
        let mut device = MockDevice::new(4, 4);

        let err = runner_in(dir.path()).run(&mut device, &scenario).unwrap_err();

        assert!(matches!(err, HarnessError::Config(_)));
        assert!(device.actions().is_empty());
    }

    #[test]
    fn test_builtin_scenario_counts_five_captures() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = Scenario::from_config(&ScenarioConfig::default());
        let mut device = MockDevice::new(4, 4);

        let report = runner_in(dir.path()).run(&mut device, &scenario).unwrap();

        assert_eq!(report.summary.total_captures, 5);
        // No references exist, so every capture fails
        assert_eq!(report.summary.failed_captures, 5);
        let captures = device
            .actions()
            .iter()
            .filter(|a| **a == DeviceAction::Capture)
            .count();
        assert_eq!(captures, 5);
    }
}
