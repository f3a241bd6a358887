use tracing::info;

use crate::config::ScenarioConfig;
use crate::device::DeviceChannel;
use crate::harness::types::HarnessResult;
use crate::results::RunReport;
use crate::scenario::{Scenario, ScenarioRunner};
use crate::snapshot::{ImageStore, ScreenshotRecorder};

/// Runs the configured scenario once against an already-connected device.
///
/// Every call builds a fresh recorder and aggregator, so numbering restarts
/// at 01 and counts never leak between runs.
pub fn run_harness(
    device: &mut dyn DeviceChannel,
    config: &ScenarioConfig,
) -> HarnessResult<RunReport> {
    config.validate()?;

    let snapshot_config = config.snapshot_config();
    let store = ImageStore::from_config(&snapshot_config);
    info!(
        source = device.source_type(),
        capture_dir = %store.capture_dir().display(),
        reference_dir = %store.reference_dir().display(),
        "starting scenario"
    );

    let recorder = ScreenshotRecorder::new(store, snapshot_config.tolerance);
    let scenario = Scenario::from_config(config);
    ScenarioRunner::new(recorder).run(device, &scenario)
}
