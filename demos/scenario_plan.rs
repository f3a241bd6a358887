//! Rehearse the built-in scenario against the in-memory device

use device_vision::{MockDevice, ScenarioConfig, run_harness};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ScenarioConfig {
        capture_dir: PathBuf::from("./demo_screenshots"),
        reference_dir: PathBuf::from("./demo_screenshots/reference"),
        ..ScenarioConfig::default()
    };

    let mut device = MockDevice::new(1080, 1920);
    let report = run_harness(&mut device, &config)?;

    for checkpoint in &report.checkpoints {
        println!("  {} -> {:?}", checkpoint.filename, checkpoint.verdict);
    }
    println!("{}", report.summary);
    println!("\nTo run against a device:");
    println!("cargo run -- run --config scenarios/alarm_morning.toml");

    Ok(())
}
