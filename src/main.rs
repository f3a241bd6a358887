use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use device_vision::config::validate_tolerance;
use device_vision::device::{AdbDevice, DeviceChannel, MockDevice, MockScreen};
use device_vision::results::{RunReport, Verdict};
use device_vision::scenario::Scenario;
use device_vision::snapshot::{DEFAULT_TOLERANCE, similarity};
use device_vision::{ScenarioConfig, run_harness};

/// Exit status when at least one capture failed comparison
const EXIT_FAILED_COMPARISON: u8 = 1;

/// Exit status when the run aborted
const EXIT_FATAL: u8 = 2;

/// Device Vision - screenshot regression testing for Android apps
#[derive(Parser, Debug)]
#[command(
    name = "device-vision",
    about = "Drive an Android device through a scripted scenario and compare screenshots against references",
    after_help = "ENVIRONMENT VARIABLES:\n\
        DEVICE_VISION_ADB              Path to the adb executable\n\
        DEVICE_VISION_SERIAL           Serial of the target device\n\
        DEVICE_VISION_CONNECT_TIMEOUT  Seconds to wait for the device (default: 30)\n\
        DEVICE_VISION_SETTLE_DELAY     Settle delay override (seconds)\n\
        DEVICE_VISION_TOLERANCE        Similarity tolerance override\n\
        RUST_LOG                       Log filter (default: info)"
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scenario and compare every checkpoint against its reference
    Run {
        /// Scenario file (TOML); built-in defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the capture directory
        #[arg(long)]
        capture_dir: Option<PathBuf>,

        /// Override the reference directory
        #[arg(long)]
        reference_dir: Option<PathBuf>,

        /// Override the settle delay (seconds)
        #[arg(long)]
        settle_delay: Option<f64>,

        /// Override the similarity tolerance (0.0-1.0)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Rehearse the scenario against an in-memory device instead of adb
        #[arg(long)]
        dry_run: bool,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the steps the scenario would execute
    Plan {
        /// Scenario file (TOML); built-in defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Compare two images the same way checkpoints are compared
    Compare {
        /// Captured image
        capture: PathBuf,

        /// Reference image
        reference: PathBuf,

        /// Similarity tolerance (0.0-1.0)
        #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    match execute(args.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn execute(command: Commands) -> Result<ExitCode, Box<dyn Error>> {
    match command {
        Commands::Run {
            config,
            capture_dir,
            reference_dir,
            settle_delay,
            tolerance,
            dry_run,
            json,
        } => {
            let mut scenario_config = load_config(config.as_ref())?;
            if let Some(dir) = capture_dir {
                scenario_config.capture_dir = dir;
            }
            if let Some(dir) = reference_dir {
                scenario_config.reference_dir = dir;
            }
            if let Some(delay) = settle_delay {
                scenario_config.settle_delay_secs = delay;
            }
            if let Some(tolerance) = tolerance {
                scenario_config.tolerance = tolerance;
            }
            scenario_config.validate()?;

            let mut device: Box<dyn DeviceChannel> = if dry_run {
                let mut screen = MockScreen::with_color(1080, 1920, [32, 32, 32]);
                screen.draw_text(16, 16, "device-vision dry run", [255, 255, 255], [32, 32, 32]);
                Box::new(MockDevice::with_screen(screen))
            } else {
                let env = device_vision::config::get();
                info!("Connecting to device...");
                Box::new(AdbDevice::connect(
                    &env.adb_path,
                    env.serial.clone(),
                    env.connect_timeout(),
                )?)
            };

            let report = run_harness(device.as_mut(), &scenario_config)?;
            print_report(&report, json)?;

            if report.summary.passed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_FAILED_COMPARISON))
            }
        }

        Commands::Plan { config } => {
            let scenario_config = load_config(config.as_ref())?;
            scenario_config.validate()?;
            let scenario = Scenario::from_config(&scenario_config);

            println!("Install: {}", scenario.apk_path.display());
            for (idx, step) in scenario.steps.iter().enumerate() {
                let settle = if step.is_ui_mutating() {
                    format!(" (+{:?} settle)", scenario.settle_delay)
                } else {
                    String::new()
                };
                println!("  {:>2}. {}{}", idx + 1, step, settle);
            }
            println!("Capture dir:   {}", scenario_config.capture_dir.display());
            println!("Reference dir: {}", scenario_config.reference_dir.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Compare {
            capture,
            reference,
            tolerance,
        } => {
            validate_tolerance(tolerance)?;
            let a = image::open(&capture)?.to_rgb8();
            let b = image::open(&reference)?.to_rgb8();
            let score = similarity(&a, &b);
            let verdict = Verdict::classify(score, tolerance);

            println!("Similarity: {:.4} (tolerance {})", score, tolerance);
            println!("Verdict: {:?}", verdict);
            if verdict.is_failure() {
                Ok(ExitCode::from(EXIT_FAILED_COMPARISON))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Scenario file (or built-in defaults) with environment overrides applied
fn load_config(path: Option<&PathBuf>) -> Result<ScenarioConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    config.apply_env(device_vision::config::get());
    Ok(config)
}

fn print_report(report: &RunReport, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for checkpoint in &report.checkpoints {
        let score = checkpoint
            .similarity
            .map(|s| format!(" (similarity {:.4})", s))
            .unwrap_or_default();
        println!("  {} {:?}{}", checkpoint.filename, checkpoint.verdict, score);
    }
    println!("{}", report.summary);
    Ok(())
}
