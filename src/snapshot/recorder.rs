//! Screenshot recorder: ordered, named captures classified against baselines.

use tracing::{error, info, warn};

use super::compare::similarity;
use super::store::ImageStore;
use crate::device::DeviceChannel;
use crate::harness::types::HarnessResult;
use crate::results::{CheckpointResult, Verdict};

/// Filename shared by a capture and its reference
pub fn checkpoint_filename(sequence: u32, title: &str) -> String {
    format!("{:02}-{}.png", sequence, title)
}

/// Captures checkpoints for one run.
///
/// The sequence counter belongs to this instance, so two recorders never
/// share numbering. It only moves forward.
#[derive(Debug)]
pub struct ScreenshotRecorder {
    store: ImageStore,
    tolerance: f64,
    sequence: u32,
}

impl ScreenshotRecorder {
    pub fn new(store: ImageStore, tolerance: f64) -> Self {
        Self {
            store,
            tolerance,
            sequence: 0,
        }
    }

    /// Number of captures taken so far
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Capture the screen, persist it and classify it against its reference.
    ///
    /// Only device and capture-write failures are errors; mismatches and
    /// missing references are reported through the verdict.
    pub fn capture(
        &mut self,
        device: &mut dyn DeviceChannel,
        title: &str,
    ) -> HarnessResult<CheckpointResult> {
        self.sequence += 1;
        let filename = checkpoint_filename(self.sequence, title);

        let screen = device.capture_screen()?;
        let capture_path = self.store.write_capture(&screen, &filename)?;
        info!(file = %filename, "saved screenshot");

        let (score, verdict) = match self.store.load_reference(&filename) {
            Some(reference) => {
                let score = similarity(&screen, &reference);
                (Some(score), Verdict::classify(score, self.tolerance))
            }
            None => (None, Verdict::ReferenceMissing),
        };

        match verdict {
            Verdict::Match => {}
            Verdict::Mismatch => error!(
                file = %filename,
                similarity = score.unwrap_or_default(),
                tolerance = self.tolerance,
                "comparison with reference failed"
            ),
            Verdict::ReferenceMissing => warn!(
                file = %filename,
                reference_dir = %self.store.reference_dir().display(),
                "reference image not found"
            ),
        }

        Ok(CheckpointResult {
            sequence: self.sequence,
            title: title.to_string(),
            filename,
            capture_path,
            similarity: score,
            verdict,
        })
    }
}
