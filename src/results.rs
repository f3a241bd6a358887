//! Checkpoint verdicts and per-run result aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of comparing one capture against its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Similarity at or above the tolerance
    Match,
    /// Similarity below the tolerance
    Mismatch,
    /// No readable baseline with the capture's filename
    ReferenceMissing,
}

impl Verdict {
    /// Classify a similarity score. The threshold is inclusive.
    pub fn classify(score: f64, tolerance: f64) -> Self {
        if score >= tolerance {
            Verdict::Match
        } else {
            Verdict::Mismatch
        }
    }

    /// Whether this verdict counts against the run
    pub fn is_failure(self) -> bool {
        !matches!(self, Verdict::Match)
    }
}

/// Result of a single checkpoint capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointResult {
    /// Sequence number within the run (starts at 1)
    pub sequence: u32,

    /// Checkpoint title (e.g., "calendar")
    pub title: String,

    /// Capture filename, shared with the reference image
    pub filename: String,

    /// Where the capture was written
    pub capture_path: PathBuf,

    /// Similarity to the reference (None when the reference is missing)
    pub similarity: Option<f64>,

    pub verdict: Verdict,
}

/// Running counters for one run. Invariant: `failed_captures <= total_captures`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_captures: u32,
    pub failed_captures: u32,
}

impl RunSummary {
    /// True when every capture matched its reference
    pub fn passed(&self) -> bool {
        self.failed_captures == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} images FAILED comparison",
            self.failed_captures, self.total_captures
        )
    }
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,

    /// All checkpoint results, in capture order
    pub checkpoints: Vec<CheckpointResult>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub finished_at: DateTime<Utc>,
}

/// Tallies verdicts for a single run. Create one per run; it is never shared.
#[derive(Debug)]
pub struct ResultAggregator {
    summary: RunSummary,
    checkpoints: Vec<CheckpointResult>,
    started_at: DateTime<Utc>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            summary: RunSummary::default(),
            checkpoints: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Count a verdict
    pub fn record_verdict(&mut self, verdict: Verdict) {
        self.summary.total_captures += 1;
        if verdict.is_failure() {
            self.summary.failed_captures += 1;
        }
    }

    /// Count a checkpoint result and keep it for the report
    pub fn record(&mut self, result: CheckpointResult) {
        self.record_verdict(result.verdict);
        self.checkpoints.push(result);
    }

    /// Current counters
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Finish the run and produce its report
    pub fn into_report(self) -> RunReport {
        RunReport {
            summary: self.summary,
            checkpoints: self.checkpoints,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}
