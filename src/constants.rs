//! # Batch Action Constants
//!
//! Job status and action type enums shared by the store, the runners, and the
//! display layer, plus the default tunables used when no configuration file
//! overrides them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a batch action.
///
/// Status only moves forward: `Queued -> Processing -> {Completed | Partial | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchActionStatus {
    /// Created by the dispatcher, not yet picked up
    Queued,
    /// A runner owns the job and is writing progress
    Processing,
    /// Every record succeeded
    Completed,
    /// Some records succeeded and some failed
    Partial,
    /// No record succeeded and at least one failed
    Failed,
}

impl BatchActionStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Partial | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Processing => 1,
            Self::Completed | Self::Partial | Self::Failed => 2,
        }
    }

    /// Whether a write moving the job from `self` to `next` keeps status monotonic.
    ///
    /// Re-writing `Processing` is allowed so progress updates can carry the status.
    pub fn can_transition_to(&self, next: BatchActionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if *self == next {
            return *self == Self::Processing;
        }
        next.rank() > self.rank()
    }

    /// Final status from the job's counters.
    pub fn from_counts(processed: u64, failed: u64) -> Self {
        if failed == 0 {
            Self::Completed
        } else if processed == 0 {
            Self::Failed
        } else {
            Self::Partial
        }
    }
}

impl fmt::Display for BatchActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for BatchActionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid batch action status: {s}")),
        }
    }
}

/// Which bulk operation a batch action performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchActionType {
    AddToDataset,
    RunEvaluation,
}

impl BatchActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddToDataset => "add-to-dataset",
            Self::RunEvaluation => "run-evaluation",
        }
    }
}

impl fmt::Display for BatchActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BatchActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add-to-dataset" => Ok(Self::AddToDataset),
            "run-evaluation" => Ok(Self::RunEvaluation),
            _ => Err(format!("Invalid batch action type: {s}")),
        }
    }
}

/// Default tunables, mirrored by `config/batch-actions.yaml`
pub mod defaults {
    /// Records per chunk for dataset mapping. Kept below the generic chunk size
    /// because each record pays for path evaluation and item validation.
    pub const DATASET_CHUNK_SIZE: usize = 100;
    /// Persist progress every N chunks; the final chunk always persists.
    pub const PROGRESS_WRITE_INTERVAL_CHUNKS: usize = 5;
    pub const MAX_ERRORS_PER_CHUNK: usize = 10;
    pub const MAX_RETAINED_ERRORS: usize = 100;

    pub const EVALUATION_BATCH_SIZE: usize = 500;
    pub const EVALUATION_MAX_CONCURRENCY: usize = 10;

    /// Error lines quoted in the final log summary
    pub const SUMMARY_MAX_ERROR_LINES: usize = 10;
    pub const SUMMARY_MAX_LOG_CHARS: usize = 10_000;
}
