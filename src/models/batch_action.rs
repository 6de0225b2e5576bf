//! # Batch Action Model
//!
//! The persisted job record for one bulk operation: its configuration, its
//! progress counters, and its terminal outcome.
//!
//! ## Ownership
//!
//! The upstream dispatcher creates the record (`Queued`). From then on only the
//! engine writes `status`, the three counters, `log` and `finished_at`.
//!
//! ## Database Schema
//!
//! Maps to the `batch_actions` table (see `migrations/`):
//! - `id`, `project_id`, `user_id`: identity and ownership (TEXT)
//! - `action_type`: `add-to-dataset` | `run-evaluation`
//! - `status`: `queued` | `processing` | `completed` | `partial` | `failed`
//! - `query`, `config`: JSONB, opaque selection criteria and action parameters
//! - `total_count`, `processed_count`, `failed_count`: BIGINT, non-negative
//! - `log`: TEXT, null until a failure is recorded
//! - `finished_at`: TIMESTAMPTZ, set once on entering a terminal status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{BatchActionStatus, BatchActionType};
use crate::error::{BatchActionError, Result};
use crate::mapping::DatasetMappingConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAction {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub action_type: BatchActionType,
    pub status: BatchActionStatus,
    pub query: Value,
    pub config: Value,
    pub total_count: u64,
    pub processed_count: u64,
    pub failed_count: u64,
    pub log: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New batch action for creation (without engine-owned fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatchAction {
    pub project_id: String,
    pub user_id: String,
    pub action_type: BatchActionType,
    pub query: Value,
    pub config: Value,
}

/// Partial update of the engine-owned fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchActionUpdate {
    pub status: Option<BatchActionStatus>,
    pub total_count: Option<u64>,
    pub processed_count: Option<u64>,
    pub failed_count: Option<u64>,
    pub log: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchActionUpdate {
    /// Runner picked the job up; counters restart from zero.
    pub fn started(total_count: u64) -> Self {
        Self {
            status: Some(BatchActionStatus::Processing),
            total_count: Some(total_count),
            processed_count: Some(0),
            failed_count: Some(0),
            ..Default::default()
        }
    }

    pub fn progress(total_count: u64, processed_count: u64, failed_count: u64) -> Self {
        Self {
            total_count: Some(total_count),
            processed_count: Some(processed_count),
            failed_count: Some(failed_count),
            ..Default::default()
        }
    }

    pub fn finished(
        status: BatchActionStatus,
        total_count: u64,
        processed_count: u64,
        failed_count: u64,
        log: Option<String>,
    ) -> Self {
        Self {
            status: Some(status),
            total_count: Some(total_count),
            processed_count: Some(processed_count),
            failed_count: Some(failed_count),
            log,
            finished_at: Some(Utc::now()),
        }
    }

    /// Job failed before any record was processed.
    pub fn failed_before_start(log: impl Into<String>) -> Self {
        Self {
            status: Some(BatchActionStatus::Failed),
            log: Some(log.into()),
            finished_at: Some(Utc::now()),
            ..Default::default()
        }
    }
}

impl BatchAction {
    /// Validate and apply an update, enforcing the record's invariants.
    ///
    /// Status never regresses, `finished_at` is only written together with a
    /// terminal status and never overwritten, and once the total is known the
    /// processed and failed counts never exceed it.
    pub fn apply_update(&mut self, update: &BatchActionUpdate) -> Result<()> {
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(BatchActionError::InvalidStatusTransition {
                    batch_action_id: self.id.clone(),
                    from: self.status,
                    to: next,
                });
            }
        }

        let next_status = update.status.unwrap_or(self.status);
        if update.finished_at.is_some() && !next_status.is_terminal() {
            return Err(BatchActionError::ValidationError(format!(
                "finished_at may only be set with a terminal status (batch action {})",
                self.id
            )));
        }

        let total = update.total_count.unwrap_or(self.total_count);
        let processed = update.processed_count.unwrap_or(self.processed_count);
        let failed = update.failed_count.unwrap_or(self.failed_count);
        if total > 0 && processed + failed > total {
            return Err(BatchActionError::ValidationError(format!(
                "processed ({processed}) + failed ({failed}) exceeds total ({total}) for batch action {}",
                self.id
            )));
        }

        self.status = next_status;
        self.total_count = total;
        self.processed_count = processed;
        self.failed_count = failed;
        if let Some(log) = &update.log {
            self.log = Some(log.clone());
        }
        if self.finished_at.is_none() {
            self.finished_at = update.finished_at;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Parameters of an `add-to-dataset` action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToDatasetConfig {
    pub dataset_id: String,
    #[serde(default)]
    pub mapping: DatasetMappingConfig,
}

/// Parameters of a `run-evaluation` action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvaluationConfig {
    pub evaluator_ids: Vec<String>,
}

/// Typed view of a batch action's `config`
#[derive(Debug, Clone, PartialEq)]
pub enum BatchActionConfig {
    AddToDataset(AddToDatasetConfig),
    RunEvaluation(RunEvaluationConfig),
}

impl BatchActionConfig {
    pub fn parse(action_type: BatchActionType, config: &Value) -> Result<Self> {
        match action_type {
            BatchActionType::AddToDataset => {
                let parsed: AddToDatasetConfig = serde_json::from_value(config.clone())?;
                if parsed.dataset_id.trim().is_empty() {
                    return Err(BatchActionError::ValidationError(
                        "add-to-dataset config requires a datasetId".to_string(),
                    ));
                }
                Ok(Self::AddToDataset(parsed))
            }
            BatchActionType::RunEvaluation => {
                let parsed: RunEvaluationConfig = serde_json::from_value(config.clone())?;
                if parsed.evaluator_ids.is_empty() {
                    return Err(BatchActionError::ValidationError(
                        "run-evaluation config requires at least one evaluator id".to_string(),
                    ));
                }
                Ok(Self::RunEvaluation(parsed))
            }
        }
    }
}
