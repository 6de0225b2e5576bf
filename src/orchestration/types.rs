//! # Orchestration Types
//!
//! Collaborator contracts consumed by the runners, and the outcome they
//! report. Record selection, dataset item creation and evaluation scheduling
//! all live outside this crate; the runners only see these traits.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::BatchActionStatus;
use crate::error::Result;
use crate::models::{BulkCreateOutcome, EvaluationTarget, NewDatasetItem, ObservationRecord};

/// Stream of records pulled by the streaming runner
pub type RecordStream<R> = BoxStream<'static, Result<R>>;

/// Resolves a batch action's opaque `query` into records
#[async_trait]
pub trait RecordSelector: Send + Sync {
    /// Full, ordered list of observations for an `add-to-dataset` action
    async fn fetch_observations(
        &self,
        project_id: &str,
        query: &Value,
    ) -> Result<Vec<ObservationRecord>>;

    /// Pull-based stream of targets for a `run-evaluation` action
    async fn stream_evaluation_targets(
        &self,
        project_id: &str,
        query: &Value,
    ) -> Result<RecordStream<EvaluationTarget>>;
}

/// Bulk creation of dataset items.
///
/// A returned `Ok` may still report per-item validation failures; an `Err`
/// means the whole call failed and is reported as `BatchActionError::SinkError`.
#[async_trait]
pub trait DatasetItemSink: Send + Sync {
    async fn create_many(
        &self,
        project_id: &str,
        dataset_id: &str,
        items: Vec<NewDatasetItem>,
    ) -> Result<BulkCreateOutcome>;
}

/// Schedules one evaluator run for one target
#[async_trait]
pub trait EvaluationScheduler: Send + Sync {
    async fn schedule(
        &self,
        project_id: &str,
        target: &EvaluationTarget,
        evaluator_id: &str,
    ) -> Result<()>;
}

/// Side-effecting unit of work applied to each streamed record
#[async_trait]
pub trait RecordOperation<R: Send + Sync>: Send + Sync {
    /// Short description used in the final job summary
    fn describe(&self) -> String;

    async fn execute(&self, project_id: &str, record: &R) -> Result<()>;
}

/// What a runner reports once the job reached its terminal status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub status: BatchActionStatus,
    pub total_count: u64,
    pub processed_count: u64,
    pub failed_count: u64,
    pub log: Option<String>,
}
