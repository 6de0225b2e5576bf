//! Per-record operation of the `run-evaluation` action.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::{BatchActionError, Result};
use crate::models::EvaluationTarget;

use super::types::{EvaluationScheduler, RecordOperation};

/// Schedules every configured evaluator for a target.
///
/// All evaluators are attempted; the record fails if any of them could not be
/// scheduled.
pub struct EvaluationSchedulingOperation {
    scheduler: Arc<dyn EvaluationScheduler>,
    evaluator_ids: Vec<String>,
}

impl EvaluationSchedulingOperation {
    pub fn new(scheduler: Arc<dyn EvaluationScheduler>, evaluator_ids: Vec<String>) -> Self {
        Self {
            scheduler,
            evaluator_ids,
        }
    }

    pub fn evaluator_ids(&self) -> &[String] {
        &self.evaluator_ids
    }
}

#[async_trait]
impl RecordOperation<EvaluationTarget> for EvaluationSchedulingOperation {
    fn describe(&self) -> String {
        format!("evaluators: {}", self.evaluator_ids.join(", "))
    }

    async fn execute(&self, project_id: &str, target: &EvaluationTarget) -> Result<()> {
        let mut failures = Vec::new();

        for evaluator_id in &self.evaluator_ids {
            if let Err(e) = self.scheduler.schedule(project_id, target, evaluator_id).await {
                failures.push(format!("evaluator {evaluator_id}: {e}"));
            }
        }

        if failures.is_empty() {
            debug!(
                target_id = %target.display_id(),
                evaluators = self.evaluator_ids.len(),
                "Scheduled evaluations"
            );
            return Ok(());
        }

        Err(BatchActionError::SchedulingError(format!(
            "{}: {}",
            target.display_id(),
            failures.join("; ")
        )))
    }
}
