//! # Batch Action Processor
//!
//! Entry point for a queued job: loads the record, resolves its typed config,
//! selects its records and hands them to the matching runner. The caller is
//! responsible for running at most one processor per batch action id.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::BatchActionsConfig;
use crate::database::BatchActionStore;
use crate::error::{BatchActionError, Result};
use crate::logging::log_error;
use crate::models::{BatchAction, BatchActionConfig, BatchActionUpdate, EvaluationTarget};

use super::chunked_runner::ChunkedBatchRunner;
use super::evaluation::EvaluationSchedulingOperation;
use super::streaming_runner::StreamingConcurrentRunner;
use super::types::{
    DatasetItemSink, EvaluationScheduler, JobOutcome, RecordOperation, RecordSelector,
};

pub struct BatchActionProcessor {
    store: Arc<dyn BatchActionStore>,
    selector: Arc<dyn RecordSelector>,
    sink: Arc<dyn DatasetItemSink>,
    scheduler: Arc<dyn EvaluationScheduler>,
    config: BatchActionsConfig,
}

impl BatchActionProcessor {
    pub fn new(
        store: Arc<dyn BatchActionStore>,
        selector: Arc<dyn RecordSelector>,
        sink: Arc<dyn DatasetItemSink>,
        scheduler: Arc<dyn EvaluationScheduler>,
        config: BatchActionsConfig,
    ) -> Self {
        Self {
            store,
            selector,
            sink,
            scheduler,
            config,
        }
    }

    /// Run one batch action to completion.
    ///
    /// Returns `Ok(None)` when the job had already reached a terminal status.
    /// Invalid configuration and selection failures end the job as `Failed`
    /// rather than returning an error.
    pub async fn process(
        &self,
        project_id: &str,
        batch_action_id: &str,
    ) -> Result<Option<JobOutcome>> {
        let action = self
            .store
            .find(project_id, batch_action_id)
            .await?
            .ok_or_else(|| BatchActionError::NotFound {
                project_id: project_id.to_string(),
                batch_action_id: batch_action_id.to_string(),
            })?;

        if action.status.is_terminal() {
            info!(
                batch_action_id = %batch_action_id,
                status = %action.status,
                "Batch action already finished, skipping"
            );
            return Ok(None);
        }

        let config = match BatchActionConfig::parse(action.action_type, &action.config) {
            Ok(config) => config,
            Err(e) => {
                return self
                    .fail_before_start(&action, format!("Invalid batch action config: {e}"))
                    .await
                    .map(Some);
            }
        };

        info!(
            batch_action_id = %batch_action_id,
            project_id = %project_id,
            action_type = %action.action_type,
            "Processing batch action"
        );

        let outcome = match config {
            BatchActionConfig::AddToDataset(dataset_config) => {
                let records = match self
                    .selector
                    .fetch_observations(project_id, &action.query)
                    .await
                {
                    Ok(records) => records,
                    Err(e) => {
                        return self
                            .fail_before_start(&action, format!("Failed to select records: {e}"))
                            .await
                            .map(Some);
                    }
                };

                ChunkedBatchRunner::new(
                    self.store.clone(),
                    self.sink.clone(),
                    self.config.dataset_mapping.clone(),
                    self.config.summary.clone(),
                )
                .run(project_id, batch_action_id, &dataset_config, &records)
                .await?
            }
            BatchActionConfig::RunEvaluation(evaluation_config) => {
                let targets = match self
                    .selector
                    .stream_evaluation_targets(project_id, &action.query)
                    .await
                {
                    Ok(targets) => targets,
                    Err(e) => {
                        return self
                            .fail_before_start(&action, format!("Failed to select records: {e}"))
                            .await
                            .map(Some);
                    }
                };

                let operation: Arc<dyn RecordOperation<EvaluationTarget>> =
                    Arc::new(EvaluationSchedulingOperation::new(
                        self.scheduler.clone(),
                        evaluation_config.evaluator_ids,
                    ));
                StreamingConcurrentRunner::new(
                    self.store.clone(),
                    operation,
                    self.config.evaluation.clone(),
                    self.config.summary.clone(),
                )
                .run(project_id, batch_action_id, targets)
                .await?
            }
        };

        Ok(Some(outcome))
    }

    async fn fail_before_start(&self, action: &BatchAction, message: String) -> Result<JobOutcome> {
        warn!(
            batch_action_id = %action.id,
            project_id = %action.project_id,
            reason = %message,
            "Batch action failed before processing"
        );
        log_error(
            "batch_action_processor",
            "process",
            &message,
            Some(action.id.as_str()),
        );

        let updated = self
            .store
            .update(
                &action.project_id,
                &action.id,
                BatchActionUpdate::failed_before_start(message),
            )
            .await?;

        Ok(JobOutcome {
            status: updated.status,
            total_count: updated.total_count,
            processed_count: updated.processed_count,
            failed_count: updated.failed_count,
            log: updated.log,
        })
    }
}
