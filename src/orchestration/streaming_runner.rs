//! # Streaming Concurrent Runner
//!
//! Drives a job over a record stream whose length is unknown up front. The
//! stream is pulled in fixed-size batches; within a batch every record runs
//! its operation with at most `max_concurrency` in flight, and the whole batch
//! settles before the next one is pulled. Only one batch is ever buffered.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{EvaluationSettings, SummarySettings};
use crate::database::BatchActionStore;
use crate::error::Result;
use crate::logging::log_batch_action_operation;
use crate::models::BatchActionUpdate;

use super::progress::{build_summary, ErrorSamples, JobCounters};
use super::types::{JobOutcome, RecordOperation, RecordStream};

pub struct StreamingConcurrentRunner<R: Send + Sync + 'static> {
    store: Arc<dyn BatchActionStore>,
    operation: Arc<dyn RecordOperation<R>>,
    settings: EvaluationSettings,
    summary: SummarySettings,
}

impl<R> StreamingConcurrentRunner<R>
where
    R: Send + Sync + 'static,
{
    pub fn new(
        store: Arc<dyn BatchActionStore>,
        operation: Arc<dyn RecordOperation<R>>,
        settings: EvaluationSettings,
        summary: SummarySettings,
    ) -> Self {
        Self {
            store,
            operation,
            settings,
            summary,
        }
    }

    /// Consume `records` until the stream ends and persist the terminal status.
    ///
    /// Stream items that are errors count as failed records. Only the initial
    /// and final job-store writes propagate errors.
    pub async fn run(
        &self,
        project_id: &str,
        batch_action_id: &str,
        records: RecordStream<R>,
    ) -> Result<JobOutcome> {
        let description = self.operation.describe();
        self.store
            .update(project_id, batch_action_id, BatchActionUpdate::started(0))
            .await?;
        log_batch_action_operation(
            "streaming_run_started",
            batch_action_id,
            project_id,
            "processing",
            Some(&description),
        );

        let batch_size = self.settings.batch_size.max(1);
        let max_concurrency = self.settings.max_concurrency.max(1);

        let mut counters = JobCounters::default();
        let mut samples = ErrorSamples::new(self.settings.max_retained_errors);
        let mut batches = records.chunks(batch_size);
        let mut batch_number = 0usize;

        while let Some(batch) = batches.next().await {
            batch_number += 1;
            let first_index = counters.total as usize;
            counters.total += batch.len() as u64;

            let mut pending = Vec::with_capacity(batch.len());
            for (offset, item) in batch.into_iter().enumerate() {
                let index = first_index + offset;
                match item {
                    Ok(record) => pending.push((index, record)),
                    Err(e) => {
                        counters.record_failed(1);
                        samples.push(format!("Record {index}: {e}"));
                    }
                }
            }

            let operation = self.operation.as_ref();
            let results: Vec<(usize, Result<()>)> = stream::iter(pending)
                .map(|(index, record)| async move {
                    (index, operation.execute(project_id, &record).await)
                })
                .buffer_unordered(max_concurrency)
                .collect()
                .await;

            for (index, result) in results {
                match result {
                    Ok(()) => counters.record_processed(1),
                    Err(e) => {
                        counters.record_failed(1);
                        samples.push(format!("Record {index}: {e}"));
                    }
                }
            }

            debug!(
                batch_action_id = %batch_action_id,
                batch = batch_number,
                total = counters.total,
                processed = counters.processed,
                failed = counters.failed,
                "Processed streamed batch"
            );

            if let Err(e) = self
                .store
                .update(project_id, batch_action_id, counters.progress_update())
                .await
            {
                warn!(
                    batch_action_id = %batch_action_id,
                    batch = batch_number,
                    error = %e,
                    "Failed to persist batch action progress"
                );
            }
        }

        let headline = format!(
            "{} of {} records failed ({description})",
            counters.failed, counters.total
        );
        let log = build_summary(counters.failed, &headline, &samples, &self.summary);
        let outcome = counters.outcome(log);

        self.store
            .update(
                project_id,
                batch_action_id,
                BatchActionUpdate::finished(
                    outcome.status,
                    outcome.total_count,
                    outcome.processed_count,
                    outcome.failed_count,
                    outcome.log.clone(),
                ),
            )
            .await?;

        info!(
            batch_action_id = %batch_action_id,
            project_id = %project_id,
            status = %outcome.status,
            total = outcome.total_count,
            processed = outcome.processed_count,
            failed = outcome.failed_count,
            operation = %description,
            "Streaming batch action finished"
        );

        Ok(outcome)
    }
}
