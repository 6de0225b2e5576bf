//! # Chunked Batch Runner
//!
//! Drives an `add-to-dataset` job over a fully materialized list of
//! observations. Chunks run one at a time: every record of a chunk is mapped,
//! the cleanly mapped ones go to the sink in a single bulk call, and the
//! counters advance. A chunk that fails as a whole marks its records failed
//! and the job moves on to the next chunk.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{DatasetMappingSettings, SummarySettings};
use crate::database::BatchActionStore;
use crate::error::Result;
use crate::logging::log_batch_action_operation;
use crate::mapping::apply_full_mapping;
use crate::models::{AddToDatasetConfig, BatchActionUpdate, NewDatasetItem, ObservationRecord};

use super::progress::{build_summary, ErrorSamples, JobCounters};
use super::types::{DatasetItemSink, JobOutcome};

/// Result of mapping one chunk
struct MappedChunk {
    items: Vec<NewDatasetItem>,
    errors: Vec<String>,
}

pub struct ChunkedBatchRunner {
    store: Arc<dyn BatchActionStore>,
    sink: Arc<dyn DatasetItemSink>,
    settings: DatasetMappingSettings,
    summary: SummarySettings,
}

impl ChunkedBatchRunner {
    pub fn new(
        store: Arc<dyn BatchActionStore>,
        sink: Arc<dyn DatasetItemSink>,
        settings: DatasetMappingSettings,
        summary: SummarySettings,
    ) -> Self {
        Self {
            store,
            sink,
            settings,
            summary,
        }
    }

    /// Run the job to its terminal status.
    ///
    /// Only the initial and final job-store writes propagate errors; progress
    /// writes in between are best effort.
    pub async fn run(
        &self,
        project_id: &str,
        batch_action_id: &str,
        config: &AddToDatasetConfig,
        records: &[ObservationRecord],
    ) -> Result<JobOutcome> {
        let total = records.len() as u64;
        self.store
            .update(
                project_id,
                batch_action_id,
                BatchActionUpdate::started(total),
            )
            .await?;
        log_batch_action_operation(
            "add_to_dataset_started",
            batch_action_id,
            project_id,
            "processing",
            Some(&format!("{total} records into dataset {}", config.dataset_id)),
        );

        let chunk_size = self.settings.chunk_size.max(1);
        let write_interval = self.settings.progress_write_interval_chunks.max(1);
        let chunk_count = records.len().div_ceil(chunk_size);

        let mut counters = JobCounters::with_total(total);
        let mut samples = ErrorSamples::new(self.settings.max_retained_errors);

        for (chunk_index, chunk) in records.chunks(chunk_size).enumerate() {
            let chunk_number = chunk_index + 1;
            let chunk_errors = self
                .process_chunk(project_id, config, chunk_number, chunk, &mut counters)
                .await;
            samples.extend_capped(chunk_errors, self.settings.max_errors_per_chunk);

            debug!(
                batch_action_id = %batch_action_id,
                chunk = chunk_number,
                chunks = chunk_count,
                processed = counters.processed,
                failed = counters.failed,
                "Processed dataset chunk"
            );

            if chunk_number % write_interval == 0 || chunk_number == chunk_count {
                if let Err(e) = self
                    .store
                    .update(project_id, batch_action_id, counters.progress_update())
                    .await
                {
                    warn!(
                        batch_action_id = %batch_action_id,
                        chunk = chunk_number,
                        error = %e,
                        "Failed to persist batch action progress"
                    );
                }
            }
        }

        let headline = format!("{} items failed to add to dataset", counters.failed);
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
            processed = outcome.processed_count,
            failed = outcome.failed_count,
            "Add-to-dataset batch action finished"
        );

        Ok(outcome)
    }

    /// Map and submit one chunk, returning its error lines
    async fn process_chunk(
        &self,
        project_id: &str,
        config: &AddToDatasetConfig,
        chunk_number: usize,
        chunk: &[ObservationRecord],
        counters: &mut JobCounters,
    ) -> Vec<String> {
        let MappedChunk { items, mut errors } = map_chunk(config, chunk);
        counters.record_failed(errors.len() as u64);

        if items.is_empty() {
            return errors;
        }

        let submitted = items.len() as u64;
        // Kept for labelling validation errors after the items move into the sink
        let observation_ids: Vec<String> = items
            .iter()
            .map(|item| item.source_observation_id.clone())
            .collect();

        match self
            .sink
            .create_many(project_id, &config.dataset_id, items)
            .await
        {
            Ok(outcome) => {
                let succeeded = outcome.success_count.min(submitted);
                counters.record_processed(succeeded);
                counters.record_failed(submitted - succeeded);

                errors.extend(outcome.validation_errors.into_iter().map(|e| {
                    match observation_ids.get(e.item_index) {
                        Some(id) => format!("Observation {id}: {}", e.message),
                        None => format!("Item {}: {}", e.item_index, e.message),
                    }
                }));
            }
            Err(e) => {
                counters.record_failed(submitted);
                warn!(
                    chunk = chunk_number,
                    items = submitted,
                    error = %e,
                    "Dataset item sink failed for chunk"
                );
                errors.push(format!(
                    "Chunk {chunk_number}: failed to create {submitted} items: {e}"
                ));
            }
        }

        errors
    }
}

/// Map every record of a chunk; records with any mapping error are excluded
fn map_chunk(config: &AddToDatasetConfig, chunk: &[ObservationRecord]) -> MappedChunk {
    let mut items = Vec::with_capacity(chunk.len());
    let mut errors = Vec::new();

    for record in chunk {
        let mapped = apply_full_mapping(record, &config.mapping);
        if mapped.has_errors() {
            let messages: Vec<&str> = mapped.errors.iter().map(|e| e.message.as_str()).collect();
            errors.push(format!("Observation {}: {}", record.id, messages.join("; ")));
            continue;
        }

        items.push(NewDatasetItem {
            dataset_id: config.dataset_id.clone(),
            input: mapped.input,
            expected_output: mapped.expected_output,
            metadata: mapped.metadata,
            source_trace_id: record.trace_id.clone(),
            source_observation_id: record.id.clone(),
        });
    }

    MappedChunk { items, errors }
}
