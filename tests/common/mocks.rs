//! Scripted collaborators recording every call they receive.

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use batch_action_core::database::{BatchActionStore, InMemoryBatchActionStore};
use batch_action_core::error::{BatchActionError, Result};
use batch_action_core::models::{
    BatchAction, BatchActionUpdate, BulkCreateOutcome, EvaluationTarget, ItemValidationError,
    NewBatchAction, NewDatasetItem, ObservationRecord,
};
use batch_action_core::orchestration::{
    DatasetItemSink, EvaluationScheduler, RecordSelector, RecordStream,
};
use serde_json::Value;

/// What the sink does with one `create_many` call
#[derive(Debug, Clone)]
pub enum SinkBehavior {
    AcceptAll,
    /// Reject the items at these positions with a validation error
    RejectIndices(Vec<usize>),
    /// Fail the whole call
    Fail(String),
}

#[derive(Debug, Default)]
struct SinkState {
    calls: Vec<Vec<NewDatasetItem>>,
    script: VecDeque<SinkBehavior>,
}

/// Dataset item sink that accepts everything unless scripted otherwise
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaviours for the next calls, in order; later calls accept all
    pub fn with_script(script: Vec<SinkBehavior>) -> Self {
        let sink = Self::new();
        sink.state.lock().script = script.into();
        sink
    }

    pub fn calls(&self) -> Vec<Vec<NewDatasetItem>> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }
}

#[async_trait]
impl DatasetItemSink for RecordingSink {
    async fn create_many(
        &self,
        _project_id: &str,
        _dataset_id: &str,
        items: Vec<NewDatasetItem>,
    ) -> Result<BulkCreateOutcome> {
        let behavior = {
            let mut state = self.state.lock();
            state.calls.push(items.clone());
            state.script.pop_front().unwrap_or(SinkBehavior::AcceptAll)
        };

        match behavior {
            SinkBehavior::AcceptAll => Ok(BulkCreateOutcome::all_succeeded(items.len() as u64)),
            SinkBehavior::RejectIndices(indices) => {
                let validation_errors: Vec<ItemValidationError> = indices
                    .iter()
                    .filter(|index| **index < items.len())
                    .map(|index| ItemValidationError {
                        item_index: *index,
                        message: "input does not match dataset schema".to_string(),
                    })
                    .collect();
                let failed = validation_errors.len() as u64;
                Ok(BulkCreateOutcome {
                    success: failed == 0,
                    success_count: items.len() as u64 - failed,
                    failed_count: failed,
                    validation_errors,
                })
            }
            SinkBehavior::Fail(message) => Err(BatchActionError::SinkError(message)),
        }
    }
}

#[derive(Debug, Default)]
struct SchedulerState {
    calls: Vec<(String, String)>,
    failing_targets: HashSet<String>,
    failing_evaluators: HashSet<String>,
}

/// Evaluation scheduler that tracks how many calls are in flight at once
#[derive(Debug, Clone, Default)]
pub struct ScriptedScheduler {
    state: Arc<Mutex<SchedulerState>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each call for `delay` so overlapping calls are observable
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail_target(self, target_id: &str) -> Self {
        self.state
            .lock()
            .failing_targets
            .insert(target_id.to_string());
        self
    }

    pub fn fail_evaluator(self, evaluator_id: &str) -> Self {
        self.state
            .lock()
            .failing_evaluators
            .insert(evaluator_id.to_string());
        self
    }

    /// `(target display id, evaluator id)` pairs, in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state.lock().calls.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvaluationScheduler for ScriptedScheduler {
    async fn schedule(
        &self,
        _project_id: &str,
        target: &EvaluationTarget,
        evaluator_id: &str,
    ) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let target_id = target.display_id().to_string();
        let fails = {
            let mut state = self.state.lock();
            state.calls.push((target_id.clone(), evaluator_id.to_string()));
            state.failing_targets.contains(&target_id)
                || state.failing_evaluators.contains(evaluator_id)
        };

        if fails {
            return Err(BatchActionError::SchedulingError(format!(
                "queue rejected {evaluator_id} for {target_id}"
            )));
        }
        Ok(())
    }
}

/// Record selector serving fixed records
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    pub observations: Vec<ObservationRecord>,
    pub targets: Vec<std::result::Result<EvaluationTarget, String>>,
    pub failure: Option<String>,
}

impl ScriptedSelector {
    pub fn with_observations(observations: Vec<ObservationRecord>) -> Self {
        Self {
            observations,
            ..Self::default()
        }
    }

    pub fn with_targets(targets: Vec<EvaluationTarget>) -> Self {
        Self {
            targets: targets.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecordSelector for ScriptedSelector {
    async fn fetch_observations(
        &self,
        _project_id: &str,
        _query: &Value,
    ) -> Result<Vec<ObservationRecord>> {
        if let Some(message) = &self.failure {
            return Err(BatchActionError::SelectionError(message.clone()));
        }
        Ok(self.observations.clone())
    }

    async fn stream_evaluation_targets(
        &self,
        _project_id: &str,
        _query: &Value,
    ) -> Result<RecordStream<EvaluationTarget>> {
        if let Some(message) = &self.failure {
            return Err(BatchActionError::SelectionError(message.clone()));
        }
        Ok(target_stream(self.targets.clone()))
    }
}

/// Boxed stream over fixed items; `Err(message)` becomes a selection error
pub fn target_stream(
    items: Vec<std::result::Result<EvaluationTarget, String>>,
) -> RecordStream<EvaluationTarget> {
    Box::pin(stream::iter(
        items
            .into_iter()
            .map(|item| item.map_err(BatchActionError::SelectionError)),
    ))
}

/// In-memory store whose progress writes can be made to fail.
///
/// Writes that carry a status (start, finish) always go through.
#[derive(Debug, Default)]
pub struct FlakyProgressStore {
    pub inner: InMemoryBatchActionStore,
    fail_progress: AtomicBool,
    rejected_progress_writes: AtomicUsize,
}

impl FlakyProgressStore {
    pub fn failing_progress() -> Self {
        let store = Self::default();
        store.fail_progress.store(true, Ordering::SeqCst);
        store
    }

    pub fn rejected_progress_writes(&self) -> usize {
        self.rejected_progress_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchActionStore for FlakyProgressStore {
    async fn find(&self, project_id: &str, batch_action_id: &str) -> Result<Option<BatchAction>> {
        self.inner.find(project_id, batch_action_id).await
    }

    async fn create(&self, new_action: NewBatchAction) -> Result<BatchAction> {
        self.inner.create(new_action).await
    }

    async fn update(
        &self,
        project_id: &str,
        batch_action_id: &str,
        update: BatchActionUpdate,
    ) -> Result<BatchAction> {
        if update.status.is_none() && self.fail_progress.load(Ordering::SeqCst) {
            self.rejected_progress_writes.fetch_add(1, Ordering::SeqCst);
            return Err(BatchActionError::DatabaseError(
                "connection reset by peer".to_string(),
            ));
        }
        self.inner.update(project_id, batch_action_id, update).await
    }
}
