//! Record and job builders.

use serde_json::{json, Value};

use batch_action_core::constants::BatchActionType;
use batch_action_core::database::BatchActionStore;
use batch_action_core::models::{
    AddToDatasetConfig, BatchAction, EvaluationTarget, NewBatchAction, ObservationRecord,
};
use batch_action_core::mapping::DatasetMappingConfig;

use super::PROJECT_ID;

pub fn observation(id: &str, input: Value, output: Value, metadata: Value) -> ObservationRecord {
    ObservationRecord {
        id: id.to_string(),
        trace_id: format!("trace-{id}"),
        input,
        output,
        metadata,
    }
}

/// `count` observations whose output carries an `answer`
pub fn answered_observations(count: usize) -> Vec<ObservationRecord> {
    (0..count)
        .map(|i| {
            observation(
                &format!("obs-{i}"),
                json!({"question": format!("q{i}")}),
                json!({"answer": i}),
                json!({"index": i}),
            )
        })
        .collect()
}

pub fn evaluation_targets(count: usize) -> Vec<EvaluationTarget> {
    (0..count)
        .map(|i| EvaluationTarget {
            trace_id: format!("trace-{i}"),
            observation_id: Some(format!("obs-{i}")),
        })
        .collect()
}

pub fn dataset_config(mapping: DatasetMappingConfig) -> AddToDatasetConfig {
    AddToDatasetConfig {
        dataset_id: "dataset-1".to_string(),
        mapping,
    }
}

/// Create a queued batch action in `store`
pub async fn queued_action(
    store: &dyn BatchActionStore,
    action_type: BatchActionType,
    config: Value,
) -> BatchAction {
    store
        .create(NewBatchAction {
            project_id: PROJECT_ID.to_string(),
            user_id: "user-1".to_string(),
            action_type,
            query: json!({"filter": [{"column": "name", "operator": "=", "value": "chat"}]}),
            config,
        })
        .await
        .expect("failed to create batch action")
}
