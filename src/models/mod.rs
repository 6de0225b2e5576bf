pub mod batch_action;
pub mod dataset_item;
pub mod observation;

// Re-export core models for easy access
pub use batch_action::{
    AddToDatasetConfig, BatchAction, BatchActionConfig, BatchActionUpdate, NewBatchAction,
    RunEvaluationConfig,
};
pub use dataset_item::{BulkCreateOutcome, ItemValidationError, NewDatasetItem};
pub use observation::{EvaluationTarget, ObservationRecord};
