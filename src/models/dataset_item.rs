//! Dataset items produced by mapping, and the sink's bulk-create report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dataset item ready for the sink's bulk create.
///
/// Fields that resolved to no value are `None` and omitted on the wire, which
/// is different from an explicit JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDatasetItem {
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub source_trace_id: String,
    pub source_observation_id: String,
}

/// Validation failure for one submitted item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemValidationError {
    /// Position of the item in the submitted batch
    pub item_index: usize,
    pub message: String,
}

/// Result of one bulk create call. Partial success is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateOutcome {
    pub success: bool,
    pub success_count: u64,
    pub failed_count: u64,
    #[serde(default)]
    pub validation_errors: Vec<ItemValidationError>,
}

impl BulkCreateOutcome {
    pub fn all_succeeded(count: u64) -> Self {
        Self {
            success: true,
            success_count: count,
            failed_count: 0,
            validation_errors: Vec::new(),
        }
    }
}
