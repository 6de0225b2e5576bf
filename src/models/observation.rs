//! Source records handed to the runners by the record selector.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapping::{MappingSource, SourceField};

/// An observation selected for an `add-to-dataset` action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    pub id: String,
    pub trace_id: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub metadata: Value,
}

impl MappingSource for ObservationRecord {
    fn source_slot(&self, field: SourceField) -> &Value {
        match field {
            SourceField::Input => &self.input,
            SourceField::Output => &self.output,
            SourceField::Metadata => &self.metadata,
        }
    }
}

/// A record selected for a `run-evaluation` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationTarget {
    pub trace_id: String,
    #[serde(default)]
    pub observation_id: Option<String>,
}

impl EvaluationTarget {
    /// Identifier used in error lines
    pub fn display_id(&self) -> &str {
        self.observation_id.as_deref().unwrap_or(&self.trace_id)
    }
}
