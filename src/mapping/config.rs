//! Declarative mapping configuration.
//!
//! Wire format (camelCase JSON, as stored in a batch action's `config`):
//!
//! ```json
//! {
//!   "input": { "mode": "full" },
//!   "expectedOutput": {
//!     "mode": "custom",
//!     "custom": { "type": "root", "rootConfig": { "sourceField": "output", "jsonPath": "$.answer" } }
//!   },
//!   "metadata": {
//!     "mode": "custom",
//!     "custom": {
//!       "type": "keyValueMap",
//!       "keyValueMapConfig": {
//!         "entries": [{ "key": "context.user_id", "sourceField": "metadata", "value": "$.user.id" }]
//!       }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One of the three semantic slots of a source record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceField {
    Input,
    Output,
    Metadata,
}

impl SourceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Metadata => "metadata",
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field of the produced dataset item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    Input,
    ExpectedOutput,
    Metadata,
}

impl TargetField {
    /// Slot read by `full` mode and by the `custom` fallback
    pub fn default_source(&self) -> SourceField {
        match self {
            Self::Input => SourceField::Input,
            Self::ExpectedOutput => SourceField::Output,
            Self::Metadata => SourceField::Metadata,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::ExpectedOutput => "expectedOutput",
            Self::Metadata => "metadata",
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to a record's `input`, `output` and `metadata` slots
pub trait MappingSource {
    fn source_slot(&self, field: SourceField) -> &Value;
}

/// Minimal owned source record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub metadata: Value,
}

impl MappingSource for SourceRecord {
    fn source_slot(&self, field: SourceField) -> &Value {
        match field {
            SourceField::Input => &self.input,
            SourceField::Output => &self.output,
            SourceField::Metadata => &self.metadata,
        }
    }
}

/// How one target field is derived from the source record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FieldMappingConfig {
    /// Copy the default source slot verbatim
    Full,
    /// Explicit null
    None,
    /// Path-driven mapping. A missing sub-config behaves like `Full`.
    Custom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom: Option<CustomMapping>,
    },
    /// Unrecognised mode; behaves like `Full`
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CustomMapping {
    Root {
        #[serde(
            default,
            rename = "rootConfig",
            skip_serializing_if = "Option::is_none"
        )]
        root_config: Option<RootMapping>,
    },
    KeyValueMap {
        #[serde(
            default,
            rename = "keyValueMapConfig",
            skip_serializing_if = "Option::is_none"
        )]
        key_value_map_config: Option<KeyValueMapping>,
    },
    #[serde(other)]
    Unknown,
}

/// Evaluate one path against one source slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootMapping {
    pub source_field: SourceField,
    pub json_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValueMapping {
    #[serde(default)]
    pub entries: Vec<KeyValueEntry>,
}

/// One key of a key-value mapping.
///
/// `value` starting with `$` is a path expression evaluated against
/// `source_field`; anything else is a literal string. An absent value skips the
/// entry; an empty string is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValueEntry {
    pub key: String,
    pub source_field: SourceField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl KeyValueEntry {
    pub fn json_path(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| v.starts_with('$'))
    }
}

/// Mapping for the three target fields of a dataset item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMappingConfig {
    #[serde(default = "full_mapping")]
    pub input: FieldMappingConfig,
    #[serde(default = "full_mapping")]
    pub expected_output: FieldMappingConfig,
    #[serde(default = "none_mapping")]
    pub metadata: FieldMappingConfig,
}

fn full_mapping() -> FieldMappingConfig {
    FieldMappingConfig::Full
}

fn none_mapping() -> FieldMappingConfig {
    FieldMappingConfig::None
}

impl Default for DatasetMappingConfig {
    fn default() -> Self {
        Self {
            input: full_mapping(),
            expected_output: full_mapping(),
            metadata: none_mapping(),
        }
    }
}

impl DatasetMappingConfig {
    pub fn for_target(&self, target: TargetField) -> &FieldMappingConfig {
        match target {
            TargetField::Input => &self.input,
            TargetField::ExpectedOutput => &self.expected_output,
            TargetField::Metadata => &self.metadata,
        }
    }
}
