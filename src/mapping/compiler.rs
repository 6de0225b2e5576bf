//! # Field Mapping Compiler
//!
//! Turns a [`DatasetMappingConfig`] plus a source record into the three fields of
//! a dataset item.
//!
//! Resolved values are `Option<Value>`: `None` is an absent value (a path that
//! matched nothing, or a field whose evaluation failed) and is distinct from
//! `Some(Value::Null)`. Misses and evaluation failures are reported as
//! [`MappingError`] records; one bad expression never stops the other fields
//! from resolving.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::config::{
    CustomMapping, DatasetMappingConfig, FieldMappingConfig, KeyValueMapping, MappingSource,
    SourceField, TargetField,
};
use super::nested;
use super::path_evaluator::{PathEvaluationError, PathEvaluator, PathMatch};

/// A path that matched nothing
#[derive(Debug, Clone, PartialEq)]
pub struct MappingMiss {
    pub source_field: SourceField,
    pub json_path: String,
    /// Key of the key-value entry; `None` for root mappings
    pub mapping_key: Option<String>,
}

/// Evaluation failure with the context needed to report it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{source}")]
pub struct MappingEvaluationError {
    pub source_field: SourceField,
    pub json_path: String,
    pub mapping_key: Option<String>,
    #[source]
    pub source: PathEvaluationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingErrorType {
    JsonPathMiss,
    JsonPathError,
}

/// Per-field mapping outcome; produced, never raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingError {
    #[serde(rename = "type")]
    pub error_type: MappingErrorType,
    pub target_field: TargetField,
    pub source_field: SourceField,
    pub json_path: String,
    pub mapping_key: Option<String>,
    pub message: String,
}

impl MappingError {
    fn miss(target_field: TargetField, miss: MappingMiss) -> Self {
        let message = match &miss.mapping_key {
            Some(key) => format!(
                "JSONPath '{}' for key '{}' did not match any data in {} (target: {})",
                miss.json_path, key, miss.source_field, target_field
            ),
            None => format!(
                "JSONPath '{}' did not match any data in {} (target: {})",
                miss.json_path, miss.source_field, target_field
            ),
        };
        Self {
            error_type: MappingErrorType::JsonPathMiss,
            target_field,
            source_field: miss.source_field,
            json_path: miss.json_path,
            mapping_key: miss.mapping_key,
            message,
        }
    }

    fn evaluation(target_field: TargetField, err: MappingEvaluationError) -> Self {
        let message = format!("Failed to evaluate mapping for {target_field}: {}", err.source);
        Self {
            error_type: MappingErrorType::JsonPathError,
            target_field,
            source_field: err.source_field,
            json_path: err.json_path,
            mapping_key: err.mapping_key,
            message,
        }
    }
}

/// The three mapped fields of one record plus any mapping errors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedFields {
    pub input: Option<Value>,
    pub expected_output: Option<Value>,
    pub metadata: Option<Value>,
    pub errors: Vec<MappingError>,
}

impl MappedFields {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Resolve one target field.
///
/// `on_miss` is called once for every path that matched nothing. Evaluation
/// errors are returned; the caller decides how to scope them.
pub fn apply_field_mapping_config<S, F>(
    record: &S,
    config: &FieldMappingConfig,
    default_source: SourceField,
    mut on_miss: F,
) -> Result<Option<Value>, MappingEvaluationError>
where
    S: MappingSource + ?Sized,
    F: FnMut(MappingMiss),
{
    let full = || Ok(Some(record.source_slot(default_source).clone()));

    match config {
        FieldMappingConfig::Full | FieldMappingConfig::Unknown => full(),
        FieldMappingConfig::None => Ok(Some(Value::Null)),
        FieldMappingConfig::Custom { custom } => match custom {
            Some(CustomMapping::Root {
                root_config: Some(root),
            }) => resolve_path(record, root.source_field, &root.json_path, None, &mut on_miss),
            Some(CustomMapping::KeyValueMap {
                key_value_map_config: Some(mapping),
            }) => apply_key_value_map(record, mapping, &mut on_miss)
                .map(|object| Some(Value::Object(object))),
            // A custom mode without its detail object falls back to copying the slot
            Some(CustomMapping::Root { root_config: None })
            | Some(CustomMapping::KeyValueMap {
                key_value_map_config: None,
            })
            | Some(CustomMapping::Unknown)
            | None => full(),
        },
    }
}

/// Map all three target fields of a record.
pub fn apply_full_mapping<S>(record: &S, mapping: &DatasetMappingConfig) -> MappedFields
where
    S: MappingSource + ?Sized,
{
    let mut errors = Vec::new();
    let input = map_target_field(record, mapping, TargetField::Input, &mut errors);
    let expected_output =
        map_target_field(record, mapping, TargetField::ExpectedOutput, &mut errors);
    let metadata = map_target_field(record, mapping, TargetField::Metadata, &mut errors);

    MappedFields {
        input,
        expected_output,
        metadata,
        errors,
    }
}

fn map_target_field<S>(
    record: &S,
    mapping: &DatasetMappingConfig,
    target: TargetField,
    errors: &mut Vec<MappingError>,
) -> Option<Value>
where
    S: MappingSource + ?Sized,
{
    let mut misses = Vec::new();
    let result = apply_field_mapping_config(
        record,
        mapping.for_target(target),
        target.default_source(),
        |miss| misses.push(miss),
    );
    errors.extend(misses.into_iter().map(|miss| MappingError::miss(target, miss)));

    match result {
        Ok(value) => value,
        Err(err) => {
            errors.push(MappingError::evaluation(target, err));
            None
        }
    }
}

fn resolve_path<S, F>(
    record: &S,
    source_field: SourceField,
    json_path: &str,
    mapping_key: Option<&str>,
    on_miss: &mut F,
) -> Result<Option<Value>, MappingEvaluationError>
where
    S: MappingSource + ?Sized,
    F: FnMut(MappingMiss),
{
    let data = record.source_slot(source_field);
    match PathEvaluator::evaluate(data, json_path) {
        Ok(PathMatch::Found(value)) => Ok(Some(value)),
        Ok(PathMatch::NoMatch) => {
            on_miss(MappingMiss {
                source_field,
                json_path: json_path.to_string(),
                mapping_key: mapping_key.map(str::to_string),
            });
            Ok(None)
        }
        Err(source) => Err(MappingEvaluationError {
            source_field,
            json_path: json_path.to_string(),
            mapping_key: mapping_key.map(str::to_string),
            source,
        }),
    }
}

fn apply_key_value_map<S, F>(
    record: &S,
    mapping: &KeyValueMapping,
    on_miss: &mut F,
) -> Result<Map<String, Value>, MappingEvaluationError>
where
    S: MappingSource + ?Sized,
    F: FnMut(MappingMiss),
{
    let mut object = Map::new();

    for entry in &mapping.entries {
        let Some(raw_value) = entry.value.as_deref() else {
            continue;
        };

        let resolved = match entry.json_path() {
            Some(path) => {
                resolve_path(record, entry.source_field, path, Some(&entry.key), on_miss)?
            }
            None => Some(Value::String(raw_value.to_string())),
        };

        let written = match resolved {
            Some(value) => nested::set_value(&mut object, &entry.key, value),
            None => nested::unset_value(&mut object, &entry.key),
        };
        if let Err(err) = written {
            warn!(key = %entry.key, error = %err, "Skipping unsafe key-value mapping entry");
        }
    }

    Ok(object)
}
