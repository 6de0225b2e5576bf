//! # Field Mapping
//!
//! Declarative JSONPath-driven mapping from an observation's `input`, `output`
//! and `metadata` slots to the fields of a dataset item.
//!
//! - [`path_evaluator`]: JSONPath evaluation with match/no-match semantics
//! - [`config`]: the mapping configuration types
//! - [`compiler`]: applies a configuration to a record, collecting mapping errors
//! - [`nested`]: prototype-safe dotted-key assignment
//! - [`suggestions`]: candidate paths for editor autocomplete

pub mod compiler;
pub mod config;
pub mod nested;
pub mod path_evaluator;
pub mod suggestions;

pub use compiler::{
    apply_field_mapping_config, apply_full_mapping, MappedFields, MappingError,
    MappingErrorType, MappingEvaluationError, MappingMiss,
};
pub use config::{
    CustomMapping, DatasetMappingConfig, FieldMappingConfig, KeyValueEntry, KeyValueMapping,
    MappingSource, RootMapping, SourceField, SourceRecord, TargetField,
};
pub use path_evaluator::{PathEvaluationError, PathEvaluator, PathMatch, PathTestResult};
pub use suggestions::{suggest_json_paths, suggest_paths};
