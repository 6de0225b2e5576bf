//! # Path Evaluator
//!
//! Thin wrapper over `jsonpath_lib` that gives path evaluation the semantics the
//! mapping compiler depends on:
//!
//! - string documents are JSON-decoded before evaluation (a string that is not
//!   valid JSON is evaluated as a plain string scalar)
//! - a path selecting exactly one node returns that node, not a one-element array
//! - a path selecting nothing returns [`PathMatch::NoMatch`], which is distinct
//!   from a match on a JSON `null`
//! - malformed expressions return [`PathEvaluationError`]

use jsonpath_lib::select;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathEvaluationError {
    #[error("Invalid JSONPath expression '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Outcome of evaluating a path against a document
#[derive(Debug, Clone, PartialEq)]
pub enum PathMatch {
    /// One node, or an array of nodes when several matched
    Found(Value),
    NoMatch,
}

impl PathMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_option(self) -> Option<Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::NoMatch => None,
        }
    }
}

/// Result of validating an expression against a sample document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathTestResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct PathEvaluator;

impl PathEvaluator {
    /// Validate `path` against `data` without returning the selected nodes.
    pub fn test(path: &str, data: &Value) -> PathTestResult {
        let document = decode_document(data);
        match select(&document, path) {
            Ok(_) => PathTestResult {
                success: true,
                error: None,
            },
            Err(err) => PathTestResult {
                success: false,
                error: Some(err.to_string()),
            },
        }
    }

    /// Evaluate `path` against `data`.
    pub fn evaluate(data: &Value, path: &str) -> Result<PathMatch, PathEvaluationError> {
        let document = decode_document(data);
        let mut hits = select(&document, path).map_err(|e| PathEvaluationError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let matched = match hits.len() {
            0 => PathMatch::NoMatch,
            1 => PathMatch::Found(hits.remove(0).clone()),
            _ => PathMatch::Found(Value::Array(hits.into_iter().cloned().collect())),
        };
        Ok(matched)
    }
}

fn decode_document(data: &Value) -> Cow<'_, Value> {
    match data {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(decoded) => Cow::Owned(decoded),
            Err(_) => Cow::Borrowed(data),
        },
        _ => Cow::Borrowed(data),
    }
}
