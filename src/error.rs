//! Error types for the batch action engine.
//!
//! Per-record and per-chunk failures never surface as `BatchActionError`s to the
//! caller of a runner; they are folded into the job's counters and log. These
//! errors cover the collaborator seams (store, sink, selector, scheduler) and
//! the few conditions that stop a job before it starts.

use crate::constants::BatchActionStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchActionError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Batch action {batch_action_id} not found in project {project_id}")]
    NotFound {
        project_id: String,
        batch_action_id: String,
    },
    #[error("Invalid status transition for batch action {batch_action_id}: {from} -> {to}")]
    InvalidStatusTransition {
        batch_action_id: String,
        from: BatchActionStatus,
        to: BatchActionStatus,
    },
    #[error("Sink error: {0}")]
    SinkError(String),
    #[error("Selection error: {0}")]
    SelectionError(String),
    #[error("Scheduling error: {0}")]
    SchedulingError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for BatchActionError {
    fn from(error: serde_json::Error) -> Self {
        BatchActionError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<sqlx::Error> for BatchActionError {
    fn from(err: sqlx::Error) -> Self {
        BatchActionError::DatabaseError(err.to_string())
    }
}

impl From<crate::config::ConfigurationError> for BatchActionError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        BatchActionError::ConfigurationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BatchActionError>;
