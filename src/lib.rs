#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Action Core
//!
//! Bulk mutation engine for query-selected observations.
//!
//! ## Overview
//!
//! A batch action applies one operation to every record an upstream query
//! selected, tracking progress and tolerating partial failure:
//!
//! - **add-to-dataset**: each observation is rewritten into a dataset item through
//!   a declarative JSONPath field mapping, then created in bulk, chunk by chunk.
//! - **run-evaluation**: each streamed target gets its configured evaluators
//!   scheduled with bounded concurrency.
//!
//! Every job ends in exactly one of `Completed`, `Partial` or `Failed`, with
//! counters and a bounded log of sampled errors.
//!
//! ## Module Organization
//!
//! - [`mapping`] - JSONPath evaluation, the mapping compiler and path suggestions
//! - [`orchestration`] - job processor and the chunked and streaming runners
//! - [`models`] - batch action records, source records and dataset items
//! - [`database`] - job store trait with PostgreSQL and in-memory implementations
//! - [`config`] - YAML configuration with environment overrides
//! - [`constants`] - job status, action types and tuning defaults
//! - [`logging`] - structured logging setup
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use batch_action_core::mapping::{apply_full_mapping, DatasetMappingConfig, SourceRecord};
//! use serde_json::json;
//!
//! let record = SourceRecord {
//!     input: json!({"question": "2+2?"}),
//!     output: json!({"answer": 4}),
//!     metadata: json!(null),
//! };
//! let mapped = apply_full_mapping(&record, &DatasetMappingConfig::default());
//! assert_eq!(mapped.expected_output, Some(json!({"answer": 4})));
//! assert!(!mapped.has_errors());
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod orchestration;

pub use config::{BatchActionsConfig, ConfigManager, DatabaseConfig};
pub use constants::{BatchActionStatus, BatchActionType};
pub use database::{BatchActionStore, InMemoryBatchActionStore, PgBatchActionStore};
pub use error::{BatchActionError, Result};
pub use models::{BatchAction, BatchActionUpdate, NewBatchAction};
pub use orchestration::{
    BatchActionProcessor, ChunkedBatchRunner, JobOutcome, StreamingConcurrentRunner,
};
