//! # Batch Action Configuration
//!
//! YAML-based configuration for the batch action engine. A single
//! `config/batch-actions.yaml` holds base settings; optional `development`,
//! `test` and `production` sections are deep-merged over the base for the
//! detected environment.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use batch_action_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//!
//! let chunk_size = manager.config().dataset_mapping.chunk_size;
//! let concurrency = manager.config().evaluation.max_concurrency;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchActionsConfig {
    /// Environment the configuration was resolved for; set by the loader
    pub environment: String,
    pub database: DatabaseConfig,
    pub dataset_mapping: DatasetMappingSettings,
    pub evaluation: EvaluationSettings,
    pub summary: SummarySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; `${DATABASE_URL}` reads the environment variable
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Some("${DATABASE_URL}".to_string()),
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection URL, expanding `${VAR}` placeholders
    pub fn database_url(&self) -> String {
        let raw = self.url.as_deref().unwrap_or("${DATABASE_URL}");
        match raw.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            Some(var_name) => std::env::var(var_name).unwrap_or_default(),
            None => raw.to_string(),
        }
    }
}

/// Tuning for the chunked add-to-dataset runner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetMappingSettings {
    pub chunk_size: usize,
    /// Persist progress every N chunks; the final chunk always persists
    pub progress_write_interval_chunks: usize,
    pub max_errors_per_chunk: usize,
    pub max_retained_errors: usize,
}

impl Default for DatasetMappingSettings {
    fn default() -> Self {
        Self {
            chunk_size: defaults::DATASET_CHUNK_SIZE,
            progress_write_interval_chunks: defaults::PROGRESS_WRITE_INTERVAL_CHUNKS,
            max_errors_per_chunk: defaults::MAX_ERRORS_PER_CHUNK,
            max_retained_errors: defaults::MAX_RETAINED_ERRORS,
        }
    }
}

/// Tuning for the streaming evaluation runner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluationSettings {
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub max_retained_errors: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            batch_size: defaults::EVALUATION_BATCH_SIZE,
            max_concurrency: defaults::EVALUATION_MAX_CONCURRENCY,
            max_retained_errors: defaults::MAX_RETAINED_ERRORS,
        }
    }
}

/// Shape of the final `log` written on a job
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarySettings {
    pub max_error_lines: usize,
    pub max_log_chars: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            max_error_lines: defaults::SUMMARY_MAX_ERROR_LINES,
            max_log_chars: defaults::SUMMARY_MAX_LOG_CHARS,
        }
    }
}

impl BatchActionsConfig {
    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "max connections must be greater than 0",
            ));
        }

        let positive = [
            ("dataset_mapping.chunk_size", self.dataset_mapping.chunk_size),
            (
                "dataset_mapping.progress_write_interval_chunks",
                self.dataset_mapping.progress_write_interval_chunks,
            ),
            (
                "dataset_mapping.max_errors_per_chunk",
                self.dataset_mapping.max_errors_per_chunk,
            ),
            (
                "dataset_mapping.max_retained_errors",
                self.dataset_mapping.max_retained_errors,
            ),
            ("evaluation.batch_size", self.evaluation.batch_size),
            ("evaluation.max_concurrency", self.evaluation.max_concurrency),
            (
                "evaluation.max_retained_errors",
                self.evaluation.max_retained_errors,
            ),
            ("summary.max_log_chars", self.summary.max_log_chars),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "value must be greater than 0",
                ));
            }
        }

        if self.dataset_mapping.max_errors_per_chunk > self.dataset_mapping.max_retained_errors {
            return Err(ConfigurationError::invalid_value(
                "dataset_mapping.max_errors_per_chunk",
                self.dataset_mapping.max_errors_per_chunk.to_string(),
                "per-chunk error samples cannot exceed max_retained_errors",
            ));
        }

        Ok(())
    }

    pub fn database_url(&self) -> String {
        self.database.database_url()
    }

    pub fn is_test_environment(&self) -> bool {
        self.environment == "test"
    }

    pub fn is_production_environment(&self) -> bool {
        self.environment == "production"
    }
}
