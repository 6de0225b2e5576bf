//! # Batch Action Engine
//!
//! Runs a batch action from `Queued` to exactly one terminal status.
//!
//! ## Core Components
//!
//! - [`BatchActionProcessor`]: loads a job, parses its config and dispatches it
//! - [`ChunkedBatchRunner`]: chunk-sequential runner for materialized record lists
//!   (`add-to-dataset`)
//! - [`StreamingConcurrentRunner`]: batch-sequential, item-parallel runner over a
//!   record stream (`run-evaluation`)
//! - [`progress`]: counters, capped error samples and the final log summary
//! - [`types`]: collaborator contracts (record selection, sinks, schedulers)
//!
//! Every failure below a chunk or batch boundary is converted into counters and
//! a capped error sample. Errors escape a runner only when the job store itself
//! cannot record the start or the end of the job.

pub mod chunked_runner;
pub mod evaluation;
pub mod processor;
pub mod progress;
pub mod streaming_runner;
pub mod types;

pub use chunked_runner::ChunkedBatchRunner;
pub use evaluation::EvaluationSchedulingOperation;
pub use processor::BatchActionProcessor;
pub use progress::{build_summary, ErrorSamples, JobCounters};
pub use streaming_runner::StreamingConcurrentRunner;
pub use types::{
    DatasetItemSink, EvaluationScheduler, JobOutcome, RecordOperation, RecordSelector,
    RecordStream,
};
