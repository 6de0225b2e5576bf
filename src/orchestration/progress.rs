//! Counters, capped error samples and the final log summary shared by both
//! runners.

use crate::config::SummarySettings;
use crate::constants::BatchActionStatus;
use crate::models::BatchActionUpdate;

use super::types::JobOutcome;

/// Running totals for one job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounters {
    pub total: u64,
    pub processed: u64,
    pub failed: u64,
}

impl JobCounters {
    pub fn with_total(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_processed(&mut self, count: u64) {
        self.processed += count;
    }

    pub fn record_failed(&mut self, count: u64) {
        self.failed += count;
    }

    pub fn final_status(&self) -> BatchActionStatus {
        BatchActionStatus::from_counts(self.processed, self.failed)
    }

    pub fn progress_update(&self) -> BatchActionUpdate {
        BatchActionUpdate::progress(self.total, self.processed, self.failed)
    }

    pub fn outcome(&self, log: Option<String>) -> JobOutcome {
        JobOutcome {
            status: self.final_status(),
            total_count: self.total,
            processed_count: self.processed,
            failed_count: self.failed,
            log,
        }
    }
}

/// Bounded list of error lines kept for the job log
#[derive(Debug, Clone)]
pub struct ErrorSamples {
    lines: Vec<String>,
    max_retained: usize,
}

impl ErrorSamples {
    pub fn new(max_retained: usize) -> Self {
        Self {
            lines: Vec::new(),
            max_retained,
        }
    }

    /// Keep `line` if there is room; returns whether it was kept
    pub fn push(&mut self, line: impl Into<String>) -> bool {
        if self.lines.len() >= self.max_retained {
            return false;
        }
        self.lines.push(line.into());
        true
    }

    /// Keep at most `per_chunk` of `lines`, within the overall cap
    pub fn extend_capped<I>(&mut self, lines: I, per_chunk: usize)
    where
        I: IntoIterator<Item = String>,
    {
        for line in lines.into_iter().take(per_chunk) {
            if !self.push(line) {
                break;
            }
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// `"<headline>: <first N lines>"`, truncated to `max_log_chars`.
///
/// Returns `None` when nothing failed so the job's `log` stays null.
pub fn build_summary(
    failed: u64,
    headline: &str,
    samples: &ErrorSamples,
    settings: &SummarySettings,
) -> Option<String> {
    if failed == 0 {
        return None;
    }

    let shown = samples.len().min(settings.max_error_lines);
    let mut summary = if shown == 0 {
        headline.to_string()
    } else {
        format!("{headline}: {}", samples.lines()[..shown].join("; "))
    };
    if samples.len() > shown {
        summary.push_str(&format!(" (and {} more)", samples.len() - shown));
    }

    Some(truncate_chars(summary, settings.max_log_chars))
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";
    if text.chars().count() <= max_chars {
        return text;
    }
    if max_chars <= ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
