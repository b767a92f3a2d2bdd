//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use crate::core::export::selector::BatchSelection;
use crate::domain::RecordId;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A record whose export attempt failed
#[derive(Debug, Clone)]
pub struct RecordFailure {
    /// The record
    pub record_id: RecordId,

    /// What went wrong
    pub message: String,
}

/// Result of one batch pass
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// How the batch was selected
    pub selection: BatchSelection,

    /// Number of records in the batch
    pub attempted: usize,

    /// Number of records exported and committed
    pub successful: usize,

    /// Records that failed
    pub failures: Vec<RecordFailure>,

    /// Defining instant of a next-timestamp batch
    pub timestamp: Option<DateTime<Utc>>,
}

impl BatchResult {
    /// Create a new empty batch result
    pub fn new(selection: BatchSelection) -> Self {
        Self {
            selection,
            attempted: 0,
            successful: 0,
            failures: Vec::new(),
            timestamp: None,
        }
    }

    /// Add a successful export
    pub fn add_success(&mut self) {
        self.attempted += 1;
        self.successful += 1;
    }

    /// Add a failed export
    pub fn add_failure(&mut self, record_id: RecordId, message: String) {
        self.attempted += 1;
        self.failures.push(RecordFailure { record_id, message });
    }

    /// Number of failed records
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether the pass found anything to do
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}

/// Summary of an exporter run
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Loop iterations completed
    pub iterations: usize,

    /// Non-empty batch passes completed
    pub batches: usize,

    /// Batch passes aborted by a store error
    pub aborted_batches: usize,

    /// Number of successful record exports
    pub successful_exports: usize,

    /// Number of failed record exports
    pub failed_exports: usize,

    /// Cursor position at the end of the run
    pub cursor: Option<DateTime<Utc>>,

    /// Duration of the run
    pub duration: Duration,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Adds the counts of one batch pass
    pub fn record_batch(&mut self, result: &BatchResult) {
        if result.is_empty() {
            return;
        }
        self.batches += 1;
        self.successful_exports += result.successful;
        self.failed_exports += result.failed();
    }

    /// Total number of export attempts
    pub fn total_attempts(&self) -> usize {
        self.successful_exports + self.failed_exports
    }

    /// Check if the run was free of failures
    pub fn is_successful(&self) -> bool {
        self.failed_exports == 0 && self.aborted_batches == 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_attempts() == 0 {
            return 100.0;
        }
        (self.successful_exports as f64 / self.total_attempts() as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            iterations = self.iterations,
            batches = self.batches,
            aborted_batches = self.aborted_batches,
            successful = self.successful_exports,
            failed = self.failed_exports,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Exporter stopped"
        );
    }
}
