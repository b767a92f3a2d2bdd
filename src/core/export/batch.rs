//! Batch processing
//!
//! Exports the records of one batch strictly one at a time. Each record goes through
//! classify, convert, send and parse, and always ends with a bookkeeping commit and a
//! reindex, whether the export worked or not. A failing record never aborts the batch;
//! only a failing batch selection does. Rows the store could not decode count as failed
//! records of their batch.

use crate::adapters::apix::ApixUrls;
use crate::adapters::traits::{FormatConverter, LegacyEndpoint, RecordStore, SearchIndex};
use crate::core::export::classify::classify;
use crate::core::export::commit::{BookkeepingUpdate, Committer};
use crate::core::export::dispatch::export_record;
use crate::core::export::selector::{select_batch, BatchSelection};
use crate::core::export::summary::BatchResult;
use crate::core::state::ExportCursor;
use crate::domain::{CatalogRecord, ExportError, Result};
use crate::logging::StatusSink;
use crate::{log_record_exported, log_record_failed};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

/// Runs batch passes against the collaborators
pub struct BatchProcessor {
    store: Arc<dyn RecordStore>,
    endpoint: Arc<dyn LegacyEndpoint>,
    converter: Arc<dyn FormatConverter>,
    committer: Committer,
    urls: ApixUrls,
    status: Arc<dyn StatusSink>,
}

impl BatchProcessor {
    /// Create a new batch processor
    pub fn new(
        store: Arc<dyn RecordStore>,
        endpoint: Arc<dyn LegacyEndpoint>,
        converter: Arc<dyn FormatConverter>,
        index: Arc<dyn SearchIndex>,
        urls: ApixUrls,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            committer: Committer::new(store.clone(), index),
            store,
            endpoint,
            converter,
            urls,
            status,
        }
    }

    /// Runs one batch pass
    ///
    /// A non-empty next-timestamp batch moves the cursor to its instant, whatever the
    /// outcome of its records: failed records are picked up by the previously-failed
    /// passes from then on.
    ///
    /// # Errors
    ///
    /// Returns an error only if the batch cannot be selected.
    pub async fn process(
        &self,
        selection: BatchSelection,
        cursor: &mut ExportCursor,
    ) -> Result<BatchResult> {
        let batch = select_batch(self.store.as_ref(), selection, cursor).await?;
        let mut result = BatchResult::new(selection);

        if batch.is_empty() {
            tracing::trace!(batch = %selection, "Nothing to export");
            return Ok(result);
        }

        tracing::debug!(
            batch = %selection,
            cursor = %cursor.describe(),
            size = batch.len(),
            "Processing batch"
        );

        for record in &batch.records {
            match self.export_one(record, selection).await {
                Ok(()) => result.add_success(),
                Err(e) => {
                    log_record_failed!(record.id, e);
                    self.status.output(&format!(
                        "Failed to export {}, will automatically try again at a later time.",
                        record.id
                    ));
                    result.add_failure(record.id.clone(), e.to_string());
                }
            }
        }

        for unreadable in &batch.unreadable {
            log_record_failed!(unreadable.id, unreadable.error);
            self.status.output(&format!(
                "Failed to export {}, will automatically try again at a later time.",
                unreadable.id
            ));
            result.add_failure(unreadable.id.clone(), unreadable.error.to_string());
        }

        match selection {
            BatchSelection::NextTimestamp => {
                if let Some(timestamp) = batch.timestamp() {
                    cursor.advance(timestamp);
                    result.timestamp = Some(timestamp);
                    self.status.output(&format!(
                        "Completed export of {} out of {} document(s) with modified = {}",
                        result.successful,
                        result.attempted,
                        timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
                    ));
                }
            }
            BatchSelection::PreviouslyFailed => {
                self.status.output(&format!(
                    "Completed export of {} out of {} document(s) queued for retry.",
                    result.successful, result.attempted
                ));
            }
        }

        Ok(result)
    }

    /// Exports one record and commits the outcome
    async fn export_one(&self, record: &CatalogRecord, selection: BatchSelection) -> Result<()> {
        let operation = classify(record);

        let exported = export_record(
            &self.urls,
            self.endpoint.as_ref(),
            self.converter.as_ref(),
            record,
            &operation,
        )
        .await;

        let assigned = match exported {
            Ok(assigned) => assigned,
            Err(e) => {
                self.commit_failure(record).await;
                return Err(e);
            }
        };

        let update = match assigned {
            Some(number) => BookkeepingUpdate::AssignLegacyId(number),
            None => BookkeepingUpdate::ClearFailure,
        };

        match self.committer.commit_and_reindex(&record.id, &update).await {
            Ok(_) => {
                log_record_exported!(record.id, operation, record.collection());
                tracing::debug!(record_id = %record.id, batch = %selection, update = %update, "Record committed");
                Ok(())
            }
            // The bookkeeping write went through; flagging again would hide that
            Err(e @ ExportError::Consistency(_)) => Err(e),
            Err(e @ ExportError::Index(_)) => {
                tracing::error!(
                    record_id = %record.id,
                    update = %update,
                    error = %e,
                    "Bookkeeping committed but the search index could not be updated"
                );
                self.commit_failure(record).await;
                Err(e)
            }
            Err(e) => {
                tracing::error!(
                    record_id = %record.id,
                    update = %update,
                    error = %e,
                    "APIX accepted the record but its bookkeeping could not be committed"
                );
                self.commit_failure(record).await;
                Err(e)
            }
        }
    }

    /// Flags a record for retry. A failure here can only be logged.
    async fn commit_failure(&self, record: &CatalogRecord) {
        let update = BookkeepingUpdate::MarkFailed { at: Utc::now() };
        if let Err(e) = self.committer.commit_and_reindex(&record.id, &update).await {
            tracing::error!(
                record_id = %record.id,
                error = %e,
                "Failed to flag record for retry"
            );
        }
    }
}
