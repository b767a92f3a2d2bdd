//! Bookkeeping commit and reindex
//!
//! After every export attempt the record's bookkeeping is updated with one
//! read-modify-write against the store, guarded by the version read. The record's
//! modification instant is never written, so bookkeeping never creates export work of
//! its own. The committed state is then read back and pushed to the search index.

use crate::adapters::traits::{RecordStore, SearchIndex};
use crate::domain::{
    CatalogRecord, ControlNumber, ExportError, LegacyId, RecordId, Result, StoreError,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// A bookkeeping change to apply to a record after an export attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookkeepingUpdate {
    /// A create succeeded: record the control number APIX assigned and clear the flag
    AssignLegacyId(ControlNumber),

    /// The attempt failed: flag the record for retry
    MarkFailed {
        /// When the attempt failed
        at: DateTime<Utc>,
    },

    /// An update or delete succeeded: clear the flag
    ClearFailure,
}

impl BookkeepingUpdate {
    /// Applies the change to a record. Returns whether anything changed.
    ///
    /// A legacy identifier already present is never replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Structure`] if the record cannot hold the identifiers.
    pub fn apply(&self, record: &mut CatalogRecord) -> Result<bool> {
        match self {
            BookkeepingUpdate::AssignLegacyId(number) => {
                let cleared = record.set_failed(None);

                if let Some(existing) = record.legacy_id() {
                    tracing::warn!(
                        record_id = %record.id,
                        existing = %existing,
                        assigned = %number,
                        "Record already has a legacy identifier, keeping it"
                    );
                    return Ok(cleared);
                }

                let legacy_id = LegacyId::new(record.collection(), number.clone())
                    .map_err(ExportError::Structure)?;

                let mut changed = cleared;
                changed |= record.add_identifier(&legacy_id.record_uri())?;
                changed |= record.add_thing_identifier(&legacy_id.resource_uri())?;
                changed |= record.set_control_number(number.as_str())?;
                Ok(changed)
            }
            BookkeepingUpdate::MarkFailed { at } => Ok(record.set_failed(Some(*at))),
            BookkeepingUpdate::ClearFailure => Ok(record.set_failed(None)),
        }
    }
}

impl fmt::Display for BookkeepingUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookkeepingUpdate::AssignLegacyId(number) => write!(f, "assign legacy id {number}"),
            BookkeepingUpdate::MarkFailed { .. } => f.write_str("mark failed"),
            BookkeepingUpdate::ClearFailure => f.write_str("clear failure"),
        }
    }
}

/// Applies bookkeeping updates and reindexes the result
pub struct Committer {
    store: Arc<dyn RecordStore>,
    index: Arc<dyn SearchIndex>,
}

impl Committer {
    /// Create a new committer
    pub fn new(store: Arc<dyn RecordStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    /// Commits one update and pushes the committed record to the search index
    ///
    /// Exactly one write attempt is made. When the update changes nothing the write is
    /// skipped, but the record is still re-read and reindexed. Returns the record as
    /// indexed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the record is gone before the write
    /// - [`StoreError::Conflict`] if it changed since it was read
    /// - [`ExportError::Consistency`] if it cannot be read back after the write
    /// - any index error
    pub async fn commit_and_reindex(
        &self,
        id: &RecordId,
        update: &BookkeepingUpdate,
    ) -> Result<CatalogRecord> {
        let versioned = self
            .store
            .load(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut record = versioned.value;
        if update.apply(&mut record)? {
            self.store
                .compare_and_set(&record, &versioned.version)
                .await?;
            tracing::debug!(record_id = %id, update = %update, "Bookkeeping committed");
        } else {
            tracing::debug!(record_id = %id, update = %update, "Bookkeeping unchanged");
        }

        let current = self.store.load(id).await?.ok_or_else(|| {
            ExportError::Consistency(format!(
                "Record {id} must be in the store but cannot be retrieved"
            ))
        })?;

        self.index.index(&current.value).await?;

        Ok(current.value)
    }
}
