//! Batch selection
//!
//! A batch is either every eligible record sharing the next modification instant after
//! the cursor, or every record currently flagged as failed. Modification instants are
//! nearly unique, so most batches hold a single record; bulk imports produce larger ones.

use crate::adapters::traits::{RecordStore, UnreadableRecord};
use crate::core::state::ExportCursor;
use crate::domain::{CatalogRecord, Collection, Result, LEGACY_SYSTEM_ORIGIN};
use chrono::{DateTime, Utc};
use std::fmt;

/// Which records a batch pass picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSelection {
    /// Records at the smallest modification instant after the cursor
    NextTimestamp,

    /// Records carrying the failure flag
    PreviouslyFailed,
}

impl fmt::Display for BatchSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSelection::NextTimestamp => f.write_str("next-timestamp"),
            BatchSelection::PreviouslyFailed => f.write_str("previously-failed"),
        }
    }
}

/// Records selected for one batch pass
#[derive(Debug)]
pub struct Batch {
    /// How the records were selected
    pub selection: BatchSelection,

    /// The records, in no particular order
    pub records: Vec<CatalogRecord>,

    /// Selected rows that could not be decoded
    pub unreadable: Vec<UnreadableRecord>,
}

impl Batch {
    /// Whether the batch has nothing to export
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.unreadable.is_empty()
    }

    /// Number of rows in the batch, readable or not
    pub fn len(&self) -> usize {
        self.records.len() + self.unreadable.len()
    }

    /// The instant defining a next-timestamp batch
    ///
    /// All rows of such a batch share it, unreadable ones included; the maximum is taken
    /// so a store returning slightly mixed instants can never move the cursor backwards.
    /// `None` for an empty batch or a previously-failed batch.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.selection {
            BatchSelection::NextTimestamp => self
                .records
                .iter()
                .map(|r| r.modified)
                .chain(self.unreadable.iter().map(|u| u.modified))
                .max(),
            BatchSelection::PreviouslyFailed => None,
        }
    }
}

/// Whether a record may be picked up by a next-timestamp batch
///
/// Definitions are administrative and never exported. Records last written by the
/// legacy sync are skipped, otherwise every imported change would be sent straight back.
pub fn is_export_eligible(record: &CatalogRecord) -> bool {
    record.collection() != Collection::Definitions
        && record.manifest.changed_in.as_deref() != Some(LEGACY_SYSTEM_ORIGIN)
}

/// Selects the records for one batch pass
///
/// # Errors
///
/// Returns any store error; the caller aborts the pass.
pub async fn select_batch(
    store: &dyn RecordStore,
    selection: BatchSelection,
    cursor: &ExportCursor,
) -> Result<Batch> {
    let selected = match selection {
        BatchSelection::NextTimestamp => store.select_next_batch(cursor).await?,
        BatchSelection::PreviouslyFailed => store.select_failed().await?,
    };

    Ok(Batch {
        selection,
        records: selected.records,
        unreadable: selected.unreadable,
    })
}
