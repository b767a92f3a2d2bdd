//! Collaborator traits
//!
//! The exporter talks to four external systems: the primary record store, the APIX
//! legacy endpoint, the format converter and the search index. Each is reached through
//! one of the traits below so the export pipeline can be driven by in-memory
//! implementations in tests.

use crate::adapters::apix::ApixRequest;
use crate::core::state::ExportCursor;
use crate::domain::{CatalogRecord, ControlNumber, ExportError, RecordId, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Opaque compare token handed out with a read and checked on write
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wraps a store-specific version value
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value read from the store together with its version
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// The value as read
    pub value: T,

    /// Version of the value at read time
    pub version: VersionToken,
}

/// A selected row whose data or manifest could not be decoded
///
/// Only its id and modification instant are known, which is enough to report it and to
/// move past it.
#[derive(Debug)]
pub struct UnreadableRecord {
    /// Internal id of the row
    pub id: RecordId,

    /// Modification instant of the row
    pub modified: DateTime<Utc>,

    /// Why the row could not be decoded
    pub error: ExportError,
}

/// Rows returned by a batch selection
#[derive(Debug, Default)]
pub struct SelectedRecords {
    /// Rows decoded into records
    pub records: Vec<CatalogRecord>,

    /// Rows that could not be decoded
    pub unreadable: Vec<UnreadableRecord>,
}

impl From<Vec<CatalogRecord>> for SelectedRecords {
    fn from(records: Vec<CatalogRecord>) -> Self {
        Self {
            records,
            unreadable: Vec::new(),
        }
    }
}

/// Primary catalog store
///
/// The exporter never assumes it is the only writer. All writes go through
/// [`RecordStore::compare_and_set`], which must refuse a stale version.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every eligible record sharing the smallest modification instant after the cursor
    ///
    /// Eligible means not a `definitions` record and not last changed by the legacy
    /// system itself. Returns an empty selection when nothing newer exists. A row that
    /// cannot be decoded is returned as [`UnreadableRecord`] and never fails the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn select_next_batch(&self, cursor: &ExportCursor) -> Result<SelectedRecords>;

    /// Every record currently carrying the export failure flag
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn select_failed(&self) -> Result<SelectedRecords>;

    /// Reads one record with its version, `None` if it does not exist
    async fn load(&self, id: &RecordId) -> Result<Option<Versioned<CatalogRecord>>>;

    /// Writes data and manifest of `record` if the stored version still equals `version`
    ///
    /// Must not change the record's modification instant.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::StoreError::Conflict`] if the record changed since it
    /// was read, or another store error if the write fails.
    async fn compare_and_set(&self, record: &CatalogRecord, version: &VersionToken) -> Result<()>;
}

/// The APIX legacy endpoint
#[async_trait]
pub trait LegacyEndpoint: Send + Sync {
    /// Executes one request and interprets the response
    ///
    /// Returns the control number from the `Location` header on 201/303, `None` on a
    /// successful DELETE.
    async fn execute(&self, request: &ApixRequest) -> Result<Option<ControlNumber>>;
}

/// Catalog record to legacy wire format conversion
#[async_trait]
pub trait FormatConverter: Send + Sync {
    /// Converts a record to the XML text sent to APIX
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ExportError::Translation`] if the record cannot be converted.
    async fn convert(&self, record: &CatalogRecord) -> Result<String>;
}

/// Secondary search index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Pushes the current state of a record into the index
    async fn index(&self, record: &CatalogRecord) -> Result<()>;
}
