//! Operation classification
//!
//! Decides which APIX call a record needs from its state alone.

use crate::domain::{CatalogRecord, LegacyId};
use std::fmt;

/// APIX call needed to bring the legacy system in line with a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApixOperation {
    /// The record has no legacy counterpart yet
    Create,

    /// The record already has this legacy identifier
    Update(LegacyId),

    /// The record is deleted; `None` if it never reached the legacy system
    Delete(Option<LegacyId>),
}

impl ApixOperation {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ApixOperation::Create => "create",
            ApixOperation::Update(_) => "update",
            ApixOperation::Delete(_) => "delete",
        }
    }
}

impl fmt::Display for ApixOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApixOperation::Create => f.write_str("create"),
            ApixOperation::Update(id) => write!(f, "update {id}"),
            ApixOperation::Delete(Some(id)) => write!(f, "delete {id}"),
            ApixOperation::Delete(None) => f.write_str("delete (never exported)"),
        }
    }
}

/// Classifies a record: deleted wins, then an existing legacy identifier, else create
///
/// # Examples
///
/// ```
/// use apix_export::core::export::{classify, ApixOperation};
/// use apix_export::domain::{CatalogRecord, Manifest, RecordId};
/// use chrono::Utc;
/// use serde_json::json;
///
/// let record = CatalogRecord {
///     id: RecordId::new("fxql7jqr38b1dkf").unwrap(),
///     data: json!({"@graph": [{"@id": "https://libris.kb.se/fxql7jqr38b1dkf"}]}),
///     manifest: Manifest { collection: Some("bib".to_string()), ..Default::default() },
///     modified: Utc::now(),
///     deleted: false,
/// };
/// assert_eq!(classify(&record), ApixOperation::Create);
/// ```
pub fn classify(record: &CatalogRecord) -> ApixOperation {
    let legacy_id = record.legacy_id();
    if record.deleted {
        ApixOperation::Delete(legacy_id)
    } else if let Some(legacy_id) = legacy_id {
        ApixOperation::Update(legacy_id)
    } else {
        ApixOperation::Create
    }
}
