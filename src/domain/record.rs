//! Catalog record model
//!
//! A catalog record is a JSON-LD document (`data`) plus a bookkeeping manifest. The
//! exporter only reads and writes the handful of fields described here; everything
//! else in both documents is carried through untouched.

use crate::domain::errors::ExportError;
use crate::domain::ids::{Collection, LegacyId, RecordId};
use crate::domain::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Manifest key marking a record whose last export attempt failed
pub const APIX_FAILURE_KEY: &str = "apixExportFailedAt";

/// `changedIn` value of records last written by the legacy sync itself
pub const LEGACY_SYSTEM_ORIGIN: &str = "vcopy";

/// Bookkeeping metadata stored alongside the record data
///
/// Fields the exporter only carries or tests for presence are kept as raw JSON, so other
/// writers are free to put any value there.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Collection name (`bib`, `auth`, `hold`, `definitions`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// System in which the last change was made
    #[serde(rename = "changedIn", default, skip_serializing_if = "Option::is_none")]
    pub changed_in: Option<String>,

    /// Agent that made the last change
    #[serde(rename = "changedBy", default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<Value>,

    /// Instant of the first failed export, present only while the record awaits retry
    ///
    /// Any value marks the record as failed; the exporter writes an RFC 3339 instant.
    #[serde(rename = "apixExportFailedAt", default, skip_serializing_if = "Option::is_none")]
    pub apix_export_failed_at: Option<Value>,

    /// Every other manifest key, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A transient copy of one record from the primary store
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    /// Internal id
    pub id: RecordId,

    /// JSON-LD payload, `{"@graph": [record, thing, ...]}`
    pub data: Value,

    /// Bookkeeping metadata
    pub manifest: Manifest,

    /// Modification instant; the exporter never writes it
    pub modified: DateTime<Utc>,

    /// Soft-delete flag
    pub deleted: bool,
}

impl CatalogRecord {
    /// Collection the record belongs to
    pub fn collection(&self) -> Collection {
        Collection::from(self.manifest.collection.as_deref().unwrap_or_default())
    }

    /// Every identifier of the record: the main `@id` followed by its `sameAs` ids
    pub fn identifiers(&self) -> Vec<String> {
        let Some(entry) = graph_entry(&self.data, 0) else {
            return Vec::new();
        };

        let mut ids = Vec::new();
        if let Some(id) = entry.get("@id").and_then(Value::as_str) {
            ids.push(id.to_string());
        }
        if let Some(same_as) = entry.get("sameAs").and_then(Value::as_array) {
            ids.extend(
                same_as
                    .iter()
                    .filter_map(|s| s.get("@id").and_then(Value::as_str))
                    .map(String::from),
            );
        }
        ids
    }

    /// First legacy identifier among the record's identifiers
    pub fn legacy_id(&self) -> Option<LegacyId> {
        self.identifiers()
            .iter()
            .find_map(|id| LegacyId::from_uri(id))
    }

    /// Whether the record is waiting for an export retry
    pub fn is_failed(&self) -> bool {
        self.manifest.apix_export_failed_at.is_some()
    }

    /// Sets or clears the failure flag. Returns whether the manifest changed.
    ///
    /// A record that is already flagged keeps the instant of its first failure.
    pub fn set_failed(&mut self, at: Option<DateTime<Utc>>) -> bool {
        match at {
            Some(_) if self.is_failed() => false,
            Some(at) => {
                self.manifest.apix_export_failed_at = Some(Value::String(
                    at.to_rfc3339_opts(SecondsFormat::Micros, true),
                ));
                true
            }
            None => self.manifest.apix_export_failed_at.take().is_some(),
        }
    }

    /// Appends a `sameAs` identifier to the record entry (`@graph[0]`)
    pub fn add_identifier(&mut self, uri: &str) -> Result<bool> {
        let id = self.id.clone();
        add_same_as(graph_entry_mut(&mut self.data, 0, &id)?, uri)
    }

    /// Appends a `sameAs` identifier to the thing entry (`@graph[1]`)
    pub fn add_thing_identifier(&mut self, uri: &str) -> Result<bool> {
        let id = self.id.clone();
        add_same_as(graph_entry_mut(&mut self.data, 1, &id)?, uri)
    }

    /// Sets `controlNumber` on the record entry
    pub fn set_control_number(&mut self, number: &str) -> Result<bool> {
        let id = self.id.clone();
        let entry = graph_entry_mut(&mut self.data, 0, &id)?;
        let value = Value::String(number.to_string());
        if entry.get("controlNumber") == Some(&value) {
            return Ok(false);
        }
        entry.insert("controlNumber".to_string(), value);
        Ok(true)
    }

    /// Short id of the bib record a holding belongs to
    ///
    /// Read from `@graph[1].holdingFor["@id"]`, taking what follows `/bib/`.
    pub fn holding_parent_bib_id(&self) -> Result<String> {
        let bib_uri = graph_entry(&self.data, 1)
            .and_then(|thing| thing.get("holdingFor"))
            .and_then(|holding_for| holding_for.get("@id"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExportError::Structure(format!(
                    "Holding {} has no holdingFor reference",
                    self.id
                ))
            })?;

        let (_, short_id) = bib_uri.split_once("/bib/").ok_or_else(|| {
            ExportError::Structure(format!(
                "Holding {} refers to '{}', which is not a bib identifier",
                self.id, bib_uri
            ))
        })?;

        if short_id.is_empty() {
            return Err(ExportError::Structure(format!(
                "Holding {} refers to an empty bib identifier",
                self.id
            )));
        }

        Ok(short_id.to_string())
    }

    /// JSON view used by the search index and the converter
    pub fn to_document(&self) -> Value {
        json!({
            "id": self.id.as_str(),
            "data": self.data,
            "manifest": self.manifest,
            "modified": self.modified.to_rfc3339_opts(SecondsFormat::Micros, true),
            "deleted": self.deleted,
        })
    }
}

fn graph_entry(data: &Value, index: usize) -> Option<&Map<String, Value>> {
    data.get("@graph")?.get(index)?.as_object()
}

fn graph_entry_mut<'a>(
    data: &'a mut Value,
    index: usize,
    id: &RecordId,
) -> Result<&'a mut Map<String, Value>> {
    data.get_mut("@graph")
        .and_then(|graph| graph.get_mut(index))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ExportError::Structure(format!("Record {id} has no @graph entry {index}"))
        })
}

fn add_same_as(entry: &mut Map<String, Value>, uri: &str) -> Result<bool> {
    let same_as = entry
        .entry("sameAs")
        .or_insert_with(|| Value::Array(Vec::new()));

    let list = same_as
        .as_array_mut()
        .ok_or_else(|| ExportError::Structure("sameAs is not a list".to_string()))?;

    if list
        .iter()
        .any(|s| s.get("@id").and_then(Value::as_str) == Some(uri))
    {
        return Ok(false);
    }

    list.push(json!({ "@id": uri }));
    Ok(true)
}
