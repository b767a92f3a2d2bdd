//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use apix_export::adapters::apix::{ApixMethod, ApixRequest, ApixUrls};
use apix_export::adapters::traits::{
    FormatConverter, LegacyEndpoint, RecordStore, SearchIndex, SelectedRecords,
    UnreadableRecord, VersionToken, Versioned,
};
use apix_export::core::export::{is_export_eligible, BatchProcessor, Exporter};
use apix_export::core::state::ExportCursor;
use apix_export::domain::{
    ApixError, CatalogRecord, ControlNumber, ExportError, Manifest, RecordId, Result,
    StoreError,
};
use apix_export::logging::StatusSink;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub const APIX_HOST: &str = "http://apix.test";

/// Fixed base instant; records are placed `offset` seconds after it
pub fn at(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(offset)
}

pub fn record(id: &str, collection: &str, modified: DateTime<Utc>) -> CatalogRecord {
    CatalogRecord {
        id: RecordId::new(id).unwrap(),
        data: json!({"@graph": [
            {"@id": format!("https://libris.kb.se/{id}"), "mainEntity": {"@id": format!("https://libris.kb.se/{id}#it")}},
            {"@id": format!("https://libris.kb.se/{id}#it")}
        ]}),
        manifest: Manifest {
            collection: Some(collection.to_string()),
            changed_in: Some("xl".to_string()),
            ..Default::default()
        },
        modified,
        deleted: false,
    }
}

pub fn bib(id: &str, modified: DateTime<Utc>) -> CatalogRecord {
    record(id, "bib", modified)
}

/// A bib that already reached the legacy system as `/bib/{number}`
pub fn exported_bib(id: &str, number: &str, modified: DateTime<Utc>) -> CatalogRecord {
    let mut rec = bib(id, modified);
    rec.data["@graph"][0]["sameAs"] =
        json!([{"@id": format!("http://libris.kb.se/bib/{number}")}]);
    rec.data["@graph"][0]["controlNumber"] = Value::String(number.to_string());
    rec
}

pub fn holding(id: &str, bib_uri: &str, modified: DateTime<Utc>) -> CatalogRecord {
    let mut rec = record(id, "hold", modified);
    rec.data["@graph"][1]["holdingFor"] = json!({"@id": bib_uri});
    rec
}

/// Record store backed by a map, with a counter standing in for the row version
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<RecordId, (CatalogRecord, u64)>>,
    unreadable: Mutex<Vec<(RecordId, DateTime<Utc>)>>,
    fail_selection: AtomicBool,
    conflicts: Mutex<HashSet<RecordId>>,
    vanish_after_write: Mutex<HashSet<RecordId>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let store = Self::new();
        for rec in records {
            store.insert(rec);
        }
        store
    }

    /// Inserts or replaces a record as another writer would
    pub fn insert(&self, record: CatalogRecord) {
        let mut records = self.records.lock().unwrap();
        let version = records.get(&record.id).map_or(1, |(_, v)| v + 1);
        records.insert(record.id.clone(), (record, version));
    }

    pub fn get(&self, id: &str) -> CatalogRecord {
        let id = RecordId::new(id).unwrap();
        self.records.lock().unwrap()[&id].0.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        let id = RecordId::new(id).unwrap();
        self.records.lock().unwrap().contains_key(&id)
    }

    /// Adds a row whose manifest cannot be decoded
    ///
    /// It is selected like an eligible record at `modified` but can never be loaded.
    pub fn insert_unreadable(&self, id: &str, modified: DateTime<Utc>) {
        self.unreadable
            .lock()
            .unwrap()
            .push((RecordId::new(id).unwrap(), modified));
    }

    fn unreadable_at(&self, keep: impl Fn(DateTime<Utc>) -> bool) -> Vec<UnreadableRecord> {
        self.unreadable
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, modified)| keep(*modified))
            .map(|(id, modified)| UnreadableRecord {
                id: id.clone(),
                modified: *modified,
                error: StoreError::InvalidRow(format!(
                    "Invalid manifest for record {id}: invalid type: integer `5`, expected a string"
                ))
                .into(),
            })
            .collect()
    }

    pub fn fail_selection(&self, fail: bool) {
        self.fail_selection.store(fail, Ordering::SeqCst);
    }

    /// Makes the next write of `id` lose a race against a concurrent writer
    pub fn conflict_once(&self, id: &str) {
        self.conflicts
            .lock()
            .unwrap()
            .insert(RecordId::new(id).unwrap());
    }

    /// Makes `id` disappear right after its next successful write
    pub fn vanish_after_write(&self, id: &str) {
        self.vanish_after_write
            .lock()
            .unwrap()
            .insert(RecordId::new(id).unwrap());
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_selection(&self) -> Result<()> {
        if self.fail_selection.load(Ordering::SeqCst) {
            return Err(StoreError::QueryFailed("connection reset".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select_next_batch(&self, cursor: &ExportCursor) -> Result<SelectedRecords> {
        self.check_selection()?;
        let unreadable = self.unreadable_at(|modified| cursor.is_after(modified));
        let records = self.records.lock().unwrap();

        let eligible: Vec<&CatalogRecord> = records
            .values()
            .map(|(rec, _)| rec)
            .filter(|rec| is_export_eligible(rec) && cursor.is_after(rec.modified))
            .collect();

        let next = eligible
            .iter()
            .map(|rec| rec.modified)
            .chain(unreadable.iter().map(|row| row.modified))
            .min();
        let Some(next) = next else {
            return Ok(SelectedRecords::default());
        };

        Ok(SelectedRecords {
            records: eligible
                .into_iter()
                .filter(|rec| rec.modified == next)
                .cloned()
                .collect(),
            unreadable: unreadable
                .into_iter()
                .filter(|row| row.modified == next)
                .collect(),
        })
    }

    async fn select_failed(&self) -> Result<SelectedRecords> {
        self.check_selection()?;
        let records: Vec<CatalogRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|(rec, _)| rec.is_failed())
            .map(|(rec, _)| rec.clone())
            .collect();
        Ok(records.into())
    }

    async fn load(&self, id: &RecordId) -> Result<Option<Versioned<CatalogRecord>>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(id)
            .map(|(rec, version)| Versioned {
                value: rec.clone(),
                version: VersionToken::new(version.to_string()),
            }))
    }

    async fn compare_and_set(&self, record: &CatalogRecord, version: &VersionToken) -> Result<()> {
        let mut records = self.records.lock().unwrap();

        if self.conflicts.lock().unwrap().remove(&record.id) {
            if let Some((_, stored_version)) = records.get_mut(&record.id) {
                *stored_version += 1;
            }
        }

        let Some((stored, stored_version)) = records.get_mut(&record.id) else {
            return Err(StoreError::NotFound(record.id.to_string()).into());
        };
        if stored_version.to_string() != version.as_str() {
            return Err(StoreError::Conflict(record.id.to_string()).into());
        }

        // Only data and manifest are written; the modification instant stays
        stored.data = record.data.clone();
        stored.manifest = record.manifest.clone();
        *stored_version += 1;
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.vanish_after_write.lock().unwrap().remove(&record.id) {
            records.remove(&record.id);
        }
        Ok(())
    }
}

/// Endpoint that records every request and answers like APIX
///
/// Creates get consecutive control numbers starting at 1000. URLs registered with
/// [`ScriptedEndpoint::fail`] answer with http 500 the given number of times.
pub struct ScriptedEndpoint {
    requests: Mutex<Vec<ApixRequest>>,
    failures: Mutex<HashMap<String, usize>>,
    next_number: AtomicU64,
    create_without_number: AtomicBool,
}

impl Default for ScriptedEndpoint {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            next_number: AtomicU64::new(1000),
            create_without_number: AtomicBool::new(false),
        }
    }
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, url: &str, times: usize) {
        self.failures.lock().unwrap().insert(url.to_string(), times);
    }

    pub fn create_without_number(&self) {
        self.create_without_number.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<ApixRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl LegacyEndpoint for ScriptedEndpoint {
    async fn execute(&self, request: &ApixRequest) -> Result<Option<ControlNumber>> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(remaining) = self.failures.lock().unwrap().get_mut(&request.url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ApixError::Transport {
                    status: 500,
                    body: "internal error".to_string(),
                }
                .into());
            }
        }

        let is_create = request.url.ends_with("/new") || request.url.ends_with("/newhold");
        match request.method {
            ApixMethod::Put if is_create => {
                if self.create_without_number.load(Ordering::SeqCst) {
                    return Ok(None);
                }
                let number = self.next_number.fetch_add(1, Ordering::SeqCst);
                Ok(Some(ControlNumber::new(number.to_string()).unwrap()))
            }
            // Updates answer 303 pointing back at the record
            ApixMethod::Put => {
                let number = request.url.rsplit('/').next().unwrap_or_default();
                Ok(ControlNumber::new(number).ok())
            }
            ApixMethod::Delete => Ok(None),
        }
    }
}

/// Converter producing a stub MARCXML document, refusing selected records
#[derive(Default)]
pub struct StubConverter {
    refused: Mutex<HashSet<RecordId>>,
}

impl StubConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, id: &str) {
        self.refused.lock().unwrap().insert(RecordId::new(id).unwrap());
    }

    pub fn accept(&self, id: &str) {
        self.refused.lock().unwrap().remove(&RecordId::new(id).unwrap());
    }
}

#[async_trait]
impl FormatConverter for StubConverter {
    async fn convert(&self, record: &CatalogRecord) -> Result<String> {
        if self.refused.lock().unwrap().contains(&record.id) {
            return Err(ExportError::Translation(format!(
                "No MARC mapping for {}",
                record.id
            )));
        }
        Ok(format!("<record><controlfield tag=\"887\">{}</controlfield></record>", record.id))
    }
}

/// Search index remembering what it was given
///
/// Pushes are recorded even when [`RecordingIndex::fail_next`] makes them fail.
#[derive(Default)]
pub struct RecordingIndex {
    documents: Mutex<Vec<CatalogRecord>>,
    failures: AtomicUsize,
}

impl RecordingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` pushes fail
    pub fn fail_next(&self, times: usize) {
        self.failures.store(times, Ordering::SeqCst);
    }

    pub fn documents(&self) -> Vec<CatalogRecord> {
        self.documents.lock().unwrap().clone()
    }

    pub fn last_for(&self, id: &str) -> Option<CatalogRecord> {
        self.documents()
            .into_iter()
            .rev()
            .find(|doc| doc.id.as_str() == id)
    }
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn index(&self, record: &CatalogRecord) -> Result<()> {
        self.documents.lock().unwrap().push(record.clone());

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ExportError::Index(format!(
                "Elasticsearch responded with http 503 for {}",
                record.id
            )));
        }
        Ok(())
    }
}

/// Status sink collecting every line
#[derive(Default)]
pub struct RecordingStatus {
    lines: Mutex<Vec<String>>,
}

impl RecordingStatus {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingStatus {
    fn output(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// One exporter setup over in-memory collaborators
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub endpoint: Arc<ScriptedEndpoint>,
    pub converter: Arc<StubConverter>,
    pub index: Arc<RecordingIndex>,
    pub status: Arc<RecordingStatus>,
}

impl Harness {
    pub fn new(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        Self {
            store: Arc::new(MemoryStore::with_records(records)),
            endpoint: Arc::new(ScriptedEndpoint::new()),
            converter: Arc::new(StubConverter::new()),
            index: Arc::new(RecordingIndex::new()),
            status: Arc::new(RecordingStatus::default()),
        }
    }

    pub fn urls() -> ApixUrls {
        ApixUrls::new(APIX_HOST, "libris")
    }

    /// APIX URL of a record path such as `/bib/1000`
    pub fn apix_url(path: &str) -> String {
        format!("{}{}", Self::urls().database_url(), path)
    }

    pub fn processor(&self) -> BatchProcessor {
        BatchProcessor::new(
            self.store.clone(),
            self.endpoint.clone(),
            self.converter.clone(),
            self.index.clone(),
            Self::urls(),
            self.status.clone(),
        )
    }

    pub fn exporter(
        &self,
        cursor: ExportCursor,
        poll_interval: std::time::Duration,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Exporter {
        Exporter::new(
            self.processor(),
            self.status.clone(),
            cursor,
            poll_interval,
            shutdown_signal,
        )
    }
}
