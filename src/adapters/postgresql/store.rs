//! PostgreSQL record store
//!
//! Implements [`RecordStore`] on top of [`PostgreSQLClient`]. The row's `xmin` system
//! column serves as the version token, so a concurrent writer anywhere in the catalog
//! invalidates an outstanding read.

use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{selected_from_rows, versioned_record_from_row};
use crate::adapters::postgresql::queries;
use crate::adapters::traits::{RecordStore, SelectedRecords, VersionToken, Versioned};
use crate::core::state::ExportCursor;
use crate::domain::{CatalogRecord, ExportError, RecordId, Result, StoreError};
use async_trait::async_trait;

/// PostgreSQL implementation of [`RecordStore`]
pub struct PostgresRecordStore {
    client: PostgreSQLClient,
}

impl PostgresRecordStore {
    /// Create a new store over a pooled client
    pub fn new(client: PostgreSQLClient) -> Self {
        Self { client }
    }

    async fn exists(&self, id: &RecordId) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = $1", self.client.table());
        let rows = self.client.query(&sql, &[&id.as_str()]).await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn select_next_batch(&self, cursor: &ExportCursor) -> Result<SelectedRecords> {
        let table = self.client.table();
        let rows = match cursor.newer_than() {
            Some(newer_than) => {
                self.client
                    .query(&queries::next_batch(table, true), &[&newer_than])
                    .await?
            }
            None => {
                self.client
                    .query(&queries::next_batch(table, false), &[])
                    .await?
            }
        };

        tracing::debug!(
            cursor = %cursor.describe(),
            count = rows.len(),
            "Selected next export batch"
        );

        selected_from_rows(&rows)
    }

    async fn select_failed(&self) -> Result<SelectedRecords> {
        let rows = self
            .client
            .query(&queries::failed(self.client.table()), &[])
            .await?;

        tracing::debug!(count = rows.len(), "Selected previously failed records");

        selected_from_rows(&rows)
    }

    async fn load(&self, id: &RecordId) -> Result<Option<Versioned<CatalogRecord>>> {
        let rows = self
            .client
            .query(&queries::load(self.client.table()), &[&id.as_str()])
            .await?;

        rows.first().map(versioned_record_from_row).transpose()
    }

    async fn compare_and_set(&self, record: &CatalogRecord, version: &VersionToken) -> Result<()> {
        let manifest = serde_json::to_value(&record.manifest)
            .map_err(|e| ExportError::Serialization(format!("Failed to serialize manifest: {e}")))?;

        let updated = self
            .client
            .execute(
                &queries::compare_and_set(self.client.table()),
                &[
                    &record.id.as_str(),
                    &record.data,
                    &manifest,
                    &version.as_str(),
                ],
            )
            .await?;

        if updated == 1 {
            tracing::debug!(id = %record.id, "Record bookkeeping written");
            return Ok(());
        }

        if self.exists(&record.id).await? {
            Err(StoreError::Conflict(record.id.to_string()).into())
        } else {
            Err(StoreError::NotFound(record.id.to_string()).into())
        }
    }
}
