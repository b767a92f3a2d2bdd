//! Row mapping for the record table

use crate::adapters::traits::{SelectedRecords, UnreadableRecord, VersionToken, Versioned};
use crate::domain::{CatalogRecord, Manifest, RecordId, Result, StoreError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_postgres::Row;

/// Converts the rows of a selection, setting aside the ones that cannot be decoded
///
/// Only a row without a usable `id` or `modified` fails the whole selection.
pub fn selected_from_rows(rows: &[Row]) -> Result<SelectedRecords> {
    let mut selected = SelectedRecords::default();

    for row in rows {
        let (id, modified) = row_key(row)?;
        match record_from_row(row) {
            Ok(record) => selected.records.push(record),
            Err(error) => {
                tracing::warn!(record_id = %id, error = %error, "Selected row cannot be decoded");
                selected.unreadable.push(UnreadableRecord {
                    id,
                    modified,
                    error,
                });
            }
        }
    }

    Ok(selected)
}

/// Converts a `SELECT id, data, manifest, modified, deleted` row into a record
pub fn record_from_row(row: &Row) -> Result<CatalogRecord> {
    let (id, modified) = row_key(row)?;
    let data: Value = column(row, "data")?;
    let manifest: Value = column(row, "manifest")?;
    let deleted: bool = column(row, "deleted")?;

    let manifest: Manifest = serde_json::from_value(manifest).map_err(|e| {
        StoreError::InvalidRow(format!("Invalid manifest for record {id}: {e}"))
    })?;

    Ok(CatalogRecord {
        id,
        data,
        manifest,
        modified,
        deleted,
    })
}

/// Converts a row from the load query, which also carries `version`
pub fn versioned_record_from_row(row: &Row) -> Result<Versioned<CatalogRecord>> {
    let version: String = column(row, "version")?;
    Ok(Versioned {
        value: record_from_row(row)?,
        version: VersionToken::new(version),
    })
}

fn row_key(row: &Row) -> Result<(RecordId, DateTime<Utc>)> {
    let id: String = column(row, "id")?;
    let modified: DateTime<Utc> = column(row, "modified")?;
    let id = RecordId::new(id).map_err(StoreError::InvalidRow)?;
    Ok((id, modified))
}

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| StoreError::InvalidRow(format!("Column '{name}': {e}")).into())
}
