//! SQL for the record table
//!
//! The table holds one row per record: `id text`, `data jsonb`, `manifest jsonb`,
//! `modified timestamptz`, `deleted boolean`. Timestamps keep Postgres' microsecond
//! precision end to end; they are bound as `timestamptz` parameters, never formatted.

use crate::domain::{APIX_FAILURE_KEY, LEGACY_SYSTEM_ORIGIN};

const RECORD_COLUMNS: &str = "id, data, manifest, modified, deleted";

/// Filter excluding definitions and records last written by the legacy sync
fn eligible_filter() -> String {
    format!(
        "manifest->>'collection' <> 'definitions' \
         AND (manifest->>'changedIn' IS NULL OR manifest->>'changedIn' <> '{LEGACY_SYSTEM_ORIGIN}')"
    )
}

/// All eligible records at the smallest modification instant after `$1`
///
/// Without a lower bound (`bounded == false`) the query takes no parameters and
/// selects the very first instant.
pub fn next_batch(table: &str, bounded: bool) -> String {
    let filter = eligible_filter();
    let lower_bound = if bounded { "modified > $1 AND " } else { "" };
    format!(
        "SELECT {RECORD_COLUMNS} FROM {table} \
         WHERE {filter} \
         AND modified = (SELECT MIN(modified) FROM {table} WHERE {lower_bound}{filter})"
    )
}

/// All records carrying the export failure flag
pub fn failed(table: &str) -> String {
    format!(
        "SELECT {RECORD_COLUMNS} FROM {table} \
         WHERE manifest->>'{APIX_FAILURE_KEY}' IS NOT NULL"
    )
}

/// One record and its row version (`xmin`)
pub fn load(table: &str) -> String {
    format!("SELECT {RECORD_COLUMNS}, xmin::text AS version FROM {table} WHERE id = $1")
}

/// Version-checked write of data and manifest; `modified` is left alone
pub fn compare_and_set(table: &str) -> String {
    format!(
        "UPDATE {table} SET data = $2, manifest = $3 \
         WHERE id = $1 AND xmin::text = $4"
    )
}
