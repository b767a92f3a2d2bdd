//! APIX dispatch of a single record
//!
//! Turns a classified record into an [`ApixRequest`], sends it and reports the control
//! number APIX assigned, if any.

use crate::adapters::apix::{ApixRequest, ApixUrls};
use crate::adapters::traits::{FormatConverter, LegacyEndpoint};
use crate::core::export::classify::ApixOperation;
use crate::domain::{ApixError, CatalogRecord, Collection, ControlNumber, ExportError, Result};

/// Builds the APIX call for a record
///
/// Returns `None` for a deleted record that never reached the legacy system, which
/// needs no call at all.
///
/// # Errors
///
/// Returns [`ExportError::Structure`] when the target URL cannot be derived (a holding
/// without its bib, a collection APIX does not know) and any converter error.
pub async fn prepare_request(
    urls: &ApixUrls,
    record: &CatalogRecord,
    operation: &ApixOperation,
    converter: &dyn FormatConverter,
) -> Result<Option<ApixRequest>> {
    match operation {
        ApixOperation::Delete(None) => Ok(None),
        ApixOperation::Delete(Some(legacy_id)) => {
            Ok(Some(ApixRequest::delete(urls.record(legacy_id))))
        }
        ApixOperation::Update(legacy_id) => {
            let body = converter.convert(record).await?;
            Ok(Some(ApixRequest::put(urls.record(legacy_id), body)))
        }
        ApixOperation::Create => {
            let url = create_url(urls, record)?;
            let body = converter.convert(record).await?;
            Ok(Some(ApixRequest::put(url, body)))
        }
    }
}

/// Target URL of a create; holdings are created under their bib record
fn create_url(urls: &ApixUrls, record: &CatalogRecord) -> Result<String> {
    match record.collection() {
        Collection::Hold => Ok(urls.new_holding(&record.holding_parent_bib_id()?)),
        collection if collection.is_legacy_type() => Ok(urls.new_record(&collection)),
        collection => Err(ExportError::Structure(format!(
            "Record {} belongs to collection '{}', which APIX does not know",
            record.id, collection
        ))),
    }
}

/// Exports one record to APIX
///
/// Returns the control number APIX assigned on a create, `None` otherwise.
///
/// # Errors
///
/// Returns any structural, conversion or APIX error. A create that APIX acknowledges
/// without a control number is an error too.
pub async fn export_record(
    urls: &ApixUrls,
    endpoint: &dyn LegacyEndpoint,
    converter: &dyn FormatConverter,
    record: &CatalogRecord,
    operation: &ApixOperation,
) -> Result<Option<ControlNumber>> {
    let Some(request) = prepare_request(urls, record, operation, converter).await? else {
        tracing::debug!(
            record_id = %record.id,
            "Deleted record was never exported, nothing to send"
        );
        return Ok(None);
    };

    let assigned = endpoint.execute(&request).await?;

    match operation {
        ApixOperation::Create => assigned
            .map(Some)
            .ok_or_else(|| ApixError::MissingLocation.into()),
        _ => Ok(None),
    }
}
