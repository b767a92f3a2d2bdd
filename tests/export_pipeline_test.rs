//! Integration tests for the export pipeline over in-memory collaborators
//!
//! These tests verify that:
//! - Batches are selected by modification instant and the cursor only moves forward
//! - Every record is attempted until it goes through
//! - Bookkeeping never touches the modification instant
//! - The search index sees the committed state

mod common;

use apix_export::adapters::apix::ApixMethod;
use apix_export::core::export::{BatchSelection, ExportSummary};
use apix_export::core::state::ExportCursor;
use apix_export::domain::{ExportError, StoreError};
use common::{at, bib, exported_bib, holding, record, Harness};
use std::time::Duration;
use tokio::sync::watch;

#[tokio::test]
async fn test_create_assigns_legacy_identifiers() {
    let harness = Harness::new([bib("r1", at(1))]);
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.attempted, 1);
    assert_eq!(result.successful, 1);
    assert_eq!(cursor.newer_than(), Some(at(1)));

    let requests = harness.endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, ApixMethod::Put);
    assert_eq!(requests[0].url, Harness::apix_url("/bib/new"));
    assert!(requests[0].body.as_deref().unwrap().contains("r1"));

    let stored = harness.store.get("r1");
    assert_eq!(stored.legacy_id().unwrap().path(), "/bib/1000");
    assert_eq!(stored.data["@graph"][0]["controlNumber"], "1000");
    assert_eq!(
        stored.data["@graph"][1]["sameAs"][0]["@id"],
        "http://libris.kb.se/resource/bib/1000"
    );
    assert!(!stored.is_failed());
    assert_eq!(stored.modified, at(1));

    assert_eq!(
        harness.status.lines(),
        vec!["Completed export of 1 out of 1 document(s) with modified = 2017-03-01T12:00:01.000000Z"]
    );
}

#[tokio::test]
async fn test_batch_holds_every_record_of_the_next_instant() {
    let harness = Harness::new([bib("a", at(5)), bib("b", at(5)), bib("c", at(9))]);
    let mut cursor = ExportCursor::beginning();
    let processor = harness.processor();

    let first = processor
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();
    assert_eq!(first.attempted, 2);
    assert_eq!(first.timestamp, Some(at(5)));
    assert_eq!(cursor.newer_than(), Some(at(5)));

    let second = processor
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();
    assert_eq!(second.attempted, 1);
    assert_eq!(cursor.newer_than(), Some(at(9)));

    let third = processor
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();
    assert!(third.is_empty());
    assert_eq!(cursor.newer_than(), Some(at(9)));
}

#[tokio::test]
async fn test_cursor_start_skips_older_records() {
    let harness = Harness::new([bib("old", at(1)), bib("new", at(10))]);
    let mut cursor = ExportCursor::starting_at(at(5));

    harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(harness.endpoint.requests().len(), 1);
    assert!(harness.store.get("old").legacy_id().is_none());
    assert!(harness.store.get("new").legacy_id().is_some());
}

#[tokio::test]
async fn test_definitions_and_legacy_originated_records_are_not_selected() {
    let mut imported = bib("imported", at(2));
    imported.manifest.changed_in = Some("vcopy".to_string());
    let harness = Harness::new([record("defs", "definitions", at(1)), imported]);

    let mut summary = ExportSummary::new();
    let (_tx, rx) = watch::channel(true);
    let mut exporter = harness.exporter(ExportCursor::beginning(), Duration::ZERO, rx);
    exporter.run_once(&mut summary).await;

    assert!(harness.endpoint.requests().is_empty());
    assert_eq!(summary.batches, 0);
    assert_eq!(exporter.cursor(), ExportCursor::beginning());
}

#[tokio::test]
async fn test_update_targets_existing_legacy_record() {
    let harness = Harness::new([exported_bib("r1", "555", at(1))]);
    let before = harness.store.get("r1");
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.successful, 1);
    let requests = harness.endpoint.requests();
    assert_eq!(requests[0].method, ApixMethod::Put);
    assert_eq!(requests[0].url, Harness::apix_url("/bib/555"));

    // Nothing to record: the write is skipped but the record is still reindexed
    assert_eq!(harness.store.get("r1"), before);
    assert_eq!(harness.store.writes(), 0);
    assert_eq!(harness.index.last_for("r1"), Some(before));
}

#[tokio::test]
async fn test_delete_of_exported_record() {
    let mut rec = exported_bib("r1", "555", at(1));
    rec.deleted = true;
    let harness = Harness::new([rec]);
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.successful, 1);
    let requests = harness.endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, ApixMethod::Delete);
    assert_eq!(requests[0].url, Harness::apix_url("/bib/555"));
    assert!(requests[0].body.is_none());
}

#[tokio::test]
async fn test_delete_of_never_exported_record_sends_nothing() {
    let mut rec = bib("r1", at(1));
    rec.deleted = true;
    let harness = Harness::new([rec]);
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.successful, 1);
    assert!(harness.endpoint.requests().is_empty());
    assert!(harness.index.last_for("r1").is_some());
}

#[tokio::test]
async fn test_holding_is_created_under_its_bib() {
    let harness = Harness::new([holding("h1", "http://libris.kb.se/bib/12345", at(1))]);
    let mut cursor = ExportCursor::beginning();

    harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(
        harness.endpoint.urls(),
        vec![Harness::apix_url("/bib/12345/newhold")]
    );
    assert_eq!(
        harness.store.get("h1").legacy_id().unwrap().path(),
        "/hold/1000"
    );
}

#[tokio::test]
async fn test_holding_without_bib_is_flagged() {
    let harness = Harness::new([record("h1", "hold", at(1))]);
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.failed(), 1);
    assert!(harness.endpoint.requests().is_empty());
    assert!(harness.store.get("h1").is_failed());
    assert_eq!(cursor.newer_than(), Some(at(1)));
}

#[tokio::test]
async fn test_failed_record_is_retried_until_it_succeeds() {
    let harness = Harness::new([bib("r1", at(1)), bib("r2", at(1))]);
    harness.converter.refuse("r2");
    let processor = harness.processor();
    let mut cursor = ExportCursor::beginning();

    let result = processor
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();
    assert_eq!(result.successful, 1);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.failures[0].record_id.as_str(), "r2");

    // The cursor moves past the failed record; the retry pass picks it up
    assert_eq!(cursor.newer_than(), Some(at(1)));
    let flagged = harness.store.get("r2");
    assert!(flagged.is_failed());
    let first_failure = flagged.manifest.apix_export_failed_at.clone();

    let retry = processor
        .process(BatchSelection::PreviouslyFailed, &mut cursor)
        .await
        .unwrap();
    assert_eq!(retry.failed(), 1);
    assert_eq!(
        harness.store.get("r2").manifest.apix_export_failed_at,
        first_failure
    );

    harness.converter.accept("r2");
    let retry = processor
        .process(BatchSelection::PreviouslyFailed, &mut cursor)
        .await
        .unwrap();
    assert_eq!(retry.successful, 1);

    let exported = harness.store.get("r2");
    assert!(!exported.is_failed());
    assert!(exported.legacy_id().is_some());
    assert_eq!(exported.modified, at(1));

    let lines = harness.status.lines();
    assert!(lines.contains(
        &"Failed to export r2, will automatically try again at a later time.".to_string()
    ));
    assert!(lines.contains(
        &"Completed export of 1 out of 1 document(s) queued for retry.".to_string()
    ));

    // Nothing left to do
    let idle = processor
        .process(BatchSelection::PreviouslyFailed, &mut cursor)
        .await
        .unwrap();
    assert!(idle.is_empty());
}

#[tokio::test]
async fn test_transient_apix_error_is_retried_within_the_iteration() {
    let harness = Harness::new([bib("r1", at(1))]);
    harness.endpoint.fail(&Harness::apix_url("/bib/new"), 1);

    let (_tx, rx) = watch::channel(true);
    let mut exporter = harness.exporter(ExportCursor::beginning(), Duration::ZERO, rx);
    let mut summary = ExportSummary::new();
    exporter.run_once(&mut summary).await;

    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.failed_exports, 1);
    assert_eq!(summary.successful_exports, 1);
    assert_eq!(summary.cursor, Some(at(1)));

    assert_eq!(harness.endpoint.requests().len(), 2);
    let stored = harness.store.get("r1");
    assert!(!stored.is_failed());
    assert_eq!(stored.legacy_id().unwrap().path(), "/bib/1000");
}

#[tokio::test]
async fn test_create_without_control_number_is_a_failure() {
    let harness = Harness::new([bib("r1", at(1))]);
    harness.endpoint.create_without_number();
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.failed(), 1);
    let stored = harness.store.get("r1");
    assert!(stored.is_failed());
    assert!(stored.legacy_id().is_none());
}

#[tokio::test]
async fn test_concurrent_modification_flags_record() {
    let harness = Harness::new([bib("r1", at(1))]);
    harness.store.conflict_once("r1");
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.failed(), 1);
    assert!(result.failures[0].message.contains("Concurrent modification"));

    let stored = harness.store.get("r1");
    assert!(stored.is_failed());
    assert!(stored.legacy_id().is_none());
    assert_eq!(harness.index.last_for("r1"), Some(stored));
}

#[tokio::test]
async fn test_record_vanishing_after_commit_is_a_consistency_failure() {
    let harness = Harness::new([bib("r1", at(1))]);
    harness.store.vanish_after_write("r1");
    let mut cursor = ExportCursor::beginning();

    let result = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.failed(), 1);
    assert!(result.failures[0].message.contains("cannot be retrieved"));
    assert!(!harness.store.contains("r1"));
    assert!(harness.index.documents().is_empty());
}

#[tokio::test]
async fn test_selection_failure_aborts_the_pass() {
    let harness = Harness::new([bib("r1", at(1))]);
    harness.store.fail_selection(true);
    let mut cursor = ExportCursor::beginning();

    let err = harness
        .processor()
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Store(StoreError::QueryFailed(_))));
    assert_eq!(cursor, ExportCursor::beginning());

    let (_tx, rx) = watch::channel(true);
    let mut exporter = harness.exporter(ExportCursor::beginning(), Duration::ZERO, rx);
    let mut summary = ExportSummary::new();
    exporter.run_once(&mut summary).await;

    assert_eq!(summary.aborted_batches, 2);
    assert!(!summary.is_successful());
    assert!(harness
        .status
        .lines()
        .iter()
        .all(|line| line.starts_with("Export batch stopped with error: ")));
}

#[tokio::test]
async fn test_index_receives_committed_state() {
    let harness = Harness::new([bib("r1", at(1)), holding("h1", "http://libris.kb.se/bib/9", at(2))]);

    let (_tx, rx) = watch::channel(false);
    let mut exporter = harness.exporter(ExportCursor::beginning(), Duration::ZERO, rx);
    let mut summary = ExportSummary::new();
    exporter.run_once(&mut summary).await;
    exporter.run_once(&mut summary).await;

    for id in ["r1", "h1"] {
        assert_eq!(harness.index.last_for(id), Some(harness.store.get(id)));
    }
    assert_eq!(summary.successful_exports, 2);
    assert_eq!(summary.cursor, Some(at(2)));
}

#[tokio::test]
async fn test_exported_records_are_not_sent_again() {
    let harness = Harness::new([bib("r1", at(1))]);

    let (_tx, rx) = watch::channel(false);
    let mut exporter = harness.exporter(ExportCursor::beginning(), Duration::ZERO, rx);
    let mut summary = ExportSummary::new();
    for _ in 0..3 {
        exporter.run_once(&mut summary).await;
    }

    // Bookkeeping leaves the modification instant alone, so it creates no new work
    assert_eq!(harness.endpoint.requests().len(), 1);
    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.batches, 1);
}

#[tokio::test]
async fn test_record_changed_again_is_exported_as_update() {
    let harness = Harness::new([bib("r1", at(1))]);

    let (_tx, rx) = watch::channel(false);
    let mut exporter = harness.exporter(ExportCursor::beginning(), Duration::ZERO, rx);
    let mut summary = ExportSummary::new();
    exporter.run_once(&mut summary).await;

    // A cataloguer edits the record
    let mut edited = harness.store.get("r1");
    edited.modified = at(7);
    harness.store.insert(edited);
    exporter.run_once(&mut summary).await;

    assert_eq!(
        harness.endpoint.urls(),
        vec![Harness::apix_url("/bib/new"), Harness::apix_url("/bib/1000")]
    );
    assert_eq!(exporter.cursor().newer_than(), Some(at(7)));
}

#[tokio::test]
async fn test_index_failure_after_create_flags_record_and_keeps_legacy_id() {
    let harness = Harness::new([bib("r1", at(1))]);
    harness.index.fail_next(1);
    let processor = harness.processor();
    let mut cursor = ExportCursor::beginning();

    let result = processor
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.attempted, 1);
    assert_eq!(result.failed(), 1);
    assert!(result.failures[0].message.starts_with("Index error: "));
    assert_eq!(cursor.newer_than(), Some(at(1)));

    // The assigned identifier was committed before the index push failed
    let stored = harness.store.get("r1");
    assert_eq!(stored.legacy_id().unwrap().path(), "/bib/1000");
    assert!(stored.is_failed());
    assert_eq!(harness.index.documents().len(), 2);
    assert_eq!(harness.index.last_for("r1"), Some(stored));

    let retry = processor
        .process(BatchSelection::PreviouslyFailed, &mut cursor)
        .await
        .unwrap();

    assert_eq!(retry.successful, 1);
    assert_eq!(
        harness.endpoint.urls(),
        vec![Harness::apix_url("/bib/new"), Harness::apix_url("/bib/1000")]
    );
    assert_eq!(harness.endpoint.requests()[1].method, ApixMethod::Put);
    assert!(!harness.store.get("r1").is_failed());
}

#[tokio::test]
async fn test_unreadable_row_fails_alone_and_the_cursor_moves_on() {
    let harness = Harness::new([bib("r1", at(1)), bib("r2", at(2))]);
    harness.store.insert_unreadable("broken", at(1));
    let processor = harness.processor();
    let mut cursor = ExportCursor::beginning();

    let result = processor
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.attempted, 2);
    assert_eq!(result.successful, 1);
    assert_eq!(result.failures[0].record_id.as_str(), "broken");
    assert!(result.failures[0].message.contains("Invalid manifest"));
    assert_eq!(cursor.newer_than(), Some(at(1)));
    assert_eq!(
        harness.status.lines(),
        vec![
            "Failed to export broken, will automatically try again at a later time.",
            "Completed export of 1 out of 2 document(s) with modified = 2017-03-01T12:00:01.000000Z",
        ]
    );

    let result = processor
        .process(BatchSelection::NextTimestamp, &mut cursor)
        .await
        .unwrap();

    assert_eq!(result.successful, 1);
    assert_eq!(cursor.newer_than(), Some(at(2)));
    assert!(!harness.store.get("r2").is_failed());
    assert_eq!(harness.endpoint.requests().len(), 2);
}
