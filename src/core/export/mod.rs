//! Export pipeline
//!
//! This module provides the export logic:
//! - Batch selection ([`select_batch`])
//! - Operation classification ([`classify`])
//! - APIX dispatch ([`export_record`])
//! - Bookkeeping commit and reindex ([`Committer`])
//! - Batch processing and the export loop ([`BatchProcessor`], [`Exporter`])

pub mod batch;
pub mod classify;
pub mod commit;
pub mod dispatch;
pub mod exporter;
pub mod selector;
pub mod summary;

pub use batch::BatchProcessor;
pub use classify::{classify, ApixOperation};
pub use commit::{BookkeepingUpdate, Committer};
pub use dispatch::{export_record, prepare_request};
pub use exporter::Exporter;
pub use selector::{is_export_eligible, select_batch, Batch, BatchSelection};
pub use summary::{BatchResult, ExportSummary, RecordFailure};
