//! Core business logic.
//!
//! # Modules
//!
//! - [`export`] - Batch selection, dispatch, bookkeeping and the export loop
//! - [`state`] - The export cursor
//!
//! # Export Workflow
//!
//! Each loop iteration:
//!
//! 1. **Select**: all eligible records at the next modification instant after the cursor
//! 2. **Classify**: create, update or delete, from the record's own state
//! 3. **Dispatch**: convert to MARCXML and call APIX
//! 4. **Commit**: record the outcome in the record's bookkeeping and reindex it
//! 5. **Advance**: move the cursor to the batch's instant
//! 6. **Retry**: run the same steps for every record flagged as failed
//!
//! # Example
//!
//! ```rust,no_run
//! use apix_export::config::load_config;
//! use apix_export::core::export::Exporter;
//! use apix_export::core::state::ExportCursor;
//! use apix_export::logging::ConsoleStatus;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("apix-export.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let exporter = Exporter::from_config(
//!     &config,
//!     ExportCursor::from_option(config.export.from),
//!     Arc::new(ConsoleStatus),
//!     shutdown_rx,
//! )
//! .await?;
//!
//! let summary = exporter.run().await;
//! println!("Exported {} record(s)", summary.successful_exports);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod state;
