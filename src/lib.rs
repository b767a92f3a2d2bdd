// apix-export - exports catalog changes to the legacy system through APIX
// Licensed under the MIT License

//! # apix-export
//!
//! Mirrors changes made in the linked-data catalog into the legacy MARC-based system
//! through its REST interface, APIX.
//!
//! ## Overview
//!
//! The exporter walks the record store in modification order:
//! - **Selecting** every record sharing the next modification instant after a cursor,
//!   and separately every record flagged by an earlier failed attempt
//! - **Exporting** each record as an APIX create, update or delete, after converting it
//!   to MARCXML
//! - **Committing** the outcome to the record's bookkeeping with a compare-and-set
//!   write that never touches the modification instant
//! - **Reindexing** the committed record in the search index
//!
//! Failed records are retried on every iteration until they go through.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export loop, batch selection, classification and bookkeeping
//! - [`adapters`] - APIX, PostgreSQL, Elasticsearch and the format converter
//! - [`domain`] - Records, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and operator status lines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apix_export::config::load_config;
//! use apix_export::core::export::Exporter;
//! use apix_export::core::state::ExportCursor;
//! use apix_export::logging::ConsoleStatus;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("apix-export.toml")?;
//!     let (_stop, stop_signal) = watch::channel(false);
//!
//!     let exporter = Exporter::from_config(
//!         &config,
//!         ExportCursor::from_option(config.export.from),
//!         Arc::new(ConsoleStatus),
//!         stop_signal,
//!     )
//!     .await?;
//!
//!     let summary = exporter.run().await;
//!     println!("Exported {} record(s)", summary.successful_exports);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::ExportError`]; only the binary converts to `anyhow`.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
