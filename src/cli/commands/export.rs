//! Export command implementation
//!
//! This module implements the `export` command, which runs the export loop until a
//! shutdown signal arrives.

use crate::config::load_config;
use crate::core::export::{ExportSummary, Exporter};
use crate::core::state::ExportCursor;
use crate::logging::ConsoleStatus;
use chrono::{DateTime, Utc};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export records modified after this instant (RFC 3339); overrides `export.from`
    #[arg(long, value_name = "RFC3339")]
    pub from: Option<DateTime<Utc>>,

    /// Run a single iteration and exit
    #[arg(long)]
    pub once: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let cursor = ExportCursor::from_option(self.from.or(config.export.from));

        let mut exporter = match Exporter::from_config(
            &config,
            cursor,
            Arc::new(ConsoleStatus),
            shutdown_signal,
        )
        .await
        {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize exporter");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let summary = if self.once {
            let mut summary = ExportSummary::new();
            exporter.run_once(&mut summary).await;
            summary.log_summary();
            summary
        } else {
            exporter.run().await
        };

        println!();
        println!("Export Summary:");
        println!("  Iterations: {}", summary.iterations);
        println!("  Batches: {}", summary.batches);
        println!("  Successful: {}", summary.successful_exports);
        println!("  Failed: {}", summary.failed_exports);
        println!("  Aborted batches: {}", summary.aborted_batches);
        println!("  Cursor: {}", ExportCursor::from_option(summary.cursor).describe());
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

        // Failed records are flagged and retried by the next run, so only a one-shot
        // run reports them in its exit code
        if self.once && !summary.is_successful() {
            return Ok(1);
        }
        Ok(0)
    }
}
