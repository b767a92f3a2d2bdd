//! Export loop
//!
//! The exporter repeats one next-timestamp pass and one previously-failed pass, pausing
//! between iterations, until the stop signal is raised. The signal is only honoured at
//! iteration boundaries: a batch in flight, including its APIX calls, always finishes.

use crate::adapters::apix::{ApixClient, ApixUrls};
use crate::adapters::converter::HttpConverter;
use crate::adapters::elastic::ElasticIndex;
use crate::adapters::postgresql::{PostgreSQLClient, PostgresRecordStore};
use crate::config::ExporterConfig;
use crate::core::export::batch::BatchProcessor;
use crate::core::export::selector::BatchSelection;
use crate::core::export::summary::ExportSummary;
use crate::core::state::ExportCursor;
use crate::domain::Result;
use crate::logging::StatusSink;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// The export loop
pub struct Exporter {
    processor: BatchProcessor,
    status: Arc<dyn StatusSink>,
    cursor: ExportCursor,
    poll_interval: Duration,
    shutdown_signal: watch::Receiver<bool>,
}

impl Exporter {
    /// Create a new exporter
    pub fn new(
        processor: BatchProcessor,
        status: Arc<dyn StatusSink>,
        cursor: ExportCursor,
        poll_interval: Duration,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            processor,
            status,
            cursor,
            poll_interval,
            shutdown_signal,
        }
    }

    /// Builds an exporter wired to the production collaborators
    ///
    /// Verifies the store connection before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built or the store is unreachable.
    pub async fn from_config(
        config: &ExporterConfig,
        cursor: ExportCursor,
        status: Arc<dyn StatusSink>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let pg_client = PostgreSQLClient::new(config.postgresql.clone())?;
        pg_client.test_connection().await?;
        let store = Arc::new(PostgresRecordStore::new(pg_client));

        let endpoint = Arc::new(ApixClient::new(&config.apix)?);
        let converter = Arc::new(HttpConverter::new(&config.converter)?);
        let index = Arc::new(ElasticIndex::new(&config.elasticsearch)?);
        let urls = ApixUrls::new(&config.apix.host, &config.apix.database);

        tracing::info!(
            apix = %urls.database_url(),
            table = %config.postgresql.table,
            index = %config.elasticsearch.index,
            "Exporter configured"
        );

        let processor =
            BatchProcessor::new(store, endpoint, converter, index, urls, status.clone());

        Ok(Self::new(
            processor,
            status,
            cursor,
            Duration::from_millis(config.export.poll_interval_ms),
            shutdown_signal,
        ))
    }

    /// Current cursor
    pub fn cursor(&self) -> ExportCursor {
        self.cursor
    }

    /// Check if shutdown has been requested
    fn is_shutdown_requested(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    /// Runs one iteration: a next-timestamp pass, then a previously-failed pass
    ///
    /// A pass whose selection fails is reported and skipped; the other pass still runs.
    pub async fn run_once(&mut self, summary: &mut ExportSummary) {
        for selection in [BatchSelection::NextTimestamp, BatchSelection::PreviouslyFailed] {
            match self.processor.process(selection, &mut self.cursor).await {
                Ok(result) => summary.record_batch(&result),
                Err(e) => {
                    summary.aborted_batches += 1;
                    tracing::error!(batch = %selection, error = %e, "Export batch stopped");
                    self.status
                        .output(&format!("Export batch stopped with error: {e}"));
                }
            }
        }
        summary.iterations += 1;
        summary.cursor = self.cursor.newer_than();
    }

    /// Runs until the stop signal is raised and returns a summary of the run
    ///
    /// At least one iteration always runs.
    pub async fn run(mut self) -> ExportSummary {
        let start = Instant::now();
        let mut summary = ExportSummary::new();

        let from = self.cursor.describe();
        tracing::info!(cursor = %from, "Exporter started");
        self.status
            .output(&format!("Beginning export batch from: {from}."));

        loop {
            self.run_once(&mut summary).await;
            self.pause().await;

            if self.is_shutdown_requested() {
                tracing::info!(
                    iterations = summary.iterations,
                    "Shutdown requested, stopping after the current iteration"
                );
                break;
            }
        }

        self.status
            .output("Export batch ended. Will do nothing more without user input.");

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();
        summary
    }

    /// Sleeps for the poll interval, waking early when the stop signal changes
    async fn pause(&mut self) {
        if self.is_shutdown_requested() {
            return;
        }

        let sleep = tokio::time::sleep(self.poll_interval);
        tokio::pin!(sleep);

        tokio::select! {
            _ = &mut sleep => {}
            changed = self.shutdown_signal.changed() => {
                // With the sender gone the signal can never be raised; keep the pace
                if changed.is_err() {
                    sleep.await;
                }
            }
        }
    }
}
