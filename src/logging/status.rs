//! Human-readable status lines
//!
//! Operators follow the exporter through short free-text lines ("Completed export of 1
//! out of 1 document(s) ..."). They are not structured; structured events go through
//! `tracing` as usual.

use std::io::Write;

/// Receiver of status lines
pub trait StatusSink: Send + Sync {
    /// Emits one status line
    fn output(&self, line: &str);
}

/// Prints status lines to stdout and mirrors them to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn output(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not stop the exporter
        let _ = writeln!(stdout, "{line}");
        tracing::info!(target: "apix_export::status", "{line}");
    }
}
