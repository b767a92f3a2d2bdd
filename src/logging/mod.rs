//! Logging and observability
//!
//! Two channels:
//! - structured `tracing` events, to the console and optionally rotated JSON files
//!   ([`init_logging`])
//! - free-text operator status lines ([`StatusSink`])
//!
//! # Example
//!
//! ```no_run
//! use apix_export::logging::init_logging;
//! use apix_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod status;
pub mod structured;

// Re-export commonly used items
pub use status::{ConsoleStatus, StatusSink};
pub use structured::{init_logging, LoggingGuard};

/// Log the outcome of one record export
///
/// # Example
///
/// ```no_run
/// use apix_export::log_record_exported;
///
/// log_record_exported!("fxql7jqr38b1dkf", "update", "bib");
/// ```
#[macro_export]
macro_rules! log_record_exported {
    ($record_id:expr, $operation:expr, $collection:expr) => {
        tracing::info!(
            record_id = %$record_id,
            operation = %$operation,
            collection = %$collection,
            "Record exported"
        );
    };
}

/// Log a failed record export
///
/// # Example
///
/// ```no_run
/// use apix_export::log_record_failed;
/// use apix_export::domain::ExportError;
///
/// let error = ExportError::Translation("no MARC mapping".to_string());
/// log_record_failed!("fxql7jqr38b1dkf", &error);
/// ```
#[macro_export]
macro_rules! log_record_failed {
    ($record_id:expr, $error:expr) => {
        tracing::error!(
            record_id = %$record_id,
            error = %$error,
            "Record export failed"
        );
    };
}
