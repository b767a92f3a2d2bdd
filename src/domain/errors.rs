//! Domain error types
//!
//! This module defines the error hierarchy for the exporter.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// APIX (legacy endpoint) errors
    #[error("APIX error: {0}")]
    Apix(#[from] ApixError),

    /// Primary store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Search index errors
    #[error("Index error: {0}")]
    Index(String),

    /// The format converter rejected the record
    #[error("Translation error: {0}")]
    Translation(String),

    /// The record lacks data the export needs (e.g. a holding without its bib)
    #[error("Structural error: {0}")]
    Structure(String),

    /// A committed record could not be read back
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// APIX-specific errors
///
/// Errors that occur when talking to the legacy integration endpoint.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum ApixError {
    /// Failed to reach the endpoint
    #[error("Failed to connect to APIX: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// HTTP 200 on PUT, which APIX only returns on error
    #[error("APIX error: {0}")]
    DisguisedFailure(String),

    /// Any status the protocol does not expect
    #[error("APIX responded with http {status}: {body}")]
    Transport { status: u16, body: String },

    /// 201/303 without a Location header
    #[error("APIX response lacked a Location header")]
    MissingLocation,

    /// Location header did not end in a control number
    #[error("Could not parse control number from APIX location header: {0}")]
    UnparsableLocation(String),
}

/// Primary store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to obtain a connection
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The record changed between read and write
    #[error("Concurrent modification of record {0}")]
    Conflict(String),

    /// The record disappeared between read and write
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A row could not be turned into a record
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}
