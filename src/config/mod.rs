//! Configuration management for the exporter.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `APIX_EXPORT_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation with descriptive messages
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use apix_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("apix-export.toml")?;
//!
//! println!("APIX: {}", config.apix.host);
//! println!("Record table: {}", config.postgresql.table);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ApixConfig`] - APIX host, database and credentials
//! - [`PostgreSQLConfig`] - Record store connection
//! - [`ElasticsearchConfig`] - Search index
//! - [`ConverterConfig`] - MARCXML conversion service
//! - [`ExportConfig`] - Loop interval and start cursor
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [apix]
//! host = "https://apix.example.org"
//! username = "exporter"
//! password = "${APIX_PASSWORD}"
//!
//! [postgresql]
//! connection_string = "${LDDB_CONNECTION_STRING}"
//!
//! [elasticsearch]
//! host = "http://localhost:9200"
//! index = "libris"
//!
//! [converter]
//! url = "http://localhost:8180/marcframe/convert"
//!
//! [export]
//! from = "2017-03-01T00:00:00Z"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApixConfig, ApplicationConfig, ConverterConfig, ElasticsearchConfig, Environment,
    ExportConfig, ExporterConfig, LoggingConfig, PostgreSQLConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
