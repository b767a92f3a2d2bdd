//! Validate config command implementation
//!
//! This module implements the `validate-config` command.

use crate::adapters::postgresql::client::redact_connection_string;
use crate::config::load_config;
use crate::core::state::ExportCursor;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // Loading validates as well
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let connection_string: &str = config.postgresql.connection_string.expose_secret().as_ref();

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  APIX Host: {}", config.apix.host);
        println!("  APIX Database: {}", config.apix.database);
        println!(
            "  APIX User: {}",
            config.apix.username.as_deref().unwrap_or("(anonymous)")
        );
        println!("  PostgreSQL: {}", redact_connection_string(connection_string));
        println!("  Record Table: {}", config.postgresql.table);
        println!(
            "  Elasticsearch: {}/{}",
            config.elasticsearch.host, config.elasticsearch.index
        );
        println!("  Converter: {}", config.converter.url);
        println!("  Poll Interval: {}ms", config.export.poll_interval_ms);
        println!(
            "  Start Cursor: {}",
            ExportCursor::from_option(config.export.from).describe()
        );
        println!();
        Ok(0)
    }
}
