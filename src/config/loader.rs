//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ExporterConfig;
use super::secret_string;
use crate::domain::errors::ExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment variables that override configuration values
pub const ENV_PREFIX: &str = "APIX_EXPORT";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExporterConfig
/// 4. Applies environment variable overrides (APIX_EXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use apix_export::config::loader::load_config;
///
/// let config = load_config("apix-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExportError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parses and validates configuration text
///
/// # Errors
///
/// Returns an error if substitution, parsing or validation fails.
pub fn parse_config(contents: &str) -> Result<ExporterConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ExporterConfig = toml::from_str(&contents)
        .map_err(|e| ExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left alone.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExportError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(ExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{key}")).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        ExportError::Configuration(format!(
            "Invalid value '{value}' for environment variable {ENV_PREFIX}_{key}"
        ))
    })
}

/// Applies environment variable overrides using the APIX_EXPORT_* prefix
///
/// Environment variables follow the pattern: APIX_EXPORT_<SECTION>_<KEY>
/// For example: APIX_EXPORT_APIX_HOST, APIX_EXPORT_EXPORT_POLL_INTERVAL_MS
fn apply_env_overrides(config: &mut ExporterConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // APIX overrides
    if let Some(val) = env_var("APIX_HOST") {
        config.apix.host = val;
    }
    if let Some(val) = env_var("APIX_DATABASE") {
        config.apix.database = val;
    }
    if let Some(val) = env_var("APIX_USERNAME") {
        config.apix.username = Some(val);
    }
    if let Some(val) = env_var("APIX_PASSWORD") {
        config.apix.password = Some(secret_string(val));
    }
    if let Some(val) = env_var("APIX_TIMEOUT_SECONDS") {
        config.apix.timeout_seconds = parse_env("APIX_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = env_var("APIX_TLS_VERIFY") {
        config.apix.tls_verify = parse_env("APIX_TLS_VERIFY", &val)?;
    }

    // PostgreSQL overrides
    if let Some(val) = env_var("POSTGRESQL_CONNECTION_STRING") {
        config.postgresql.connection_string = secret_string(val);
    }
    if let Some(val) = env_var("POSTGRESQL_TABLE") {
        config.postgresql.table = val;
    }
    if let Some(val) = env_var("POSTGRESQL_MAX_CONNECTIONS") {
        config.postgresql.max_connections = parse_env("POSTGRESQL_MAX_CONNECTIONS", &val)?;
    }

    // Elasticsearch overrides
    if let Some(val) = env_var("ELASTICSEARCH_HOST") {
        config.elasticsearch.host = val;
    }
    if let Some(val) = env_var("ELASTICSEARCH_INDEX") {
        config.elasticsearch.index = val;
    }

    // Converter overrides
    if let Some(val) = env_var("CONVERTER_URL") {
        config.converter.url = val;
    }

    // Export overrides
    if let Some(val) = env_var("EXPORT_POLL_INTERVAL_MS") {
        config.export.poll_interval_ms = parse_env("EXPORT_POLL_INTERVAL_MS", &val)?;
    }
    if let Some(val) = env_var("EXPORT_FROM") {
        config.export.from = Some(parse_env("EXPORT_FROM", &val)?);
    }

    // Logging overrides
    if let Some(val) = env_var("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
