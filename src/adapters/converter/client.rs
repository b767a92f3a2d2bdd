//! HTTP format converter client

use crate::adapters::apix::APIX_CONTENT_TYPE;
use crate::adapters::traits::FormatConverter;
use crate::config::ConverterConfig;
use crate::domain::{CatalogRecord, ExportError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Content type of the documents sent for conversion
pub const JSON_LD_CONTENT_TYPE: &str = "application/ld+json";

/// Converts records by posting their JSON-LD to a conversion service
pub struct HttpConverter {
    client: Client,
    url: String,
}

impl HttpConverter {
    /// Create a new converter client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ConverterConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ExportError::Configuration(format!("Failed to build converter client: {e}"))
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl FormatConverter for HttpConverter {
    async fn convert(&self, record: &CatalogRecord) -> Result<String> {
        let body = serde_json::to_string(&record.data)?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON_LD_CONTENT_TYPE)
            .header(ACCEPT, APIX_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| ExportError::Translation(format!("Failed to reach converter: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExportError::Translation(format!("Failed to read converter response: {e}")))?;

        if !status.is_success() {
            return Err(ExportError::Translation(format!(
                "Converter responded with http {} for {}: {}",
                status.as_u16(),
                record.id,
                text
            )));
        }

        if text.trim().is_empty() {
            return Err(ExportError::Translation(format!(
                "Converter produced no output for {}",
                record.id
            )));
        }

        Ok(text)
    }
}
