//! Elasticsearch document client

use crate::adapters::traits::SearchIndex;
use crate::config::ElasticsearchConfig;
use crate::domain::{CatalogRecord, ExportError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;

/// Pushes records to one Elasticsearch index over its REST API
pub struct ElasticIndex {
    client: Client,
    index_url: String,
}

impl ElasticIndex {
    /// Create a new index client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ExportError::Configuration(format!("Failed to build Elasticsearch client: {e}"))
            })?;

        Ok(Self {
            client,
            index_url: format!("{}/{}", config.host.trim_end_matches('/'), config.index),
        })
    }

    /// URL of one record's document
    pub fn document_url(&self, record: &CatalogRecord) -> String {
        format!("{}/_doc/{}", self.index_url, record.id)
    }
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn index(&self, record: &CatalogRecord) -> Result<()> {
        let url = self.document_url(record);

        let request = if record.deleted {
            self.client.delete(&url)
        } else {
            self.client.put(&url).json(&record.to_document())
        };

        let response = request
            .send()
            .await
            .map_err(|e| ExportError::Index(format!("Failed to reach Elasticsearch: {e}")))?;

        let status = response.status();
        // Removing a document the index never had is fine
        if status.is_success() || (record.deleted && status == StatusCode::NOT_FOUND) {
            tracing::debug!(
                record_id = %record.id,
                deleted = record.deleted,
                status = status.as_u16(),
                "Record reindexed"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ExportError::Index(format!(
            "Elasticsearch responded with http {} for {}: {}",
            status.as_u16(),
            record.id,
            body
        )))
    }
}
