//! External system integrations.
//!
//! This module provides adapters for the systems the exporter talks to:
//!
//! - [`postgresql`] - The primary record store
//! - [`apix`] - The APIX legacy endpoint
//! - [`converter`] - Record to MARCXML conversion service
//! - [`elastic`] - Elasticsearch search index
//!
//! # Design Pattern
//!
//! Each adapter implements one of the collaborator traits in [`traits`]. The export
//! pipeline only sees the traits, so tests drive it with in-memory implementations.
//!
//! ```rust,no_run
//! use apix_export::adapters::apix::ApixClient;
//! use apix_export::config::{secret_string, ApixConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApixConfig {
//!     host: "https://apix.example.org".to_string(),
//!     username: Some("exporter".to_string()),
//!     password: Some(secret_string("pass".to_string())),
//!     ..Default::default()
//! };
//!
//! let client = ApixClient::new(&config)?;
//! # Ok(())
//! # }
//! ```

pub mod apix;
pub mod converter;
pub mod elastic;
pub mod postgresql;
pub mod traits;

pub use traits::{
    FormatConverter, LegacyEndpoint, RecordStore, SearchIndex, SelectedRecords,
    UnreadableRecord, VersionToken, Versioned,
};
