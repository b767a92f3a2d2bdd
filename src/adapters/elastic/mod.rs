//! Elasticsearch search index integration
//!
//! Every bookkeeping commit is followed by a push of the record's current state to the
//! search index, so the index never lags behind the exporter's writes.

pub mod client;

pub use client::ElasticIndex;
