//! PostgreSQL primary store integration
//!
//! The catalog's records live in a single PostgreSQL table. This module selects
//! export batches from it and performs version-checked bookkeeping writes.

pub mod client;
pub mod models;
pub mod queries;
pub mod store;

pub use client::PostgreSQLClient;
pub use store::PostgresRecordStore;
