//! Record to MARCXML conversion
//!
//! APIX only speaks MARCXML. Conversion is done by an external service; this module
//! wraps it behind [`crate::adapters::traits::FormatConverter`].

pub mod client;

pub use client::HttpConverter;
