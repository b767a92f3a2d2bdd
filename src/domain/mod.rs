//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`], [`ControlNumber`], [`LegacyId`])
//! - **The record model** ([`CatalogRecord`], [`Manifest`])
//! - **Error types** ([`ExportError`], [`ApixError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Internal ids and legacy control numbers are distinct types and cannot be mixed:
//!
//! ```rust
//! use apix_export::domain::{ControlNumber, RecordId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let record_id = RecordId::new("fxql7jqr38b1dkf")?;
//! let control_number = ControlNumber::new("98765")?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{ApixError, ExportError, StoreError};
pub use ids::{Collection, ControlNumber, LegacyId, RecordId, LEGACY_URI_PREFIX};
pub use record::{CatalogRecord, Manifest, APIX_FAILURE_KEY, LEGACY_SYSTEM_ORIGIN};
pub use result::Result;
