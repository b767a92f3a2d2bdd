//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for the identifiers the exporter juggles:
//! the catalog's own record ids and the legacy system's control numbers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// URI prefix under which legacy identifiers are embedded in a record.
///
/// These URIs reference legacy control numbers, which never change.
pub const LEGACY_URI_PREFIX: &str = "http://libris.kb.se/";

/// Internal catalog record identifier
///
/// # Examples
///
/// ```
/// use apix_export::domain::ids::RecordId;
/// use std::str::FromStr;
///
/// let id = RecordId::from_str("fxql7jqr38b1dkf").unwrap();
/// assert_eq!(id.as_str(), "fxql7jqr38b1dkf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new RecordId, rejecting blank input
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Record ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the record ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Record collection, as named in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Bibliographic record
    Bib,
    /// Authority record
    Auth,
    /// Holding record
    Hold,
    /// Administrative definitions, never exported
    Definitions,
    /// Anything else
    Other(String),
}

impl Collection {
    /// Path segment used in URLs and identifier URIs
    pub fn as_str(&self) -> &str {
        match self {
            Collection::Bib => "bib",
            Collection::Auth => "auth",
            Collection::Hold => "hold",
            Collection::Definitions => "definitions",
            Collection::Other(name) => name,
        }
    }

    /// Whether the legacy system has a record type for this collection
    pub fn is_legacy_type(&self) -> bool {
        matches!(self, Collection::Bib | Collection::Auth | Collection::Hold)
    }
}

impl From<&str> for Collection {
    fn from(s: &str) -> Self {
        match s {
            "bib" => Collection::Bib,
            "auth" => Collection::Auth,
            "hold" => Collection::Hold,
            "definitions" => Collection::Definitions,
            other => Collection::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric control number assigned by the legacy system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlNumber(String);

impl ControlNumber {
    /// Creates a control number; only ASCII digits are accepted
    pub fn new(number: impl Into<String>) -> Result<Self, String> {
        let number = number.into();
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Invalid control number: '{number}'"));
        }
        Ok(Self(number))
    }

    /// Returns the control number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ControlNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Legacy identifier of the form `{bib|auth|hold}/<number>`
///
/// # Examples
///
/// ```
/// use apix_export::domain::ids::LegacyId;
///
/// let id = LegacyId::from_uri("http://libris.kb.se/bib/12345").unwrap();
/// assert_eq!(id.path(), "/bib/12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegacyId {
    collection: Collection,
    number: String,
}

impl LegacyId {
    /// Creates a legacy id for a collection the legacy system knows about
    pub fn new(collection: Collection, number: ControlNumber) -> Result<Self, String> {
        if !collection.is_legacy_type() {
            return Err(format!(
                "Collection '{collection}' has no legacy counterpart"
            ));
        }
        Ok(Self {
            collection,
            number: number.0,
        })
    }

    /// Recognises a legacy identifier URI
    ///
    /// The URI must carry [`LEGACY_URI_PREFIX`] followed by `auth/`, `bib/` or `hold/`.
    /// Whatever follows the collection segment is kept as-is.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(LEGACY_URI_PREFIX)?;
        let (segment, number) = rest.split_once('/')?;
        let collection = match segment {
            "auth" => Collection::Auth,
            "bib" => Collection::Bib,
            "hold" => Collection::Hold,
            _ => return None,
        };
        Some(Self {
            collection,
            number: number.to_string(),
        })
    }

    /// Path form appended to the APIX database URL, e.g. `/bib/123`
    pub fn path(&self) -> String {
        format!("/{}/{}", self.collection, self.number)
    }

    /// Record identifier URI, e.g. `http://libris.kb.se/bib/123`
    pub fn record_uri(&self) -> String {
        format!("{LEGACY_URI_PREFIX}{}/{}", self.collection, self.number)
    }

    /// Thing ("resource") identifier URI, e.g. `http://libris.kb.se/resource/bib/123`
    pub fn resource_uri(&self) -> String {
        format!(
            "{LEGACY_URI_PREFIX}resource/{}/{}",
            self.collection, self.number
        )
    }
}

impl fmt::Display for LegacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.number)
    }
}
