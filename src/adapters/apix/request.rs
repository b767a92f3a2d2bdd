//! APIX request model and URL construction

use crate::domain::{Collection, LegacyId};
use std::fmt;

/// HTTP verb of an APIX call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApixMethod {
    /// Create or update
    Put,
    /// Delete
    Delete,
}

impl fmt::Display for ApixMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApixMethod::Put => f.write_str("PUT"),
            ApixMethod::Delete => f.write_str("DELETE"),
        }
    }
}

/// One fully prepared APIX call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApixRequest {
    /// HTTP verb
    pub method: ApixMethod,

    /// Absolute URL
    pub url: String,

    /// MARCXML body for PUT, `None` for DELETE
    pub body: Option<String>,
}

impl ApixRequest {
    /// A PUT carrying converted record text
    pub fn put(url: String, body: String) -> Self {
        Self {
            method: ApixMethod::Put,
            url,
            body: Some(body),
        }
    }

    /// A body-less DELETE
    pub fn delete(url: String) -> Self {
        Self {
            method: ApixMethod::Delete,
            url,
            body: None,
        }
    }
}

/// URL scheme of one APIX catalog database
///
/// # Examples
///
/// ```
/// use apix_export::adapters::apix::ApixUrls;
///
/// let urls = ApixUrls::new("https://apix.example.org", "libris");
/// assert_eq!(urls.database_url(), "https://apix.example.org/apix/0.1/cat/libris");
/// assert_eq!(urls.new_holding("12345"), "https://apix.example.org/apix/0.1/cat/libris/bib/12345/newhold");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApixUrls {
    database_url: String,
}

impl ApixUrls {
    /// Builds the scheme from the APIX host and database name
    pub fn new(host: &str, database: &str) -> Self {
        Self {
            database_url: format!("{}/apix/0.1/cat/{}", host.trim_end_matches('/'), database),
        }
    }

    /// `{host}/apix/0.1/cat/{database}`
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// URL of an existing legacy record, used for update and delete
    pub fn record(&self, legacy_id: &LegacyId) -> String {
        format!("{}{}", self.database_url, legacy_id.path())
    }

    /// URL for creating a new record in a collection
    pub fn new_record(&self, collection: &Collection) -> String {
        format!("{}/{}/new", self.database_url, collection)
    }

    /// URL for creating a new holding under an existing bib record
    pub fn new_holding(&self, short_bib_id: &str) -> String {
        format!("{}/bib/{}/newhold", self.database_url, short_bib_id)
    }
}
