//! Export cursor
//!
//! The cursor is the timestamp boundary of export progress: every record modified at or
//! before it has been attempted at least once. It lives only in the exporter process and
//! is re-seeded from the `--from` argument (or configuration) at start-up.

use chrono::{DateTime, SecondsFormat, Utc};

/// Process-local export progress marker
///
/// # Examples
///
/// ```
/// use apix_export::core::state::ExportCursor;
/// use chrono::{TimeZone, Utc};
///
/// let mut cursor = ExportCursor::beginning();
/// assert_eq!(cursor.describe(), "[beginning of time]");
///
/// let t = Utc.with_ymd_and_hms(2017, 3, 1, 12, 0, 0).unwrap();
/// assert!(cursor.advance(t));
/// assert!(!cursor.advance(t));
/// assert_eq!(cursor.newer_than(), Some(t));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportCursor {
    newer_than: Option<DateTime<Utc>>,
}

impl ExportCursor {
    /// A cursor that selects everything
    pub fn beginning() -> Self {
        Self { newer_than: None }
    }

    /// A cursor that selects records modified strictly after `instant`
    pub fn starting_at(instant: DateTime<Utc>) -> Self {
        Self {
            newer_than: Some(instant),
        }
    }

    /// Seeds from an optional start instant
    pub fn from_option(instant: Option<DateTime<Utc>>) -> Self {
        Self {
            newer_than: instant,
        }
    }

    /// Lower bound (exclusive) of the next batch, `None` before the first batch
    pub fn newer_than(&self) -> Option<DateTime<Utc>> {
        self.newer_than
    }

    /// Whether a modification instant lies beyond the cursor
    pub fn is_after(&self, modified: DateTime<Utc>) -> bool {
        self.newer_than.map_or(true, |bound| modified > bound)
    }

    /// Moves the cursor forward to `instant`. Never moves it backwards.
    ///
    /// Returns whether the cursor moved.
    pub fn advance(&mut self, instant: DateTime<Utc>) -> bool {
        if self.is_after(instant) {
            self.newer_than = Some(instant);
            true
        } else {
            false
        }
    }

    /// Human-readable form used in status lines
    pub fn describe(&self) -> String {
        match self.newer_than {
            Some(instant) => instant.to_rfc3339_opts(SecondsFormat::Micros, true),
            None => "[beginning of time]".to_string(),
        }
    }
}
