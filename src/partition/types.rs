//! Slice and cursor types

use crate::config::{parse_date, DATE_FORMAT};
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;

/// One calendar day of settlement data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateSlice {
    date: NaiveDate,
}

impl DateSlice {
    /// Create a slice for the given day
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// The day this slice covers
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The day as `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Slice as a JSON object keyed by the given cursor field
    pub fn to_value(&self, cursor_field: &str) -> Value {
        json!({ cursor_field: self.date_string() })
    }
}

impl fmt::Display for DateSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(DATE_FORMAT))
    }
}

/// Last fully consumed day of a stream
///
/// Cursors are immutable; `advance` returns the next value instead of
/// mutating in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamCursor(NaiveDate);

impl StreamCursor {
    /// Create a cursor at the given day
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a persisted `YYYY-MM-DD` cursor
    pub fn parse(value: &str) -> Result<Self> {
        parse_date("cursor", value).map(Self)
    }

    /// The cursor day
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Cursor after `slice` has been fully consumed
    ///
    /// Never moves backwards: re-reading lookback days older than the cursor
    /// keeps the cursor where it was.
    #[must_use]
    pub fn advance(current: Option<Self>, slice: &DateSlice) -> Self {
        let next = Self(slice.date());
        match current {
            Some(cursor) if cursor > next => cursor,
            _ => next,
        }
    }
}

impl fmt::Display for StreamCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl From<DateSlice> for StreamCursor {
    fn from(slice: DateSlice) -> Self {
        Self(slice.date())
    }
}

impl Serialize for StreamCursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StreamCursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
