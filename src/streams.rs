//! Settlement streams
//!
//! Two incremental streams share one request shape and differ only in their
//! endpoint and whether resumed runs re-read a lookback window:
//!
//! | stream    | path                 | lookback |
//! |-----------|----------------------|----------|
//! | `events`  | `settlements/events` | no       |
//! | `summary` | `settlements/daily`  | yes      |

use crate::config::{ValidatedConfig, DATE_FORMAT};
use crate::error::{Error, Result};
use crate::partition::{DailySlices, DateSlice, SlicePlan, StreamCursor};
use crate::state::CURSOR_FIELD;
use crate::types::{QueryParams, SyncMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Primary key of every settlement record
pub const PRIMARY_KEY: &str = "id";

// ============================================================================
// Stream Kind
// ============================================================================

/// The settlement streams exposed by the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Individual settlement events
    Events,
    /// Daily settlement summaries, which may be revised for a few days
    Summary,
}

impl StreamKind {
    /// All streams in read order
    pub const ALL: [StreamKind; 2] = [StreamKind::Events, StreamKind::Summary];

    /// Stream name
    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Events => "events",
            StreamKind::Summary => "summary",
        }
    }

    /// Endpoint path relative to the regional base URL
    pub fn path(self) -> &'static str {
        match self {
            StreamKind::Events => "settlements/events",
            StreamKind::Summary => "settlements/daily",
        }
    }

    /// Whether resumed runs re-read days behind the cursor
    pub fn uses_lookback(self) -> bool {
        matches!(self, StreamKind::Summary)
    }
}

impl FromStr for StreamKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StreamKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| Error::StreamNotFound {
                stream: s.to_string(),
            })
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Settlement Stream
// ============================================================================

/// A configured settlement stream
#[derive(Debug, Clone)]
pub struct SettlementStream {
    kind: StreamKind,
    merchant_id: String,
    page_limit: Option<u32>,
    plan: SlicePlan,
}

impl SettlementStream {
    /// Configure a stream from validated settings
    pub fn new(kind: StreamKind, config: &ValidatedConfig) -> Self {
        let mut plan = SlicePlan::new(config.start_date, config.end_date);
        if kind.uses_lookback() {
            plan = plan.with_lookback(config.lookback_window_days);
        }

        Self {
            kind,
            merchant_id: config.merchant_id.clone(),
            page_limit: config.page_limit,
            plan,
        }
    }

    /// Override the page size
    #[must_use]
    pub fn with_page_limit(mut self, limit: Option<u32>) -> Self {
        self.page_limit = limit;
        self
    }

    /// Which stream this is
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Stream name
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Endpoint path
    pub fn path(&self) -> &'static str {
        self.kind.path()
    }

    /// Slice plan for this stream
    pub fn plan(&self) -> &SlicePlan {
        &self.plan
    }

    /// Daily slices to read given the persisted cursor and today's date
    pub fn slices(&self, cursor: Option<StreamCursor>, today: NaiveDate) -> DailySlices {
        self.plan.slices(cursor, today)
    }

    /// Query parameters for the first page of a slice
    pub fn request_params(&self, slice: &DateSlice) -> QueryParams {
        self.range_params(slice.date(), slice.date())
    }

    /// Query parameters for an `after..=before` range
    pub fn range_params(&self, after: NaiveDate, before: NaiveDate) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert("merchant_id".to_string(), self.merchant_id.clone());
        params.insert("before".to_string(), before.format(DATE_FORMAT).to_string());
        params.insert("after".to_string(), after.format(DATE_FORMAT).to_string());
        if let Some(limit) = self.page_limit {
            params.insert("limit".to_string(), limit.to_string());
        }
        params
    }

    /// Catalog entry describing this stream
    pub fn catalog_entry(&self) -> CatalogStream {
        CatalogStream {
            name: self.name().to_string(),
            json_schema: record_schema(),
            supported_sync_modes: vec![SyncMode::Incremental],
            source_defined_cursor: true,
            default_cursor_field: vec![CURSOR_FIELD.to_string()],
            source_defined_primary_key: vec![vec![PRIMARY_KEY.to_string()]],
        }
    }
}

/// Records pass through unmodified, so only the key fields are described
fn record_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": true,
        "properties": {
            PRIMARY_KEY: { "type": ["null", "string"] },
            CURSOR_FIELD: { "type": ["null", "string"], "format": "date" }
        }
    })
}

// ============================================================================
// Catalog
// ============================================================================

/// Stream description returned by discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,
    /// JSON Schema of the records
    pub json_schema: Value,
    /// Supported sync modes
    pub supported_sync_modes: Vec<SyncMode>,
    /// Whether the cursor is chosen by the source
    pub source_defined_cursor: bool,
    /// Cursor field path
    pub default_cursor_field: Vec<String>,
    /// Primary key paths
    pub source_defined_primary_key: Vec<Vec<String>>,
}

/// Catalog of available streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}
