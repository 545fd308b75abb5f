//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::partition::StreamCursor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Field name the cursor is stored under
pub const CURSOR_FIELD: &str = "date";

/// Complete state for the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream state
    #[serde(default)]
    pub streams: HashMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get cursor for a stream
    pub fn get_cursor(&self, stream: &str) -> Option<StreamCursor> {
        self.streams.get(stream)?.date
    }

    /// Set cursor for a stream
    pub fn set_cursor(&mut self, stream: &str, cursor: StreamCursor) {
        self.streams.entry(stream.to_string()).or_default().date = Some(cursor);
    }
}

/// State for a single stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamState {
    /// Last fully consumed day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<StreamCursor>,
}

impl StreamState {
    /// Stream state as the `{ "date": "YYYY-MM-DD" }` mapping
    pub fn to_value(&self) -> Value {
        match self.date {
            Some(cursor) => json!({ CURSOR_FIELD: cursor.to_string() }),
            None => json!({}),
        }
    }
}
