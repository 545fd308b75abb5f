//! Engine types
//!
//! Message types and statistics for the sync engine.

use crate::types::LogLevel;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A single record
    Record {
        /// Stream name
        stream: String,
        /// Record as returned by the API
        data: Value,
        /// When the record was emitted
        emitted_at: DateTime<Utc>,
    },
    /// State checkpoint for one stream
    State {
        /// Stream name
        stream: String,
        /// Stream state, `{ "date": "YYYY-MM-DD" }`
        data: Value,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, data: Value) -> Self {
        Self::Record {
            stream: stream.into(),
            data,
            emitted_at: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(stream: impl Into<String>, data: Value) -> Self {
        Self::State {
            stream: stream.into(),
            data,
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Protocol envelope for this message
    pub fn to_json(&self) -> Value {
        match self {
            Self::Record {
                stream,
                data,
                emitted_at,
            } => json!({
                "type": "RECORD",
                "record": {
                    "stream": stream,
                    "data": data,
                    "emitted_at": emitted_at.timestamp_millis()
                }
            }),
            Self::State { stream, data } => json!({
                "type": "STATE",
                "state": {
                    "type": "STREAM",
                    "stream": {
                        "stream_descriptor": { "name": stream },
                        "stream_state": data
                    }
                }
            }),
            Self::Log { level, message } => json!({
                "type": "LOG",
                "log": { "level": level, "message": message }
            }),
        }
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Total daily slices fully consumed
    pub slices_synced: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a slice
    pub fn add_slice(&mut self) {
        self.slices_synced += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
