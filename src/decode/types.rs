//! Decoder types and traits

use crate::error::Result;
use serde_json::Value;

/// A decoded response page
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPage {
    /// Records extracted from the envelope
    pub records: Vec<Value>,
    /// The full parsed body, used for pagination
    pub body: Value,
    /// The envelope field was absent or null
    pub missing_records: bool,
}

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Parse the body and extract its records
    fn decode(&self, body: &str) -> Result<DecodedPage>;
}
