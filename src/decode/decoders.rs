//! Decoder implementations

use super::types::{DecodedPage, RecordDecoder};
use crate::error::{Error, Result};
use serde_json::Value;
use tracing::warn;

/// Pulls records out of a named envelope field
///
/// A missing or null field is an empty page, not an error: the API omits
/// `data` on days without settlements.
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder {
    field: String,
}

impl Default for EnvelopeDecoder {
    fn default() -> Self {
        Self {
            field: "data".to_string(),
        }
    }
}

impl EnvelopeDecoder {
    /// Create a decoder for the given envelope field
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Name of the envelope field
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl RecordDecoder for EnvelopeDecoder {
    fn decode(&self, body: &str) -> Result<DecodedPage> {
        let body: Value = serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })?;
        let records = self.records_field(&body)?;
        if records.is_none() {
            warn!(field = %self.field, "Response has no records field, treating page as empty");
        }
        Ok(DecodedPage {
            missing_records: records.is_none(),
            records: records.unwrap_or_default(),
            body,
        })
    }
}

impl EnvelopeDecoder {
    /// Records under the envelope field; `None` when it is absent or null
    fn records_field(&self, body: &Value) -> Result<Option<Vec<Value>>> {
        let Some(object) = body.as_object() else {
            return Err(Error::RecordExtraction {
                field: self.field.clone(),
                message: "response body is not a JSON object".to_string(),
            });
        };

        match object.get(&self.field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(records)) => Ok(Some(records.clone())),
            Some(other) => Err(Error::RecordExtraction {
                field: self.field.clone(),
                message: format!("expected an array, got {}", type_name(other)),
            }),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
