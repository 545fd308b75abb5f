//! Secrets backends and payloads

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Source of raw secret strings
#[async_trait]
pub trait SecretsBackend: Send + Sync {
    /// Fetch the raw secret string stored under `key`
    async fn fetch_secret(&self, key: &str) -> Result<String>;
}

// ============================================================================
// Payload
// ============================================================================

/// A fetched secret, classified once at fetch time
#[derive(Debug, Clone, PartialEq)]
pub enum SecretPayload {
    /// Plain string secret
    Scalar(String),
    /// JSON object secret
    Structured(JsonObject),
}

impl SecretPayload {
    /// Classify a raw secret string
    ///
    /// A string whose first non-whitespace character is `{` must be a JSON
    /// object; anything else is kept verbatim.
    pub fn from_raw(key: &str, raw: String) -> Result<Self> {
        if !raw.trim_start().starts_with('{') {
            return Ok(Self::Scalar(raw));
        }

        serde_json::from_str::<JsonObject>(&raw)
            .map(Self::Structured)
            .map_err(|e| Error::secret_fetch(key, format!("secret is not a valid JSON object: {e}")))
    }

    /// Walk `path` into the payload
    ///
    /// Every segment must name a key of a JSON object; the error names the
    /// first segment that does not.
    pub fn lookup<S: AsRef<str>>(&self, key: &str, path: &[S]) -> Result<JsonValue> {
        let root = match self {
            Self::Scalar(s) => {
                return match path.first() {
                    Some(segment) => Err(Error::secret_lookup(
                        key,
                        segment.as_ref(),
                        "secret is a plain string",
                    )),
                    None => Ok(JsonValue::String(s.clone())),
                };
            }
            Self::Structured(map) => map,
        };

        let mut value: Option<&JsonValue> = None;
        for segment in path {
            let segment = segment.as_ref();
            let map = match value {
                None => root,
                Some(JsonValue::Object(map)) => map,
                Some(_) => return Err(Error::secret_lookup(key, segment, "value is not a mapping")),
            };
            value = Some(
                map.get(segment)
                    .ok_or_else(|| Error::secret_lookup(key, segment, "key not found"))?,
            );
        }

        Ok(value.map_or_else(|| JsonValue::Object(root.clone()), Clone::clone))
    }
}

// ============================================================================
// AWS Secrets Manager
// ============================================================================

/// Secrets backend reading `SecretString` values from AWS Secrets Manager
#[derive(Debug, Clone)]
pub struct AwsSecretsManager {
    client: Client,
}

impl AwsSecretsManager {
    /// Region used when none is configured
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    /// Build a client for `region` from the default credential chain
    pub async fn from_region(region: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        Self::new(Client::new(&config))
    }

    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretsBackend for AwsSecretsManager {
    async fn fetch_secret(&self, key: &str) -> Result<String> {
        debug!(key, "Fetching secret");
        let output = self
            .client
            .get_secret_value()
            .secret_id(key)
            .send()
            .await
            .map_err(|e| Error::secret_fetch(key, DisplayErrorContext(&e).to_string()))?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| Error::secret_fetch(key, "secret has no string value"))
    }
}

// ============================================================================
// Static secrets
// ============================================================================

/// In-memory secrets backend that counts fetches
#[derive(Debug, Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl StaticSecrets {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret
    #[must_use]
    pub fn with_secret(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), value.into());
        self
    }

    /// Number of fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretsBackend for StaticSecrets {
    async fn fetch_secret(&self, key: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .get(key)
            .cloned()
            .ok_or_else(|| Error::secret_fetch(key, "secret not found"))
    }
}
