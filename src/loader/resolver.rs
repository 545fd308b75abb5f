//! Token resolution over parsed YAML

use super::env::{expand_vars, has_env_token, secret_reference};
use super::secrets::{SecretPayload, SecretsBackend};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Environment variable lookup
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves `${...}` tokens in YAML documents
///
/// Secrets are fetched at most once per key for the lifetime of the
/// resolver. Only mapping values and sequence items are resolved; mapping
/// keys are left as written.
pub struct SecretResolver {
    backend: Arc<dyn SecretsBackend>,
    cache: HashMap<String, SecretPayload>,
    env: EnvLookup,
}

impl SecretResolver {
    /// Create a resolver reading the process environment
    pub fn new(backend: Arc<dyn SecretsBackend>) -> Self {
        Self {
            backend,
            cache: HashMap::new(),
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replace the environment lookup
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Whether a secret is already cached
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Number of cached secrets
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Parse and resolve a YAML string
    pub async fn load_str(&mut self, text: &str) -> Result<Value> {
        let document: Value = serde_yaml::from_str(text)?;
        self.resolve(document).await
    }

    /// Read, parse and resolve a YAML file
    pub async fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        self.load_str(&text).await
    }

    /// Parse, resolve and deserialize a YAML string
    pub async fn load_as<T: DeserializeOwned>(&mut self, text: &str) -> Result<T> {
        let value = self.load_str(text).await?;
        Ok(serde_yaml::from_value(value)?)
    }

    /// Resolve every token in an already-parsed document
    pub async fn resolve(&mut self, document: Value) -> Result<Value> {
        let mut keys = Vec::new();
        collect_secret_keys(&document, &mut keys);
        for key in keys {
            self.ensure_cached(&key).await?;
        }
        self.substitute(document)
    }

    async fn ensure_cached(&mut self, key: &str) -> Result<()> {
        if self.cache.contains_key(key) {
            return Ok(());
        }
        if key.is_empty() {
            return Err(Error::secret_fetch(key, "secret reference has an empty key"));
        }

        let raw = self.backend.fetch_secret(key).await?;
        let payload = SecretPayload::from_raw(key, raw)?;
        debug!(
            key,
            structured = matches!(payload, SecretPayload::Structured(_)),
            "Cached secret"
        );
        self.cache.insert(key.to_string(), payload);
        Ok(())
    }

    fn substitute(&self, node: Value) -> Result<Value> {
        Ok(match node {
            Value::String(text) => self.resolve_scalar(text)?,
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| self.substitute(item))
                    .collect::<Result<_>>()?,
            ),
            Value::Mapping(entries) => {
                let mut resolved = Mapping::with_capacity(entries.len());
                // keys stay literal
                for (key, value) in entries {
                    resolved.insert(key, self.substitute(value)?);
                }
                Value::Mapping(resolved)
            }
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                Value::Tagged(Box::new(TaggedValue {
                    tag,
                    value: self.substitute(value)?,
                }))
            }
            other => other,
        })
    }

    fn resolve_scalar(&self, text: String) -> Result<Value> {
        if has_env_token(&text) {
            return Ok(Value::String(expand_vars(&text, |name| (self.env)(name))));
        }

        let Some(reference) = secret_reference(&text) else {
            return Ok(Value::String(text));
        };
        let payload = self
            .cache
            .get(&reference.key)
            .ok_or_else(|| Error::secret_fetch(&reference.key, "secret was not fetched"))?;
        let value = payload.lookup(&reference.key, &reference.path)?;
        Ok(serde_yaml::to_value(value)?)
    }
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("cached_keys", &self.cache.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Secret keys referenced by the document, in traversal order, deduplicated
fn collect_secret_keys(node: &Value, keys: &mut Vec<String>) {
    match node {
        Value::String(text) if !has_env_token(text) => {
            if let Some(reference) = secret_reference(text) {
                if !keys.contains(&reference.key) {
                    keys.push(reference.key);
                }
            }
        }
        Value::Sequence(items) => items.iter().for_each(|item| collect_secret_keys(item, keys)),
        Value::Mapping(entries) => entries
            .values()
            .for_each(|value| collect_secret_keys(value, keys)),
        Value::Tagged(tagged) => collect_secret_keys(&tagged.value, keys),
        _ => {}
    }
}
