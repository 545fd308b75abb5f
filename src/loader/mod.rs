//! YAML configuration loader
//!
//! Loads YAML documents whose string values may carry placeholder tokens:
//!
//! - `${NAME}` expands environment variables, shell style
//! - `${secretsmanager:KEY}` or `${secretsmanager:KEY.path.to.value}` is
//!   replaced by a value fetched from a secrets backend
//!
//! A `SecretResolver` owns its backend client and its secret cache, so cache
//! lifetime is the resolver's lifetime and nothing is shared implicitly.

mod env;
mod resolver;
mod secrets;

pub use env::{expand_vars, has_env_token, secret_reference, SecretRef};
pub use resolver::{EnvLookup, SecretResolver};
pub use secrets::{AwsSecretsManager, SecretPayload, SecretsBackend, StaticSecrets};

#[cfg(test)]
mod tests;
