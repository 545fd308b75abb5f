//! Token matching and environment expansion

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `${NAME}` where NAME has no `:`, `{`, `}` or `^`
static ENV_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}^:{]+\}").expect("valid env token regex"));

/// `${secretsmanager:KEY[.path]}`
static SECRET_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{secretsmanager:([^}^{]+)\}").expect("valid secret token regex")
});

/// `$NAME` or `${NAME}` with a shell identifier
static EXPAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("valid expansion regex")
});

/// A parsed `${secretsmanager:...}` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    /// Secret identifier passed to the backend
    pub key: String,
    /// Path segments into a structured payload; empty for the whole secret
    pub path: Vec<String>,
}

/// Whether a scalar should be expanded against the environment
pub fn has_env_token(text: &str) -> bool {
    ENV_TOKEN_REGEX.is_match(text)
}

/// The first secret reference in a scalar, if any
///
/// The key runs up to the first `.`; the rest, with surrounding dots
/// trimmed, is the path.
pub fn secret_reference(text: &str) -> Option<SecretRef> {
    let inner = SECRET_TOKEN_REGEX.captures(text)?.get(1)?.as_str();
    let (key, path) = match inner.split_once('.') {
        Some((key, rest)) => (key, rest.trim_matches('.')),
        None => (inner, ""),
    };

    Some(SecretRef {
        key: key.to_string(),
        path: if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::to_string).collect()
        },
    })
}

/// Expand `$NAME` and `${NAME}` using `lookup`
///
/// Undefined variables expand to an empty string. Text that is not a valid
/// variable reference is kept verbatim.
pub fn expand_vars<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    EXPAND_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}
