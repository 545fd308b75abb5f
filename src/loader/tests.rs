//! Tests for the YAML loader

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_yaml::Value;
use std::collections::HashMap;
use std::sync::Arc;
use test_case::test_case;

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

fn backend() -> Arc<StaticSecrets> {
    Arc::new(
        StaticSecrets::new()
            .with_secret("MY_SECRET_PASSWORD", "Secret From SecretsManager")
            .with_secret(
                "MY_NESTED_SECRET",
                r#"{"NESTED_STRUCT": {"VERY_NESTED_VALUE": "FOUND NESTED VALUE", "ANOTHER_VERY_NESTED_VALUE": "FOUND ANOTHER NESTED VALUE"}}"#,
            )
            .with_secret("PADDED", "  {\"a\": 1}")
            .with_secret("BROKEN", "{not json"),
    )
}

fn resolver(backend: Arc<StaticSecrets>, vars: &[(&str, &str)]) -> SecretResolver {
    SecretResolver::new(backend).with_env(env(vars))
}

fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
}

// ============================================================================
// Token parsing
// ============================================================================

#[test_case("${HOME}", true ; "braced name")]
#[test_case("prefix-${HOME}-suffix", true ; "embedded")]
#[test_case("${secretsmanager:KEY}", false ; "secret token")]
#[test_case("$HOME", false ; "bare dollar")]
#[test_case("plain", false ; "no token")]
fn test_has_env_token(text: &str, expected: bool) {
    assert_eq!(has_env_token(text), expected);
}

#[test_case("${secretsmanager:K}", "K", &[] ; "whole secret")]
#[test_case("${secretsmanager:K.a.b}", "K", &["a", "b"] ; "dotted path")]
#[test_case("${secretsmanager:K.a.}", "K", &["a"] ; "trailing dot trimmed")]
#[test_case("x ${secretsmanager:K.a} y", "K", &["a"] ; "surrounding text")]
fn test_secret_reference(text: &str, key: &str, path: &[&str]) {
    let reference = secret_reference(text).unwrap();
    assert_eq!(reference.key, key);
    assert_eq!(reference.path, path.iter().map(|s| s.to_string()).collect::<Vec<_>>());
}

#[test]
fn test_secret_reference_absent() {
    assert!(secret_reference("${MY_VAR}").is_none());
    assert!(secret_reference("secretsmanager:K").is_none());
}

#[test_case("${MY_VAR}", "x" ; "braced")]
#[test_case("$MY_VAR", "x" ; "bare")]
#[test_case("a-${MY_VAR}-b", "a-x-b" ; "partial text preserved")]
#[test_case("${UNSET}", "" ; "undefined is empty")]
#[test_case("${MY_VAR}/${UNSET}/$MY_VAR", "x//x" ; "mixed")]
#[test_case("$1 and ${not valid}", "$1 and ${not valid}" ; "invalid names kept")]
fn test_expand_vars(text: &str, expected: &str) {
    assert_eq!(expand_vars(text, env(&[("MY_VAR", "x")])), expected);
}

// ============================================================================
// Payloads
// ============================================================================

#[test]
fn test_payload_classification() {
    assert_eq!(
        SecretPayload::from_raw("k", "hunter2".to_string()).unwrap(),
        SecretPayload::Scalar("hunter2".to_string())
    );
    assert!(matches!(
        SecretPayload::from_raw("k", "  {\"a\": 1}".to_string()).unwrap(),
        SecretPayload::Structured(_)
    ));
    assert!(matches!(
        SecretPayload::from_raw("k", "{oops".to_string()).unwrap_err(),
        Error::SecretFetch { .. }
    ));
}

#[test]
fn test_payload_lookup_errors_name_segment() {
    let payload =
        SecretPayload::from_raw("K", r#"{"a": {"b": "v"}, "s": "flat"}"#.to_string()).unwrap();

    assert_eq!(payload.lookup("K", &["a", "b"]).unwrap(), serde_json::json!("v"));

    let err = payload.lookup("K", &["a", "c"]).unwrap_err();
    assert!(matches!(err, Error::SecretLookup { ref segment, .. } if segment == "c"));

    let err = payload.lookup("K", &["s", "deeper"]).unwrap_err();
    assert!(matches!(err, Error::SecretLookup { ref segment, .. } if segment == "deeper"));

    let scalar = SecretPayload::Scalar("v".to_string());
    assert!(matches!(
        scalar.lookup("K", &["a"]).unwrap_err(),
        Error::SecretLookup { ref segment, .. } if segment == "a"
    ));
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_resolves_env_and_secrets() {
    let backend = backend();
    let mut resolver = resolver(
        backend.clone(),
        &[("MY_SECRET_PASSWORD", "shh"), ("ANOTHER_SECRET_VALUE", "lock")],
    );

    let resolved = resolver
        .load_str(
            r"
my_secret_password: ${MY_SECRET_PASSWORD}
another_secret_value: ${ANOTHER_SECRET_VALUE}
my_secret_password_2: ${secretsmanager:MY_SECRET_PASSWORD}
my_nested_secret: ${secretsmanager:MY_NESTED_SECRET.NESTED_STRUCT.VERY_NESTED_VALUE}
another_nested_secret: ${secretsmanager:MY_NESTED_SECRET.NESTED_STRUCT.ANOTHER_VERY_NESTED_VALUE}
",
        )
        .await
        .unwrap();

    assert_eq!(
        resolved,
        yaml(
            r"
my_secret_password: shh
another_secret_value: lock
my_secret_password_2: Secret From SecretsManager
my_nested_secret: FOUND NESTED VALUE
another_nested_secret: FOUND ANOTHER NESTED VALUE
"
        )
    );
    assert_eq!(backend.fetch_count(), 2);
    assert!(resolver.is_cached("MY_NESTED_SECRET"));
}

#[tokio::test]
async fn test_undefined_env_resolves_empty() {
    let mut resolver = resolver(backend(), &[]);
    let resolved = resolver.load_str("password: ${MY_VAR}").await.unwrap();
    assert_eq!(resolved, yaml("password: ''"));
}

#[tokio::test]
async fn test_same_key_fetched_once() {
    let backend = backend();
    let mut resolver = resolver(backend.clone(), &[]);

    let resolved = resolver
        .load_str(
            r"
first: ${secretsmanager:MY_NESTED_SECRET.NESTED_STRUCT.VERY_NESTED_VALUE}
nested:
  - ${secretsmanager:MY_NESTED_SECRET.NESTED_STRUCT.ANOTHER_VERY_NESTED_VALUE}
",
        )
        .await
        .unwrap();
    assert_eq!(resolved["nested"][0], Value::from("FOUND ANOTHER NESTED VALUE"));
    assert_eq!(backend.fetch_count(), 1);

    resolver
        .load_str("again: ${secretsmanager:MY_NESTED_SECRET}")
        .await
        .unwrap();
    assert_eq!(backend.fetch_count(), 1, "cache outlives a single document");
    assert_eq!(resolver.cache_len(), 1);
}

#[tokio::test]
async fn test_separate_resolvers_do_not_share_cache() {
    let backend = backend();
    for _ in 0..2 {
        let mut resolver = resolver(backend.clone(), &[]);
        resolver
            .load_str("v: ${secretsmanager:MY_SECRET_PASSWORD}")
            .await
            .unwrap();
    }
    assert_eq!(backend.fetch_count(), 2);
}

#[tokio::test]
async fn test_structured_secret_replaces_whole_node() {
    let mut resolver = resolver(backend(), &[]);
    let resolved = resolver
        .load_str("creds: ${secretsmanager:MY_NESTED_SECRET.NESTED_STRUCT}")
        .await
        .unwrap();
    let creds = resolved["creds"].as_mapping().unwrap();
    assert_eq!(creds.len(), 2);
    assert_eq!(
        resolved["creds"]["VERY_NESTED_VALUE"],
        Value::from("FOUND NESTED VALUE")
    );
    assert_eq!(
        resolved["creds"]["ANOTHER_VERY_NESTED_VALUE"],
        Value::from("FOUND ANOTHER NESTED VALUE")
    );

    let resolved = resolver
        .load_str("n: ${secretsmanager:PADDED.a}")
        .await
        .unwrap();
    assert_eq!(resolved, yaml("n: 1"));
}

#[tokio::test]
async fn test_missing_path_segment_fails() {
    let mut resolver = resolver(backend(), &[]);
    let err = resolver
        .load_str("v: ${secretsmanager:MY_NESTED_SECRET.NESTED_STRUCT.MISSING}")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SecretLookup { ref segment, .. } if segment == "MISSING"));
}

#[tokio::test]
async fn test_unknown_secret_fails() {
    let mut resolver = resolver(backend(), &[]);
    let err = resolver
        .load_str("v: ${secretsmanager:NOPE}")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SecretFetch { ref key, .. } if key == "NOPE"));
}

#[tokio::test]
async fn test_invalid_structured_secret_fails() {
    let mut resolver = resolver(backend(), &[]);
    assert!(resolver
        .load_str("v: ${secretsmanager:BROKEN}")
        .await
        .is_err());
    assert!(!resolver.is_cached("BROKEN"));
}

#[tokio::test]
async fn test_env_pattern_wins_over_secret() {
    let backend = backend();
    let mut resolver = resolver(backend.clone(), &[("A", "a")]);
    let resolved = resolver
        .load_str("v: ${A}-${secretsmanager:MY_SECRET_PASSWORD}")
        .await
        .unwrap();
    assert_eq!(resolved, yaml("v: a-${secretsmanager:MY_SECRET_PASSWORD}"));
    assert_eq!(backend.fetch_count(), 0);
}

#[tokio::test]
async fn test_untouched_nodes_preserved() {
    let mut resolver = resolver(backend(), &[("PORT", "5432")]);
    let resolved = resolver
        .load_str(
            r"
${PORT}: key stays literal
port: ${PORT}
count: 3
enabled: true
plain: hello
tagged: !custom ${PORT}
",
        )
        .await
        .unwrap();

    assert_eq!(resolved["${PORT}"], Value::from("key stays literal"));
    assert_eq!(resolved["port"], Value::from("5432"));
    assert_eq!(resolved["count"], Value::from(3));
    assert_eq!(resolved["enabled"], Value::from(true));
    assert_eq!(resolved["plain"], Value::from("hello"));
    match &resolved["tagged"] {
        Value::Tagged(tagged) => assert_eq!(tagged.value, Value::from("5432")),
        other => panic!("expected tagged value, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mapping_keys_are_never_resolved() {
    let backend = backend();
    let mut resolver = resolver(backend.clone(), &[("HOST", "db.internal")]);
    let resolved = resolver
        .load_str(
            r"
${secretsmanager:MY_SECRET_PASSWORD}: secret-looking key
${HOST}: env-looking key
nested:
  ${HOST}: ${HOST}
",
        )
        .await
        .unwrap();

    assert_eq!(
        resolved["${secretsmanager:MY_SECRET_PASSWORD}"],
        Value::from("secret-looking key")
    );
    assert_eq!(resolved["${HOST}"], Value::from("env-looking key"));
    assert_eq!(resolved["nested"]["${HOST}"], Value::from("db.internal"));
    assert_eq!(backend.fetch_count(), 0, "keys never trigger a fetch");
}

#[tokio::test]
async fn test_load_as_typed() {
    #[derive(serde::Deserialize)]
    struct Creds {
        user: String,
        password: String,
    }

    let mut resolver = resolver(backend(), &[("API_USER", "pub")]);
    let creds: Creds = resolver
        .load_as("user: ${API_USER}\npassword: ${secretsmanager:MY_SECRET_PASSWORD}")
        .await
        .unwrap();
    assert_eq!(creds.user, "pub");
    assert_eq!(creds.password, "Secret From SecretsManager");
}

#[tokio::test]
async fn test_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "user: ${API_USER}\n").unwrap();

    let mut resolver = resolver(backend(), &[("API_USER", "pub")]);
    assert_eq!(resolver.load_file(&path).await.unwrap(), yaml("user: pub"));

    let err = resolver
        .load_file(dir.path().join("missing.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}
