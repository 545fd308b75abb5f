//! Tests for the auth module

use super::*;
use base64::Engine;

#[test]
fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    let client = reqwest::Client::new();
    let req = auth.apply(client.get("https://example.com/api"));

    let built = req.build().unwrap();
    assert!(built.headers().get("Authorization").is_none());
}

#[test]
fn test_basic_auth() {
    let auth = Authenticator::new(AuthConfig::basic("user", "pass"));

    let client = reqwest::Client::new();
    let req = auth.apply(client.get("https://example.com/api"));

    let built = req.build().unwrap();
    let auth_header = built
        .headers()
        .get("Authorization")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(auth_header.starts_with("Basic "));

    // Verify base64 encoding
    let encoded = auth_header.strip_prefix("Basic ").unwrap();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), "user:pass");
}

#[test]
fn test_authenticator_exposes_config() {
    let auth = Authenticator::new(AuthConfig::basic("user", "pass"));
    assert_eq!(auth.config(), &AuthConfig::basic("user", "pass"));
}
