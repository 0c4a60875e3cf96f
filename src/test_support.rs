//! Usage: Public test helpers for integration tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::collections::HashMap;

/// A JWT-shaped token with the given claims and a junk signature. Good enough
/// for the callback, which never checks signatures.
pub fn unsigned_id_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","kid":"test","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Query parameters of a Google consent redirect for `code`.
pub fn callback_query(code: &str) -> HashMap<String, String> {
    [
        ("code", code),
        ("scope", "email openid https://www.googleapis.com/auth/calendar"),
        ("authuser", "0"),
        ("prompt", "consent"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn settings_for(token_uri: &str, tokens_dir: &std::path::Path) -> crate::AuthSettings {
    crate::AuthSettings {
        client_id: "test-client.apps.googleusercontent.com".to_string(),
        client_secret: "GOCSPX-test-secret".to_string(),
        token_uri: token_uri.to_string(),
        tokens_dir: tokens_dir.to_path_buf(),
        ..crate::AuthSettings::default()
    }
}
