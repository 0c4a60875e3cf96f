//! Usage: Runtime settings (schema + defaults, `.env`/TOML/env layering, validation).

use crate::shared::error::AppResult;
use crate::shared::security::mask_token;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/";
pub const DEFAULT_TOKENS_DIR: &str = "../tokens";
const DEFAULT_SCOPES: &[&str] = &[
    "openid",
    "email",
    "https://www.googleapis.com/auth/calendar",
];

const ENV_CONFIG_PATH: &str = "CALSYNC_AUTH_CONFIG";
const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
const ENV_TOKEN_URI: &str = "GOOGLE_TOKEN_URI";
const ENV_AUTH_URI: &str = "GOOGLE_AUTH_URI";
const ENV_REDIRECT_URI: &str = "CALSYNC_REDIRECT_URI";
const ENV_TOKENS_DIR: &str = "CALSYNC_TOKENS_DIR";
const ENV_LISTEN_ADDRESS: &str = "CALSYNC_LISTEN_ADDRESS";
const ENV_SCOPES: &str = "CALSYNC_SCOPES";

/// Everything the callback server needs, injected at construction time.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
    pub auth_uri: String,
    // Must match the value registered with the provider byte for byte.
    pub redirect_uri: String,
    pub tokens_dir: PathBuf,
    // Empty means "host:port of redirect_uri".
    pub listen_address: String,
    pub scopes: Vec<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            tokens_dir: PathBuf::from(DEFAULT_TOKENS_DIR),
            listen_address: String::new(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &mask_token(&self.client_secret))
            .field("token_uri", &self.token_uri)
            .field("auth_uri", &self.auth_uri)
            .field("redirect_uri", &self.redirect_uri)
            .field("tokens_dir", &self.tokens_dir)
            .field("listen_address", &self.listen_address)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AuthSettings {
    /// Loads `.env` (searched upward from the working directory), then the
    /// optional TOML file, then process environment overrides.
    pub fn load() -> AppResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!("failed to read .env: {err}"),
        }
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with(mut get: impl FnMut(&str) -> Option<String>) -> AppResult<Self> {
        let mut settings = match non_empty(get(ENV_CONFIG_PATH)) {
            Some(path) => Self::from_toml_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_env(&mut get);
        settings.trim_values();
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> AppResult<Self> {
        let mut settings: Self = toml::from_str(raw)
            .map_err(|e| format!("CONFIG_INVALID: invalid settings toml: {e}"))?;
        settings.trim_values();
        Ok(settings)
    }

    /// Values are sent to the provider verbatim and `redirect_uri` must match
    /// byte for byte, so surrounding whitespace never survives loading.
    fn trim_values(&mut self) {
        for value in [
            &mut self.client_id,
            &mut self.client_secret,
            &mut self.token_uri,
            &mut self.auth_uri,
            &mut self.redirect_uri,
            &mut self.listen_address,
        ] {
            *value = value.trim().to_string();
        }
        self.scopes.retain(|scope| !scope.trim().is_empty());
        for scope in &mut self.scopes {
            *scope = scope.trim().to_string();
        }
    }

    fn from_toml_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            format!(
                "CONFIG_INVALID: failed to read settings file {}: {e}",
                path.display()
            )
        })?;
        Self::from_toml_str(&raw)
    }

    fn apply_env(&mut self, get: &mut impl FnMut(&str) -> Option<String>) {
        if let Some(v) = non_empty(get(ENV_CLIENT_ID)) {
            self.client_id = v;
        }
        if let Some(v) = non_empty(get(ENV_CLIENT_SECRET)) {
            self.client_secret = v;
        }
        if let Some(v) = non_empty(get(ENV_TOKEN_URI)) {
            self.token_uri = v;
        }
        if let Some(v) = non_empty(get(ENV_AUTH_URI)) {
            self.auth_uri = v;
        }
        if let Some(v) = non_empty(get(ENV_REDIRECT_URI)) {
            self.redirect_uri = v;
        }
        if let Some(v) = non_empty(get(ENV_TOKENS_DIR)) {
            self.tokens_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty(get(ENV_LISTEN_ADDRESS)) {
            self.listen_address = v;
        }
        if let Some(v) = non_empty(get(ENV_SCOPES)) {
            self.scopes = v.split_whitespace().map(str::to_string).collect();
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(format!("CONFIG_INVALID: {ENV_CLIENT_ID} is required").into());
        }
        if self.client_secret.trim().is_empty() {
            return Err(format!("CONFIG_INVALID: {ENV_CLIENT_SECRET} is required").into());
        }
        parse_http_url("token_uri", &self.token_uri)?;
        parse_http_url("auth_uri", &self.auth_uri)?;
        parse_http_url("redirect_uri", &self.redirect_uri)?;
        if self.tokens_dir.as_os_str().is_empty() {
            return Err("CONFIG_INVALID: tokens_dir must not be empty"
                .to_string()
                .into());
        }
        Ok(())
    }

    pub fn redirect_url(&self) -> AppResult<Url> {
        parse_http_url("redirect_uri", &self.redirect_uri)
    }

    /// Route path the provider redirects back to (`/` for the default URI).
    pub fn callback_path(&self) -> AppResult<String> {
        Ok(self.redirect_url()?.path().to_string())
    }
}

fn parse_http_url(field: &str, raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| format!("CONFIG_INVALID: {field} is not a valid url: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(format!("CONFIG_INVALID: {field} must be an absolute http(s) url").into());
    }
    Ok(url)
}
