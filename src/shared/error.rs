//! Usage: Unified error model (`CODE: message`) and its mapping to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub type AppResult<T> = Result<T, AppError>;

const FALLBACK_CODE: &str = "INTERNAL_ERROR";

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    code: String,
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Splits `"SOME_CODE: detail"` into its parts. The code must look like an
/// upper snake case identifier, otherwise the whole string is a plain message.
fn split_code_message(raw: &str) -> Option<(&str, &str)> {
    let (maybe_code, rest) = raw.trim().split_once(':')?;
    let code = maybe_code.trim();
    let mut chars = code.chars();
    if !chars.next()?.is_ascii_uppercase() {
        return None;
    }
    if !chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_') {
        return None;
    }
    Some((code, rest.trim()))
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        match split_code_message(&value) {
            Some((code, rest)) if !rest.is_empty() => AppError::new(code, rest),
            _ => AppError::new(FALLBACK_CODE, value.trim()),
        }
    }
}

impl From<&'static str> for AppError {
    fn from(value: &'static str) -> Self {
        AppError::from(value.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error_code = %self.code, "request failed: {}", self.message);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
