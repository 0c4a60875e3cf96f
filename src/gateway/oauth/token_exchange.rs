//! Usage: OAuth token endpoint call for the `authorization_code` grant.

use crate::infra::settings::AuthSettings;
use crate::shared::error::{AppError, AppResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// JSON body posted to the token endpoint; exactly these five fields.
#[derive(Serialize)]
pub(crate) struct TokenExchangeRequest<'a> {
    pub(crate) code: &'a str,
    pub(crate) client_secret: &'a str,
    pub(crate) client_id: &'a str,
    pub(crate) grant_type: &'static str,
    pub(crate) redirect_uri: &'a str,
}

impl<'a> TokenExchangeRequest<'a> {
    pub(crate) fn new(settings: &'a AuthSettings, code: &'a str) -> Self {
        Self {
            code,
            client_secret: &settings.client_secret,
            client_id: &settings.client_id,
            grant_type: GRANT_TYPE_AUTHORIZATION_CODE,
            redirect_uri: &settings.redirect_uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenExchangeReply {
    /// HTTP 200; the body is kept verbatim for persistence.
    Granted(Value),
    Rejected { status: StatusCode, body: Value },
}

/// Sends the exchange and parses the JSON reply. Only a transport failure or
/// a non-JSON body is an error; a non-200 status is a [`TokenExchangeReply::Rejected`].
pub(crate) async fn exchange_authorization_code(
    client: &reqwest::Client,
    token_uri: &str,
    req: &TokenExchangeRequest<'_>,
) -> AppResult<TokenExchangeReply> {
    let body = serde_json::to_vec(req)
        .map_err(|e| format!("OAUTH_EXCHANGE_REQUEST: failed to encode request body: {e}"))?;

    let response = client
        .post(token_uri.trim())
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| {
            AppError::new(
                "OAUTH_EXCHANGE_REQUEST",
                format!("token exchange request failed: {e}"),
            )
            .with_source(e)
        })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| format!("OAUTH_EXCHANGE_REQUEST: token response read failed: {e}"))?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        format!(
            "OAUTH_RESPONSE_INVALID: token endpoint returned status={} with invalid json: {e}",
            status.as_u16()
        )
    })?;

    if status == StatusCode::OK {
        Ok(TokenExchangeReply::Granted(value))
    } else {
        Ok(TokenExchangeReply::Rejected {
            status,
            body: value,
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `refresh_token` only counts when it is a non-empty string. Whitespace is
/// kept as is; the provider's value is never rewritten.
pub(crate) fn refresh_token_of(token: &Value) -> Option<String> {
    token
        .get("refresh_token")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn id_token_of(token: &Value) -> Option<String> {
    non_empty_str(token.get("id_token"))
}

/// Pulls `(error code, description)` out of the standard OAuth error shape
/// (`error` + `error_description`) or the nested `{"error": {...}}` variant.
pub(crate) fn parse_oauth_error_details(body: &Value) -> (Option<String>, Option<String>) {
    let mut code = non_empty_str(body.get("code"));
    let mut message = non_empty_str(body.get("error_description"));

    match body.get("error") {
        Some(Value::String(err)) if code.is_none() => code = Some(err.trim().to_string()),
        Some(Value::Object(err_obj)) => {
            if code.is_none() {
                code = non_empty_str(err_obj.get("status"))
                    .or_else(|| non_empty_str(err_obj.get("code")));
            }
            if message.is_none() {
                message = non_empty_str(err_obj.get("message"));
            }
        }
        _ => {}
    }

    (code, message)
}
