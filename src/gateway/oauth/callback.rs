//! Usage: OAuth redirect handler (code exchange -> id_token claims -> credential file).

use crate::domain::credentials::{CredentialRecord, CredentialStore};
use crate::gateway::oauth::id_token::decode_unverified;
use crate::gateway::oauth::token_exchange::{
    exchange_authorization_code, id_token_of, parse_oauth_error_details, refresh_token_of,
    TokenExchangeReply, TokenExchangeRequest,
};
use crate::infra::settings::AuthSettings;
use crate::shared::error::AppResult;
use crate::shared::security::redacted_json_snippet;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Google appends all of these when redirecting back after consent. Only their
/// presence is checked; `state` is not part of this flow.
const REQUIRED_CALLBACK_PARAMS: [&str; 4] = ["code", "scope", "authuser", "prompt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallbackParams {
    pub(crate) code: String,
}

impl CallbackParams {
    pub(crate) fn from_query(query: &HashMap<String, String>) -> Option<Self> {
        if !REQUIRED_CALLBACK_PARAMS
            .iter()
            .all(|key| query.contains_key(*key))
        {
            return None;
        }
        Some(Self {
            code: query.get("code")?.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Not an OAuth redirect; nothing was sent or written.
    Skipped,
    Stored { email: String, path: PathBuf },
    /// HTTP 200 without a usable `refresh_token`; nothing was written.
    MissingRefreshToken,
    /// Token endpoint answered with a status other than 200.
    Rejected { status: u16 },
}

#[derive(Debug, Clone)]
pub struct CallbackHandler {
    settings: Arc<AuthSettings>,
    client: reqwest::Client,
    store: CredentialStore,
}

impl CallbackHandler {
    pub fn new(settings: AuthSettings, client: reqwest::Client) -> Self {
        let store = CredentialStore::new(settings.tokens_dir.clone());
        Self {
            settings: Arc::new(settings),
            client,
            store,
        }
    }

    /// The client has no request timeout; the handler waits on the token
    /// endpoint for as long as it takes.
    pub fn with_default_client(settings: AuthSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("calsync-auth/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("OAUTH_EXCHANGE_REQUEST: http client init failed: {e}"))?;
        Ok(Self::new(settings, client))
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub async fn handle(&self, query: &HashMap<String, String>) -> AppResult<CallbackOutcome> {
        let Some(params) = CallbackParams::from_query(query) else {
            tracing::debug!("request carries no oauth callback params; skipping");
            return Ok(CallbackOutcome::Skipped);
        };

        let request = TokenExchangeRequest::new(&self.settings, &params.code);
        let reply =
            exchange_authorization_code(&self.client, &self.settings.token_uri, &request).await?;

        let token = match reply {
            TokenExchangeReply::Granted(token) => token,
            TokenExchangeReply::Rejected { status, body } => {
                let (error_code, error_message) = parse_oauth_error_details(&body);
                tracing::warn!(
                    status = status.as_u16(),
                    error_code = ?error_code,
                    error_message = ?error_message,
                    body = %redacted_json_snippet(&body),
                    "oauth token exchange failed"
                );
                return Ok(CallbackOutcome::Rejected {
                    status: status.as_u16(),
                });
            }
        };

        if refresh_token_of(&token).is_none() {
            tracing::warn!(
                body = %redacted_json_snippet(&token),
                "no refresh token in oauth token response"
            );
            return Ok(CallbackOutcome::MissingRefreshToken);
        }

        let id_token = id_token_of(&token)
            .ok_or_else(|| "ID_TOKEN_INVALID: token response has no id_token".to_string())?;
        let claims = decode_unverified(&id_token)?;
        let email = claims
            .email()
            .map(str::to_string)
            .ok_or_else(|| "ID_TOKEN_INVALID: id_token claims carry no email".to_string())?;

        let path = self.store.save(CredentialRecord::new(token, claims)).await?;
        tracing::info!(email = %email, path = %path.display(), "stored oauth credentials");

        Ok(CallbackOutcome::Stored { email, path })
    }
}
