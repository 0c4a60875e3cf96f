//! Usage: Build the provider consent URL that starts the authorization code flow.

use crate::infra::settings::AuthSettings;
use crate::shared::error::AppResult;
use reqwest::Url;

// Google only returns a refresh_token on a forced consent with offline access.
const EXTRA_AUTHORIZE_PARAMS: &[(&str, &str)] =
    &[("access_type", "offline"), ("prompt", "consent")];

pub(crate) fn build_authorize_url(settings: &AuthSettings) -> AppResult<Url> {
    let mut url = Url::parse(settings.auth_uri.trim())
        .map_err(|e| format!("CONFIG_INVALID: auth_uri is not a valid url: {e}"))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", &settings.client_id)
            .append_pair("redirect_uri", &settings.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &settings.scopes.join(" "));
        for (key, value) in EXTRA_AUTHORIZE_PARAMS {
            query.append_pair(key, value);
        }
    }

    Ok(url)
}
