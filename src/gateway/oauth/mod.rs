//! Usage: Google OAuth authorization code flow (consent URL, code exchange, id_token claims).

pub(crate) mod authorize;
pub(crate) mod callback;
pub(crate) mod id_token;
pub(crate) mod token_exchange;
