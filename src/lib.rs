mod app;
mod domain;
mod gateway;
mod infra;
mod shared;
pub mod test_support;

pub(crate) use shared::blocking;

pub use domain::credentials::{CredentialRecord, CredentialStore};
pub use gateway::oauth::callback::{CallbackHandler, CallbackOutcome};
pub use gateway::oauth::id_token::{decode_unverified, IdentityClaims};
pub use gateway::server::CallbackServer;
pub use infra::settings::AuthSettings;
pub use shared::error::{AppError, AppResult};

/// Binary entry point: logging, settings, then serve until Ctrl-C.
pub fn run() -> AppResult<()> {
    let _logging = app::logging::init()?;
    app::logging::install_panic_hook();

    let settings = AuthSettings::load()?;
    tracing::info!(settings = ?settings, "settings loaded");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("SERVER_RUNTIME: tokio runtime init failed: {e}"))?;
    runtime.block_on(serve_until_ctrl_c(settings))
}

async fn serve_until_ctrl_c(settings: AuthSettings) -> AppResult<()> {
    let server = CallbackServer::start(settings).await?;
    tracing::info!(
        "open http://{}/login in a browser to authorize an account",
        server.local_addr()
    );

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("ctrl-c listener failed, shutting down: {}", err);
    }
    server.stop().await
}
