//! Usage: Callback HTTP server lifecycle (bind, serve, graceful stop).

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::listen;
use super::oauth::callback::CallbackHandler;
use super::routes::{build_router, HEALTH_PATH, LOGIN_PATH};
use crate::infra::settings::AuthSettings;
use crate::shared::error::AppResult;

#[derive(Clone)]
pub(crate) struct CallbackAppState {
    pub(crate) handler: CallbackHandler,
}

pub struct CallbackServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CallbackServer {
    /// Binds the address resolved from settings (the redirect URI's host and
    /// port unless `listen_address` says otherwise).
    pub async fn start(settings: AuthSettings) -> AppResult<Self> {
        let target = listen::resolve_listen_target(&settings)?;
        let bind_addr = target.to_host_port();
        let listener = TcpListener::bind(bind_addr.as_str())
            .await
            .map_err(|e| format!("SERVER_BIND: failed to bind {bind_addr}: {e}"))?;
        Self::start_on(listener, settings)
    }

    pub fn start_on(listener: TcpListener, settings: AuthSettings) -> AppResult<Self> {
        let callback_path = settings.callback_path()?;
        if [HEALTH_PATH, LOGIN_PATH].contains(&callback_path.as_str()) {
            return Err(format!(
                "CONFIG_INVALID: redirect_uri path {callback_path} collides with a built-in route"
            )
            .into());
        }

        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("SERVER_BIND: local_addr failed: {e}"))?;
        let handler = CallbackHandler::with_default_client(settings)?;
        let app = build_router(CallbackAppState { handler }, &callback_path);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });

            if let Err(err) = serve.await {
                tracing::error!(local_addr = %local_addr, "callback server error: {}", err);
            }
        });

        tracing::info!(
            local_addr = %local_addr,
            callback_path = %callback_path,
            "callback server listening"
        );

        Ok(Self {
            local_addr,
            shutdown: shutdown_tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for in-flight callbacks.
    pub async fn stop(self) -> AppResult<()> {
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(|e| format!("SERVER_RUNTIME: callback server task failed: {e}"))?;
        tracing::info!(local_addr = %self.local_addr, "callback server stopped");
        Ok(())
    }
}
