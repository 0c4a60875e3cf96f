use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use super::oauth::authorize::build_authorize_url;
use super::server::CallbackAppState;
use crate::shared::error::AppError;

pub(super) const HEALTH_PATH: &str = "/health";
pub(super) const LOGIN_PATH: &str = "/login";

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app: &'static str,
    version: &'static str,
    ts: u64,
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        app: "calsync-auth",
        version: env!("CARGO_PKG_VERSION"),
        ts: now_unix_seconds(),
    })
}

async fn login(State(state): State<CallbackAppState>) -> Result<Redirect, AppError> {
    let url = build_authorize_url(state.handler.settings())?;
    Ok(Redirect::temporary(url.as_str()))
}

async fn oauth_callback(
    State(state): State<CallbackAppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, AppError> {
    state.handler.handle(&query).await?;
    Ok(StatusCode::OK)
}

pub(super) fn build_router(state: CallbackAppState, callback_path: &str) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(LOGIN_PATH, get(login))
        .route(callback_path, get(oauth_callback))
        .with_state(state)
}
