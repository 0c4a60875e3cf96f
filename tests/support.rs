use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use calsync_auth_lib::test_support::{settings_for, unsigned_id_token};
use calsync_auth_lib::{AuthSettings, CallbackHandler};
use serde_json::{json, Value};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::MockServer;

pub const TOKEN_PATH: &str = "/token";

/// Mock Google token endpoint plus an isolated tokens directory.
pub struct TestEnv {
    pub server: MockServer,
    tokens: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            tokens: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn token_uri(&self) -> String {
        format!("{}{TOKEN_PATH}", self.server.uri())
    }

    pub fn tokens_dir(&self) -> &Path {
        self.tokens.path()
    }

    pub fn settings(&self) -> AuthSettings {
        settings_for(&self.token_uri(), self.tokens_dir())
    }

    pub fn handler(&self) -> CallbackHandler {
        CallbackHandler::with_default_client(self.settings()).expect("callback handler")
    }

    #[allow(dead_code)]
    pub fn token_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.tokens_dir())
            .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
            .unwrap_or_default();
        files.sort();
        files
    }
}

/// A successful Google token response for `email`.
#[allow(dead_code)]
pub fn granted_body(email: &str, refresh_token: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": "ya29.a0AfB_test_access_token",
        "expires_in": 3599,
        "scope": "openid https://www.googleapis.com/auth/userinfo.email https://www.googleapis.com/auth/calendar",
        "token_type": "Bearer",
        "id_token": unsigned_id_token(&identity_claims(email)),
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body
}

#[allow(dead_code)]
pub fn identity_claims(email: &str) -> Value {
    json!({
        "iss": "https://accounts.google.com",
        "aud": "test-client.apps.googleusercontent.com",
        "sub": "110169484474386276334",
        "email": email,
        "email_verified": true,
        "iat": 1_700_000_000,
        "exp": 1_700_003_600
    })
}

/// Collects formatted log lines for the current thread's subscriber.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl LogCapture {
    /// Captures until the returned guard drops. `#[tokio::test]` runs on the
    /// current thread, so the handler's events land here.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        let buf = self.0.lock().expect("log buffer");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
