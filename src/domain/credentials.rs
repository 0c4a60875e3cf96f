//! Usage: Credential records persisted as `<tokens_dir>/<email>.json`.
//!
//! One flat file per account, written with a plain overwrite. Concurrent
//! callbacks for the same email race and the last write wins.

use crate::blocking;
use crate::gateway::oauth::id_token::IdentityClaims;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";

/// `{"token": <token endpoint response>, "jwtData": <id_token claims>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub token: Value,
    #[serde(rename = "jwtData")]
    pub jwt_data: IdentityClaims,
}

impl CredentialRecord {
    pub fn new(token: Value, jwt_data: IdentityClaims) -> Self {
        Self { token, jwt_data }
    }

    pub fn email(&self) -> Option<&str> {
        self.jwt_data.email()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.get("access_token").and_then(Value::as_str)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.token.get("refresh_token").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The email claim is unverified input, so it must stay a single plain
    /// file name inside `dir`. It is otherwise used exactly as claimed.
    pub fn path_for(&self, email: &str) -> AppResult<PathBuf> {
        if email.trim().is_empty() {
            return Err("CREDENTIAL_STORE: email is empty".to_string().into());
        }
        let escapes =
            email.starts_with('.') || email.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if escapes {
            return Err(
                format!("CREDENTIAL_STORE: email {email:?} is not a safe file name").into(),
            );
        }
        Ok(self.dir.join(format!("{email}.{RECORD_EXTENSION}")))
    }

    pub fn save_blocking(&self, record: &CredentialRecord) -> AppResult<PathBuf> {
        let email = record
            .email()
            .ok_or_else(|| "CREDENTIAL_STORE: id_token claims carry no email".to_string())?;
        let path = self.path_for(email)?;

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            format!(
                "CREDENTIAL_STORE: failed to create {}: {e}",
                self.dir.display()
            )
        })?;
        let bytes = serde_json::to_vec(record)
            .map_err(|e| format!("CREDENTIAL_STORE: failed to serialize record: {e}"))?;
        std::fs::write(&path, bytes)
            .map_err(|e| format!("CREDENTIAL_STORE: failed to write {}: {e}", path.display()))?;

        Ok(path)
    }

    pub async fn save(&self, record: CredentialRecord) -> AppResult<PathBuf> {
        let store = self.clone();
        blocking::run("credential_store_save", move || store.save_blocking(&record)).await
    }

    pub fn load(&self, email: &str) -> AppResult<CredentialRecord> {
        let path = self.path_for(email)?;
        let raw = std::fs::read(&path)
            .map_err(|e| format!("CREDENTIAL_STORE: failed to read {}: {e}", path.display()))?;
        Ok(serde_json::from_slice(&raw).map_err(|e| {
            format!(
                "CREDENTIAL_STORE: {} is not a credential record: {e}",
                path.display()
            )
        })?)
    }
}
