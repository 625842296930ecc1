//! Credential handling.
//!
//! Two credentials exist: a session token obtained by logging into the
//! auth endpoint (used for source-side reads) and the write API key from
//! configuration (used for destination asset operations).

use crate::config::MigrationConfig;
use crate::error::{MigrateError, Result};
use crate::network::client::HttpClient;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Lazily fetched, cached tokens for one migration run.
pub struct TokenProvider {
    http: Arc<HttpClient>,
    auth_base: String,
    email: String,
    password: String,
    write_api_key: String,
    read_token: RwLock<Option<String>>,
}

impl TokenProvider {
    pub fn new(http: Arc<HttpClient>, config: &MigrationConfig) -> Self {
        Self {
            http,
            auth_base: config.auth_base.clone(),
            email: config.source_email.clone(),
            password: config.source_password.clone(),
            write_api_key: config.write_api_key.clone(),
            read_token: RwLock::new(None),
        }
    }

    /// Session token for source repository reads.
    ///
    /// Logs in on first use; the auth endpoint returns the token as plain
    /// response text.
    pub async fn read_token(&self) -> Result<String> {
        if let Some(token) = self.read_token.read().await.clone() {
            return Ok(token);
        }

        let url = format!("{}/login", self.auth_base);
        let response = self
            .http
            .inner()
            .post(&url)
            .json(&json!({ "email": self.email, "password": self.password }))
            .send()
            .await
            .map_err(MigrateError::from)?;

        if !response.status().is_success() {
            return Err(MigrateError::AuthFailed {
                repository: "source".to_string(),
                message: format!("login returned {}", response.status()),
            });
        }

        let token = response.text().await.map_err(MigrateError::from)?;
        if token.trim().is_empty() {
            return Err(MigrateError::AuthFailed {
                repository: "source".to_string(),
                message: "login returned an empty token".to_string(),
            });
        }

        debug!("obtained source read token");
        *self.read_token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Best-effort read token for paths that can proceed unauthenticated.
    pub async fn read_token_opt(&self) -> Option<String> {
        self.read_token().await.ok()
    }

    /// Write API key for destination asset operations.
    pub fn write_token(&self) -> &str {
        &self.write_api_key
    }
}
