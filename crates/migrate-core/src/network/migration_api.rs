//! Document sink backed by the migration API.

use crate::error::{MigrateError, Result};
use crate::migration::{DocumentSink, SubmitOutcome};
use crate::network::client::HttpClient;
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Submits documents to one destination repository's migration endpoint.
///
/// Each submission carries the repository header, the migration API key,
/// and the write key as bearer credential.
pub struct MigrationEndpoint {
    http: Arc<HttpClient>,
    base: String,
    repository: String,
    api_key: String,
    write_key: String,
}

impl MigrationEndpoint {
    pub fn new(
        http: Arc<HttpClient>,
        base: impl Into<String>,
        repository: impl Into<String>,
        api_key: impl Into<String>,
        write_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base: base.into(),
            repository: repository.into(),
            api_key: api_key.into(),
            write_key: write_key.into(),
        }
    }
}

#[async_trait]
impl DocumentSink for MigrationEndpoint {
    async fn submit(&self, document: &Value) -> Result<SubmitOutcome> {
        let url = format!("{}/documents", self.base);
        let response = self
            .http
            .inner()
            .post(&url)
            .header("repository", &self.repository)
            .header("x-api-key", &self.api_key)
            .bearer_auth(&self.write_key)
            .json(document)
            .send()
            .await
            .map_err(MigrateError::from)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Ok(SubmitOutcome::RateLimited { retry_after_secs });
        }

        if status.is_success() {
            let id = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("id").and_then(Value::as_str).map(str::to_string));
            debug!(id = id.as_deref().unwrap_or("?"), "migration endpoint accepted document");
            return Ok(SubmitOutcome::Accepted { id });
        }

        let body = response.text().await.unwrap_or_default();
        Ok(SubmitOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
