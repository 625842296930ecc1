//! Custom type and slice copying between repositories.
//!
//! Document models must exist in the destination before documents that
//! use them are submitted, so these run ahead of the document stage.

use crate::error::{MigrateError, Result};
use crate::network::client::HttpClient;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// The two kinds of shared models the custom types API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    CustomTypes,
    Slices,
}

impl ModelKind {
    pub fn path(self) -> &'static str {
        match self {
            ModelKind::CustomTypes => "customtypes",
            ModelKind::Slices => "slices",
        }
    }
}

/// Result of copying one kind of model set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOutcome {
    pub total: usize,
    pub failures: usize,
}

/// Client for the custom types API host.
pub struct CustomTypesApi {
    http: Arc<HttpClient>,
    base: String,
}

impl CustomTypesApi {
    pub fn new(http: Arc<HttpClient>, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }

    /// List every model of a kind in a repository.
    pub async fn fetch_all(
        &self,
        repository: &str,
        token: &str,
        kind: ModelKind,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/{}", self.base, kind.path());
        let response = self.http.get_repo(&url, repository, Some(token)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::Network {
                message: format!(
                    "{} fetch for {repository} returned {status}",
                    kind.path()
                ),
                source: None,
            });
        }
        Ok(response.json().await.map_err(MigrateError::from)?)
    }

    /// Insert one model into a repository. An "already exists" conflict
    /// is treated as success so reruns stay idempotent.
    pub async fn insert(
        &self,
        repository: &str,
        token: &str,
        kind: ModelKind,
        model: &Value,
    ) -> Result<()> {
        let url = format!("{}/{}/insert", self.base, kind.path());
        let response = self
            .http
            .post_json_repo(&url, repository, Some(token), model)
            .await?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MigrateError::Network {
            message: format!("{} insert returned {status}: {body}", kind.path()),
            source: None,
        })
    }

    /// Copy every model of a kind from source to destination.
    ///
    /// Individual insert failures are counted, not fatal: one broken
    /// model should not block the rest of the set.
    pub async fn copy_all(
        &self,
        source_repo: &str,
        source_token: &str,
        dest_repo: &str,
        dest_token: &str,
        kind: ModelKind,
    ) -> Result<CopyOutcome> {
        let models = self.fetch_all(source_repo, source_token, kind).await?;
        let mut outcome = CopyOutcome {
            total: models.len(),
            failures: 0,
        };

        for model in &models {
            let id = model
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");
            if let Err(e) = self.insert(dest_repo, dest_token, kind, model).await {
                warn!(kind = kind.path(), id, error = %e, "model copy failed");
                outcome.failures += 1;
            }
        }

        info!(
            kind = kind.path(),
            total = outcome.total,
            failures = outcome.failures,
            "copied models to {dest_repo}"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_paths() {
        assert_eq!(ModelKind::CustomTypes.path(), "customtypes");
        assert_eq!(ModelKind::Slices.path(), "slices");
    }
}
