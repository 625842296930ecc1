//! HTTP client wrapper.
//!
//! Thin layer over reqwest adding the headers every CMS call needs
//! (`repository` plus a bearer credential), timeout configuration, and
//! rate-limit detection from 429 responses.

use crate::config::NetworkConfig;
use crate::error::{MigrateError, Result};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// HTTP client for CMS endpoints.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("migrate-rpc/0.3")
            .build()
            .map_err(|e| MigrateError::Network {
                message: format!("Failed to create HTTP client: {e}"),
                source: Some(e),
            })?;
        Ok(Self { client })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET against a repository-scoped endpoint.
    pub async fn get_repo(
        &self,
        url: &str,
        repository: &str,
        token: Option<&str>,
    ) -> Result<Response> {
        let request = self.with_repo_headers(self.client.get(url), repository, token);
        self.send(request, url).await
    }

    /// POST a JSON body against a repository-scoped endpoint.
    pub async fn post_json_repo<T: serde::Serialize>(
        &self,
        url: &str,
        repository: &str,
        token: Option<&str>,
        body: &T,
    ) -> Result<Response> {
        let request = self
            .with_repo_headers(self.client.post(url), repository, token)
            .json(body);
        self.send(request, url).await
    }

    /// POST a multipart body against a repository-scoped endpoint.
    pub async fn post_multipart_repo(
        &self,
        url: &str,
        repository: &str,
        token: Option<&str>,
        form: reqwest::multipart::Form,
    ) -> Result<Response> {
        let request = self
            .with_repo_headers(self.client.post(url), repository, token)
            .timeout(NetworkConfig::TRANSFER_TIMEOUT)
            .multipart(form);
        self.send(request, url).await
    }

    /// Plain GET, used for CDN asset downloads.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let request = self.client.get(url).timeout(NetworkConfig::TRANSFER_TIMEOUT);
        self.send(request, url).await
    }

    /// Check if an HTTP status code indicates a retryable error.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
    }

    // Internal methods

    fn with_repo_headers(
        &self,
        request: RequestBuilder,
        repository: &str,
        token: Option<&str>,
    ) -> RequestBuilder {
        let request = request.header("repository", repository);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MigrateError::Timeout(NetworkConfig::REQUEST_TIMEOUT)
            } else {
                MigrateError::Network {
                    message: format!("Request to {url} failed: {e}"),
                    source: Some(e),
                }
            }
        })?;

        // Rate limiting surfaces as an error; other statuses are returned
        // for the caller to interpret.
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(MigrateError::RateLimited {
                service: extract_domain(url),
                retry_after_secs: retry_after,
            });
        }

        Ok(response)
    }
}

/// Extract the host from a URL for error context.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
