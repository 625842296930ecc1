//! Repository content API: language configuration and document listing.

use crate::error::{MigrateError, Result};
use crate::languages::Language;
use crate::network::client::HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const SEARCH_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct RepositoryMeta {
    #[serde(default)]
    refs: Vec<RepositoryRef>,
    #[serde(default)]
    languages: Vec<Language>,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    next_page: Option<String>,
}

/// Client for one repository's content API.
pub struct RepositoryApi {
    http: Arc<HttpClient>,
    api_url: String,
}

impl RepositoryApi {
    /// `api_url` is the repository's `/api/v2` endpoint.
    pub fn new(http: Arc<HttpClient>, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    /// Configured languages, tolerantly.
    ///
    /// Tries the public endpoint first, retries with the token if that is
    /// refused, and degrades to an empty list on any failure so language
    /// reconciliation stays advisory.
    pub async fn fetch_languages(&self, token: Option<&str>) -> Vec<Language> {
        match self.fetch_meta(None).await {
            Ok(meta) => return meta.languages,
            Err(e) => debug!(api = %self.api_url, error = %e, "public language fetch failed"),
        }
        if token.is_some() {
            match self.fetch_meta(token).await {
                Ok(meta) => return meta.languages,
                Err(e) => {
                    warn!(api = %self.api_url, error = %e, "authenticated language fetch failed")
                }
            }
        }
        Vec::new()
    }

    /// Every document in the repository, following search pagination.
    pub async fn all_documents(&self, token: Option<&str>) -> Result<Vec<Value>> {
        let master_ref = self.master_ref(token).await?;
        let mut documents = Vec::new();
        let mut next = Some(format!(
            "{}/documents/search?ref={}&pageSize={}",
            self.api_url, master_ref, SEARCH_PAGE_SIZE
        ));

        while let Some(url) = next.take() {
            let response = self.http.get(&url).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(MigrateError::Network {
                    message: format!("document search returned {status}"),
                    source: None,
                });
            }
            let page: SearchPage = response.json().await.map_err(MigrateError::from)?;
            documents.extend(page.results);
            next = page.next_page;
        }

        debug!(api = %self.api_url, count = documents.len(), "fetched documents");
        Ok(documents)
    }

    async fn master_ref(&self, token: Option<&str>) -> Result<String> {
        let meta = self.fetch_meta(token).await?;
        meta.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or_else(|| MigrateError::Network {
                message: format!("no master ref in {}", self.api_url),
                source: None,
            })
    }

    async fn fetch_meta(&self, token: Option<&str>) -> Result<RepositoryMeta> {
        let response = match token {
            Some(token) => {
                let repo = extract_repo(&self.api_url);
                self.http.get_repo(&self.api_url, &repo, Some(token)).await?
            }
            None => self.http.get(&self.api_url).await?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::Network {
                message: format!("repository meta fetch returned {status}"),
                source: None,
            });
        }
        Ok(response.json().await.map_err(MigrateError::from)?)
    }
}

/// Repository name is the first host label of its API URL.
fn extract_repo(api_url: &str) -> String {
    url::Url::parse(api_url)
        .ok()
        .and_then(|u| {
            u.host_str()
                .and_then(|h| h.split('.').next().map(str::to_string))
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_parse_finds_master_ref() {
        let meta: RepositoryMeta = serde_json::from_value(serde_json::json!({
            "refs": [
                { "ref": "preview~x", "isMasterRef": false },
                { "ref": "master~y", "isMasterRef": true },
            ],
            "languages": [
                { "id": "en-us", "name": "English - United States" },
            ]
        }))
        .unwrap();

        let master = meta.refs.iter().find(|r| r.is_master).unwrap();
        assert_eq!(master.reference, "master~y");
        assert_eq!(meta.languages[0].id, "en-us");
    }

    #[test]
    fn test_extract_repo() {
        assert_eq!(
            extract_repo("https://my-repo.cdn.example.io/api/v2"),
            "my-repo"
        );
    }
}
