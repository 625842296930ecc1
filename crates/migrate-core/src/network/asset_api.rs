//! Asset API access: inventory fetch, upload, download.

use crate::assets::inventory::{Asset, InventoryPage};
use crate::config::NetworkConfig;
use crate::error::{MigrateError, Result};
use crate::network::client::HttpClient;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client for one asset API host.
pub struct AssetApi {
    http: Arc<HttpClient>,
    base: String,
}

impl AssetApi {
    pub fn new(http: Arc<HttpClient>, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }

    /// Fetch the asset inventory for a repository.
    ///
    /// One flat request capped at [`NetworkConfig::INVENTORY_LIMIT`]
    /// items; further pages are not followed. Entries missing an id or
    /// filename are filtered out.
    pub async fn fetch_inventory(
        &self,
        repository: &str,
        token: Option<&str>,
    ) -> Result<Vec<Asset>> {
        let url = format!(
            "{}/assets?limit={}",
            self.base,
            NetworkConfig::INVENTORY_LIMIT
        );
        let response = self.http.get_repo(&url, repository, token).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::Network {
                message: format!("inventory fetch for {repository} returned {status}"),
                source: None,
            });
        }

        let page: InventoryPage = response.json().await.map_err(|e| MigrateError::Json {
            message: format!("unparsable inventory body for {repository}: {e}"),
            source: None,
        })?;
        Ok(page.into_assets())
    }

    /// Tolerant inventory fetch for advisory paths.
    ///
    /// An unknown inventory is treated as an empty one: timeouts, error
    /// statuses, and unparsable bodies all degrade to an empty list so
    /// existence checks bias toward "more work is needed" and mapping
    /// builds stay best-effort.
    pub async fn fetch_inventory_tolerant(
        &self,
        repository: &str,
        token: Option<&str>,
    ) -> Vec<Asset> {
        match self.fetch_inventory(repository, token).await {
            Ok(assets) => assets,
            Err(e) => {
                warn!(repository, error = %e, "inventory fetch degraded to empty");
                Vec::new()
            }
        }
    }

    /// Upload one cached file, returning the destination's new asset.
    pub async fn upload(
        &self,
        repository: &str,
        token: &str,
        path: &Path,
        filename: &str,
    ) -> Result<Asset> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MigrateError::io_with_path(e, path))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/assets", self.base);
        let response = self
            .http
            .post_multipart_repo(&url, repository, Some(token), form)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MigrateError::UploadFailed {
                filename: filename.to_string(),
                message: format!("status {status}: {body}"),
            });
        }

        let uploaded: Asset = response.json().await.map_err(|e| MigrateError::UploadFailed {
            filename: filename.to_string(),
            message: format!("unparsable upload response: {e}"),
        })?;
        info!(filename, id = %uploaded.id, "uploaded asset");
        Ok(uploaded)
    }

    /// Download one asset URL to its final path.
    ///
    /// Streams to a temp file next to the destination and atomically
    /// renames on completion, so a partial download never looks cached.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        if let Some(parent) = destination.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MigrateError::io_with_path(e, parent))?;
            }
        }

        let temp_path = PathBuf::from(format!(
            "{}{}",
            destination.display(),
            NetworkConfig::DOWNLOAD_TEMP_SUFFIX
        ));

        let result = self.stream_to_file(url, &temp_path).await;
        match result {
            Ok(bytes) => {
                std::fs::rename(&temp_path, destination).map_err(|e| {
                    let _ = std::fs::remove_file(&temp_path);
                    MigrateError::io_with_path(e, destination)
                })?;
                debug!(url, bytes, "downloaded asset to {}", destination.display());
                Ok(bytes)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    async fn stream_to_file(&self, url: &str, temp_path: &Path) -> Result<u64> {
        let response = self.http.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::DownloadFailed {
                url: url.to_string(),
                message: format!("status {status}"),
            });
        }

        let mut file = std::fs::File::create(temp_path)
            .map_err(|e| MigrateError::io_with_path(e, temp_path))?;
        let mut bytes_written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MigrateError::Network {
                message: format!("error reading download stream: {e}"),
                source: Some(e),
            })?;
            file.write_all(&chunk)
                .map_err(|e| MigrateError::io_with_path(e, temp_path))?;
            bytes_written += chunk.len() as u64;
        }

        file.flush()
            .map_err(|e| MigrateError::io_with_path(e, temp_path))?;
        Ok(bytes_written)
    }
}
