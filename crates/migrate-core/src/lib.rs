//! Headless library for migrating content between CMS repositories.
//!
//! The pipeline is a manual wizard: fetch the source asset inventory,
//! download the binaries into a local cache, upload them to the
//! destination, then migrate documents with every embedded asset id
//! rewritten to its destination counterpart. Each stage is idempotent
//! and re-derives its state from the repositories rather than trusting
//! a stored flag.

pub mod assets;
pub mod config;
pub mod documents;
pub mod error;
pub mod languages;
pub mod migration;
pub mod network;
pub mod state;

pub use assets::{Asset, AssetCache, IdMapping, MappingTable};
pub use config::MigrationConfig;
pub use error::{MigrateError, Result};
pub use languages::LanguageReport;
pub use migration::{MigrationRunResult, MigrationSchedule};
pub use state::WizardState;

use network::{
    retry_async, AssetApi, CustomTypesApi, HttpClient, MigrationEndpoint, ModelKind,
    RepositoryApi, RetryConfig, TokenProvider,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one download stage run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failures: usize,
}

/// Result of one upload stage run, including the id mappings minted by
/// the destination's responses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub total: usize,
    pub uploaded: usize,
    pub failures: usize,
    pub mappings: Vec<IdMapping>,
}

/// High-level API over the whole migration pipeline.
///
/// One instance per configured source/destination pair. All operations
/// are independent entry points for the wizard stages.
pub struct MigrationApi {
    config: MigrationConfig,
    http: Arc<HttpClient>,
    tokens: TokenProvider,
    asset_api: AssetApi,
    custom_types: CustomTypesApi,
    cache: AssetCache,
    schedule: MigrationSchedule,
    retry: RetryConfig,
}

impl MigrationApi {
    /// Build from environment configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(MigrationConfig::from_env()?)
    }

    pub fn new(config: MigrationConfig) -> Result<Self> {
        let http = Arc::new(HttpClient::new()?);
        let tokens = TokenProvider::new(Arc::clone(&http), &config);
        let asset_api = AssetApi::new(Arc::clone(&http), config.asset_api_base.clone());
        let custom_types =
            CustomTypesApi::new(Arc::clone(&http), config.custom_types_base.clone());
        let cache = AssetCache::new(config.cache_dir.clone());

        Ok(Self {
            config,
            http,
            tokens,
            asset_api,
            custom_types,
            cache,
            schedule: MigrationSchedule::default(),
            retry: RetryConfig::default(),
        })
    }

    /// Override the pacing schedule. Tests use [`MigrationSchedule::immediate`].
    pub fn with_schedule(mut self, schedule: MigrationSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Source asset inventory. Strict: the fetch wizard stage needs to
    /// know a failure from an empty repository.
    pub async fn fetch_source_inventory(&self) -> Result<Vec<Asset>> {
        let token = self.tokens.read_token().await?;
        self.asset_api
            .fetch_inventory(&self.config.source_repo, Some(&token))
            .await
    }

    /// Source inventory for advisory checks: degrades to an empty list
    /// when the repository cannot be read.
    pub async fn fetch_source_inventory_tolerant(&self) -> Vec<Asset> {
        let token = self.tokens.read_token_opt().await;
        self.asset_api
            .fetch_inventory_tolerant(&self.config.source_repo, token.as_deref())
            .await
    }

    /// Download every uncached asset into the local cache.
    pub async fn download_assets(&self, assets: &[Asset]) -> Result<DownloadReport> {
        let mut report = DownloadReport {
            total: assets.len(),
            ..Default::default()
        };

        for asset in assets {
            let Some(url) = asset.url.as_deref() else {
                warn!(id = %asset.id, filename = %asset.filename, "asset has no url, skipped");
                report.failures += 1;
                continue;
            };
            if self.cache.contains(&asset.id, &asset.filename) {
                report.skipped += 1;
                continue;
            }

            let destination = self.cache.asset_path(&asset.id, &asset.filename);
            let attempt = retry_async(
                &self.retry,
                || self.asset_api.download(url, &destination),
                MigrateError::is_retryable,
            )
            .await;

            match attempt {
                Ok(_) => report.downloaded += 1,
                Err(e) => {
                    warn!(id = %asset.id, filename = %asset.filename, error = %e, "download failed");
                    report.failures += 1;
                }
            }
        }

        info!(
            total = report.total,
            downloaded = report.downloaded,
            skipped = report.skipped,
            failures = report.failures,
            "download stage finished"
        );
        Ok(report)
    }

    /// Upload every cached asset to the destination, pacing between items.
    ///
    /// The returned mappings pair each source id with the id the
    /// destination minted; they are the authoritative input to document
    /// rewriting when this step ran in the same session.
    pub async fn upload_assets(&self, assets: &[Asset]) -> Result<UploadReport> {
        let token = self.tokens.write_token();
        let mut report = UploadReport {
            total: assets.len(),
            ..Default::default()
        };

        for (index, asset) in assets.iter().enumerate() {
            let path = self.cache.asset_path(&asset.id, &asset.filename);
            if !path.exists() {
                warn!(id = %asset.id, filename = %asset.filename, "asset not cached, skipped");
                report.failures += 1;
                continue;
            }

            let attempt = retry_async(
                &self.retry,
                || {
                    self.asset_api
                        .upload(&self.config.dest_repo, token, &path, &asset.filename)
                },
                MigrateError::is_retryable,
            )
            .await;

            match attempt {
                Ok(uploaded) => {
                    report.mappings.push(IdMapping {
                        prev_id: asset.id.clone(),
                        id: uploaded.id,
                    });
                    report.uploaded += 1;
                }
                Err(e) => {
                    warn!(id = %asset.id, filename = %asset.filename, error = %e, "upload failed");
                    report.failures += 1;
                }
            }

            if index + 1 < assets.len() && !self.schedule.upload_delay.is_zero() {
                tokio::time::sleep(self.schedule.upload_delay).await;
            }
        }

        info!(
            total = report.total,
            uploaded = report.uploaded,
            failures = report.failures,
            "upload stage finished"
        );
        Ok(report)
    }

    /// Whether every inventory asset has a cached local copy.
    pub fn all_exist_locally(&self, assets: &[Asset]) -> bool {
        self.cache.all_exist_locally(assets)
    }

    /// Whether every source asset already has a filename counterpart in
    /// the destination. Tolerant: an unreachable destination reads as
    /// "not yet uploaded".
    pub async fn all_exist_at_destination(&self, source: &[Asset]) -> bool {
        let destination = self
            .asset_api
            .fetch_inventory_tolerant(&self.config.dest_repo, Some(self.tokens.write_token()))
            .await;
        assets::all_exist_at_destination(source, &destination)
    }

    /// Reconstruct the id mapping by cross-matching both inventories on
    /// normalized filename. Used when the upload responses from a
    /// previous session are gone.
    pub async fn build_mapping(&self) -> MappingTable {
        let read_token = self.tokens.read_token_opt().await;
        let source = self
            .asset_api
            .fetch_inventory_tolerant(&self.config.source_repo, read_token.as_deref())
            .await;
        let destination = self
            .asset_api
            .fetch_inventory_tolerant(&self.config.dest_repo, Some(self.tokens.write_token()))
            .await;
        assets::build_mapping(&source, &destination)
    }

    /// Compare configured languages against what the source documents use.
    pub async fn language_report(&self) -> Result<LanguageReport> {
        let token = self.tokens.read_token_opt().await;
        let source_api = self.repository_api(&self.config.source_repo);
        let dest_api = self.repository_api(&self.config.dest_repo);

        let source_languages = source_api.fetch_languages(token.as_deref()).await;
        let destination_languages = dest_api.fetch_languages(None).await;
        let documents = match source_api.all_documents(token.as_deref()).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(error = %e, "document fetch failed, reporting configured languages only");
                Vec::new()
            }
        };

        Ok(languages::reconcile(
            source_languages,
            destination_languages,
            &documents,
        ))
    }

    /// Run the document migration stage.
    ///
    /// Copies slices and custom types first so the destination knows the
    /// models, then submits every source document with asset ids
    /// rewritten. When `mappings` is empty the table is rebuilt from the
    /// inventories.
    pub async fn migrate_documents(
        &self,
        mappings: Vec<IdMapping>,
    ) -> Result<MigrationRunResult> {
        let read_token = self.tokens.read_token().await?;
        let write_token = self.tokens.write_token();

        for kind in [ModelKind::Slices, ModelKind::CustomTypes] {
            let copied = self
                .custom_types
                .copy_all(
                    &self.config.source_repo,
                    &read_token,
                    &self.config.dest_repo,
                    write_token,
                    kind,
                )
                .await;
            if let Err(e) = copied {
                warn!(kind = kind.path(), error = %e, "model copy stage failed");
            }
        }

        let source_api = self.repository_api(&self.config.source_repo);
        let documents = source_api.all_documents(Some(&read_token)).await?;

        let destination_languages = self
            .repository_api(&self.config.dest_repo)
            .fetch_languages(None)
            .await;
        let source_languages = source_api.fetch_languages(Some(&read_token)).await;
        let report = languages::reconcile(source_languages, destination_languages, &documents);
        if !report.missing_languages.is_empty() {
            warn!(
                missing = ?report.missing_languages,
                "destination is missing languages used by source documents"
            );
        }

        let effective = if mappings.is_empty() {
            let table = self.build_mapping().await;
            info!(
                matched = table.stats.matched,
                "no upload mappings provided, rebuilt from inventories"
            );
            table.mappings
        } else {
            mappings
        };

        let sink = MigrationEndpoint::new(
            Arc::clone(&self.http),
            self.config.migration_base.clone(),
            self.config.dest_repo.clone(),
            self.config.migration_api_key.clone(),
            write_token.to_string(),
        );
        migration::migrate_documents(&sink, &documents, &effective, &self.schedule).await
    }

    fn repository_api(&self, repository: &str) -> RepositoryApi {
        RepositoryApi::new(Arc::clone(&self.http), self.config.repo_api_url(repository))
    }
}
