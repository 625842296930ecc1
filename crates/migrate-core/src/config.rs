//! Centralized configuration for the migration service.
//!
//! Repository identifiers and credentials come from the environment and
//! fail fast when missing; timing and limit constants live in const
//! structs so every stage shares the same schedule.

use crate::error::{MigrateError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    /// Timeout for inventory and language-configuration fetches.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    /// Timeout for asset downloads and uploads.
    pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);
    /// Flat item limit for one inventory fetch; further pages are not followed.
    pub const INVENTORY_LIMIT: usize = 1000;
    /// Pause between sequential asset uploads.
    pub const UPLOAD_ITEM_DELAY: Duration = Duration::from_millis(1500);
    /// Pause between sequential document submissions.
    pub const DOCUMENT_ITEM_DELAY: Duration = Duration::from_secs(3);
    /// Backoff before the single retry after a rate-limit response.
    pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(10);
    pub const DOWNLOAD_TEMP_SUFFIX: &'static str = ".part";
}

/// Remote endpoint bases. Overridable for tests via the environment.
pub struct EndpointConfig;

impl EndpointConfig {
    pub const ASSET_API_BASE: &'static str = "https://asset-api.prismic.io";
    pub const AUTH_BASE: &'static str = "https://auth.prismic.io";
    pub const CUSTOM_TYPES_BASE: &'static str = "https://customtypes.prismic.io";
    pub const MIGRATION_BASE: &'static str = "https://migration.prismic.io";
    /// Repository API host suffix; the repository name is the subdomain.
    pub const REPO_API_SUFFIX: &'static str = "cdn.prismic.io";
}

/// Environment-derived settings for one migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Source repository identifier.
    pub source_repo: String,
    /// Destination repository identifier.
    pub dest_repo: String,
    /// Login for the source repository's auth endpoint.
    pub source_email: String,
    pub source_password: String,
    /// Write API key for destination asset operations.
    pub write_api_key: String,
    /// API key for the document migration endpoint.
    pub migration_api_key: String,
    /// Local asset cache directory.
    pub cache_dir: PathBuf,
    /// Base URLs, overridable for tests.
    pub asset_api_base: String,
    pub auth_base: String,
    pub custom_types_base: String,
    pub migration_base: String,
    pub repo_api_suffix: String,
}

impl MigrationConfig {
    /// Read configuration from the environment.
    ///
    /// Required values fail fast with a named [`MigrateError::MissingEnv`];
    /// only the cache directory and endpoint bases are defaulted.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            source_repo: require_env("SOURCE_REPO")?,
            dest_repo: require_env("DEST_REPO")?,
            source_email: require_env("SOURCE_EMAIL")?,
            source_password: require_env("SOURCE_PASSWORD")?,
            write_api_key: require_env("WRITE_API_KEY")?,
            migration_api_key: require_env("MIGRATION_API_KEY")?,
            cache_dir: std::env::var("ASSET_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./images")),
            asset_api_base: env_or("ASSET_API_URL", EndpointConfig::ASSET_API_BASE),
            auth_base: env_or("AUTH_API_URL", EndpointConfig::AUTH_BASE),
            custom_types_base: env_or("CUSTOM_TYPES_API_URL", EndpointConfig::CUSTOM_TYPES_BASE),
            migration_base: env_or("MIGRATION_API_URL", EndpointConfig::MIGRATION_BASE),
            repo_api_suffix: env_or("REPO_API_SUFFIX", EndpointConfig::REPO_API_SUFFIX),
        })
    }

    /// Repository API URL for a repository (language configuration lives here).
    pub fn repo_api_url(&self, repository: &str) -> String {
        format!("https://{}.{}/api/v2", repository, self.repo_api_suffix)
    }
}

fn require_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MigrateError::MissingEnv(name)),
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
