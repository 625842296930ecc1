//! Error types for the migration library.
//!
//! Advisory read paths (existence checks, inventory fetches for mapping)
//! deliberately swallow most of these and degrade to empty results; the
//! variants here surface on configuration problems and batch submissions.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for migration operations.
#[derive(Debug, Error)]
pub enum MigrateError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Authentication failed for {repository}: {message}")]
    AuthFailed { repository: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Asset transfer errors
    #[error("Download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Upload failed for {filename}: {message}")]
    UploadFailed { filename: String, message: String },

    // Document migration errors
    #[error("Document {index} rejected with status {status}: {message}")]
    DocumentRejected {
        index: usize,
        status: u16,
        message: String,
    },

    // Configuration errors
    #[error("Configuration error: missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        MigrateError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        MigrateError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for MigrateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MigrateError::Timeout(std::time::Duration::from_secs(0))
        } else {
            MigrateError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl MigrateError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MigrateError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MigrateError::Network { .. }
                | MigrateError::Timeout(_)
                | MigrateError::RateLimited { .. }
        )
    }

    /// Check if this is a configuration problem the caller must fix.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            MigrateError::MissingEnv(_) | MigrateError::Config { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrateError::MissingEnv("SOURCE_REPO");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing environment variable SOURCE_REPO"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(MigrateError::Timeout(std::time::Duration::from_secs(5)).is_retryable());
        assert!(MigrateError::RateLimited {
            service: "asset-api".into(),
            retry_after_secs: None
        }
        .is_retryable());
        assert!(!MigrateError::MissingEnv("DEST_REPO").is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(MigrateError::MissingEnv("WRITE_API_KEY").is_config());
        assert!(!MigrateError::Other("boom".into()).is_config());
    }
}
