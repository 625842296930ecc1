//! Network layer: HTTP client, credentials, and API endpoints.

pub mod asset_api;
pub mod auth;
pub mod backoff;
pub mod client;
pub mod custom_types;
pub mod migration_api;
pub mod repository;

pub use asset_api::AssetApi;
pub use auth::TokenProvider;
pub use backoff::{retry_async, RetryConfig};
pub use client::HttpClient;
pub use custom_types::{CopyOutcome, CustomTypesApi, ModelKind};
pub use migration_api::MigrationEndpoint;
pub use repository::RepositoryApi;
