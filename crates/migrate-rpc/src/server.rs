//! HTTP server implementation using Axum.

use crate::handlers::{
    handle_check_local, handle_check_uploaded, handle_download_assets, handle_fetch_assets,
    handle_get_state, handle_health, handle_languages, handle_migrate_documents,
    handle_put_state, handle_upload_assets,
};
use crate::store::StateStore;
use axum::{
    routing::{get, post},
    Router,
};
use migrate_core::{MigrationApi, WizardState};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers.
pub struct AppState {
    /// Core migration pipeline.
    pub api: MigrationApi,
    store: StateStore,
    /// In-memory wizard state; the store is its durable shadow.
    state: Mutex<WizardState>,
}

impl AppState {
    pub fn new(api: MigrationApi, store: StateStore) -> Self {
        let state = Mutex::new(store.load());
        Self { api, store, state }
    }

    pub fn wizard_state(&self) -> WizardState {
        *self.state.lock().unwrap()
    }

    pub fn set_state(&self, next: WizardState) {
        *self.state.lock().unwrap() = next;
        self.persist(next);
    }

    /// Apply a transition and persist the result.
    pub fn update_state(&self, transition: impl FnOnce(WizardState) -> WizardState) -> WizardState {
        let updated = {
            let mut guard = self.state.lock().unwrap();
            *guard = transition(*guard);
            *guard
        };
        self.persist(updated);
        updated
    }

    fn persist(&self, state: WizardState) {
        if let Err(e) = self.store.save(state) {
            warn!(error = %e, "failed to persist wizard state");
        }
    }
}

/// Start the wizard HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    state: Arc<AppState>,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    // The wizard frontend runs on its own dev port.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/assets", get(handle_fetch_assets))
        .route("/assets/download", post(handle_download_assets))
        .route("/assets/upload", post(handle_upload_assets))
        .route("/assets/check", get(handle_check_local))
        .route("/assets/check-uploaded", get(handle_check_uploaded))
        .route("/documents", post(handle_migrate_documents))
        .route("/languages", get(handle_languages))
        .route("/state", get(handle_get_state).put(handle_put_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    Ok(actual_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrate_core::MigrationConfig;
    use tempfile::TempDir;

    fn test_config(cache_dir: std::path::PathBuf) -> MigrationConfig {
        MigrationConfig {
            source_repo: "source-repo".into(),
            dest_repo: "dest-repo".into(),
            source_email: "user@example.com".into(),
            source_password: "secret".into(),
            write_api_key: "write-key".into(),
            migration_api_key: "migration-key".into(),
            cache_dir,
            asset_api_base: "http://127.0.0.1:1".into(),
            auth_base: "http://127.0.0.1:1".into(),
            custom_types_base: "http://127.0.0.1:1".into(),
            migration_base: "http://127.0.0.1:1".into(),
            repo_api_suffix: "invalid.localhost".into(),
        }
    }

    #[tokio::test]
    async fn test_server_starts() {
        let temp_dir = TempDir::new().unwrap();
        let api = MigrationApi::new(test_config(temp_dir.path().join("images"))).unwrap();
        let store = StateStore::new(temp_dir.path().join("state.json"));
        let state = Arc::new(AppState::new(api, store));

        let addr = start_server(state, "127.0.0.1", 0).await.unwrap();
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_health_and_state_routes() {
        let temp_dir = TempDir::new().unwrap();
        let api = MigrationApi::new(test_config(temp_dir.path().join("images"))).unwrap();
        let store = StateStore::new(temp_dir.path().join("state.json"));
        let state = Arc::new(AppState::new(api, store));

        let addr = start_server(state, "127.0.0.1", 0).await.unwrap();
        let base = format!("http://{addr}");
        let client = reqwest::Client::new();

        let health = client.get(format!("{base}/health")).send().await.unwrap();
        assert!(health.status().is_success());

        let fresh: WizardState = client
            .get(format!("{base}/state"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fresh, WizardState::new());

        let updated: WizardState = client
            .put(format!("{base}/state"))
            .json(&WizardState::new().with_fetched())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(updated.fetched);
    }
}
