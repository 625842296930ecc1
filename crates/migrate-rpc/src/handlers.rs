//! HTTP request handlers, one per wizard stage.
//!
//! Batch stages report partial failure inside a 200 payload; only
//! configuration problems (400) and unreachable upstreams (502) surface
//! as error statuses.

use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use migrate_core::{Asset, IdMapping, MigrateError, WizardState};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Body for the download and upload stages.
#[derive(Debug, Deserialize)]
pub struct AssetBatch {
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Body for the document migration stage. Mappings are optional; when
/// absent the table is rebuilt from the inventories.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub mappings: Vec<IdMapping>,
}

fn error_response(e: &MigrateError) -> Response {
    let status = if e.is_config() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    error!(status = status.as_u16(), "request failed: {e}");
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

pub async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /assets — fetch the source inventory.
pub async fn handle_fetch_assets(State(state): State<Arc<AppState>>) -> Response {
    match state.api.fetch_source_inventory().await {
        Ok(assets) => {
            state.update_state(WizardState::with_fetched);
            Json(json!({ "total": assets.len(), "assets": assets })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// POST /assets/download — pull listed assets into the local cache.
pub async fn handle_download_assets(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<AssetBatch>,
) -> Response {
    match state.api.download_assets(&batch.assets).await {
        Ok(report) => {
            state.update_state(WizardState::with_downloaded);
            Json(report).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// POST /assets/upload — push cached assets to the destination.
pub async fn handle_upload_assets(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<AssetBatch>,
) -> Response {
    match state.api.upload_assets(&batch.assets).await {
        Ok(report) => {
            state.update_state(WizardState::with_uploaded);
            Json(report).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET /assets/check — is every source asset cached locally?
pub async fn handle_check_local(State(state): State<Arc<AppState>>) -> Response {
    let assets = state.api.fetch_source_inventory_tolerant().await;
    let cached = state.api.all_exist_locally(&assets);
    Json(json!({ "total": assets.len(), "cached": cached })).into_response()
}

/// GET /assets/check-uploaded — does the destination already hold them?
pub async fn handle_check_uploaded(State(state): State<Arc<AppState>>) -> Response {
    let assets = state.api.fetch_source_inventory_tolerant().await;
    let uploaded = state.api.all_exist_at_destination(&assets).await;
    Json(json!({ "total": assets.len(), "uploaded": uploaded })).into_response()
}

/// POST /documents — copy models, then migrate every document.
pub async fn handle_migrate_documents(
    State(state): State<Arc<AppState>>,
    body: Option<Json<DocumentRequest>>,
) -> Response {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    match state.api.migrate_documents(request.mappings).await {
        Ok(result) => {
            state.update_state(WizardState::with_migrated);
            Json(result).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET /languages — compare configured languages against document usage.
pub async fn handle_languages(State(state): State<Arc<AppState>>) -> Response {
    match state.api.language_report().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /state — current wizard-step record.
pub async fn handle_get_state(State(state): State<Arc<AppState>>) -> Response {
    Json(state.wizard_state()).into_response()
}

/// PUT /state — replace the wizard-step record.
pub async fn handle_put_state(
    State(state): State<Arc<AppState>>,
    Json(next): Json<WizardState>,
) -> Response {
    state.set_state(next);
    Json(next).into_response()
}
