use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::authz::types::{
    AuthorizeRequest, AuthorizeResponse, MenuRequest, ResolveRequest, ResolveResponse,
};
use crate::authz::{engine, loader, menu, ResolutionPolicy, SnapshotStore};

/// Shared state for the HTTP surface: the live snapshot plus what a reload
/// needs to build its successor.
pub struct AppState {
    pub store: SnapshotStore,
    pub snapshot_path: PathBuf,
    pub policy: ResolutionPolicy,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/permissions/resolve", post(handle_resolve))
        .route("/v1/authorize", post(handle_authorize))
        .route("/v1/menu", post(handle_menu))
        .route("/v1/snapshot/reload", post(handle_reload))
        .route("/healthz", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_resolve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> impl IntoResponse {
    let snapshot = state.store.current();
    match engine::resolve_effective(&snapshot, req.user_id) {
        Ok(effective) => {
            let mut permissions: Vec<_> = effective.into_iter().collect();
            permissions.sort();
            Json(ResolveResponse { permissions }).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn handle_authorize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthorizeRequest>,
) -> impl IntoResponse {
    let snapshot = state.store.current();
    // Fail-closed by construction: errors become a deny inside the engine.
    let decision = engine::authorize(&snapshot, &req.method, &req.path, req.user_id);
    Json(AuthorizeResponse {
        allowed: decision.is_allow(),
    })
}

async fn handle_menu(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MenuRequest>,
) -> impl IntoResponse {
    let snapshot = state.store.current();
    match menu::filter_menu(&snapshot, req.user_id) {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match loader::load_snapshot(&state.snapshot_path, state.policy) {
        Ok(snapshot) => {
            let version = state.store.swap(snapshot);
            tracing::info!(version, "Snapshot reloaded");
            Json(json!({ "version": version })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
