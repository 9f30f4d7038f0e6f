use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, MethodRouter},
};
use tower_http::services::ServeDir;
use tracing::error;

use crate::state::AppState;

/// Static asset serving for everything outside `/api`. `ServeDir` keeps
/// resolved paths inside the asset root; anything it cannot resolve
/// falls through to the single-page-app fallback.
pub fn asset_service(state: Arc<AppState>) -> ServeDir<MethodRouter> {
    let assets_dir = state.config.assets_dir.clone();
    ServeDir::new(assets_dir).fallback(get(spa_fallback).with_state(state))
}

/// Unresolvable paths that look like a file request (the last segment
/// has an extension) are a plain 404; everything else gets the root
/// document so client-side routing keeps working.
async fn spa_fallback(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let leaf = uri.path().rsplit('/').next().unwrap_or("");
    if leaf.contains('.') {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let index = state.config.assets_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("cannot read {}: {e}", index.display());
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}
