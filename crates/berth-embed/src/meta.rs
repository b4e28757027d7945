use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::router::AppState;

/// Liveness probe. The launch coordinator polls this until the service
/// answers; keep it dependency-free and instant.
pub async fn healthz() -> impl IntoResponse {
    crate::responses::json_ok(json!({"ok": true}))
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub asset_root: String,
}

/// Service metadata.
pub async fn about(State(state): State<AppState>) -> impl IntoResponse {
    Json(AboutResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        asset_root: state.assets.root().display().to_string(),
    })
}
