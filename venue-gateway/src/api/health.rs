//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health - Liveness plus gateway backoff state.
///
/// Degraded mode does not make the service unhealthy: fallbacks keep serving.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "gateway": state.gateway.status(),
            "credential_configured": state.credentials.is_configured(),
        })),
    )
}
