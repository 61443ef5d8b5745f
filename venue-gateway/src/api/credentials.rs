//! Credential entry endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/credentials", post(set_credentials))
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialsResponse {
    pub configured: bool,
}

/// POST /v1/credentials - Replace the API key and leave degraded mode.
async fn set_credentials(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<CredentialsResponse>> {
    if request.api_key.trim().is_empty() {
        return Err(Error::InvalidRequest("api_key must not be empty".to_string()));
    }

    state.credentials.set(request.api_key);
    state.gateway.reset_degraded_mode();
    state.alerts.clear();
    tracing::info!("API key updated; degraded mode cleared");

    Ok(Json(CredentialsResponse {
        configured: state.credentials.is_configured(),
    }))
}
