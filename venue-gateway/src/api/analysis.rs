//! AI analysis endpoints. Each one always answers; fallbacks stand in for the
//! model when it is unavailable.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use venue_common::{DensityCluster, FailureEvent, IncidentReport, TacticalResponse};

use crate::error::{Error, Result};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tactical", post(tactical))
        .route("/insight", get(insight))
        .route("/density", get(density))
        .route("/alerts", get(alerts))
}

/// Either a known incident id or a free-form report.
#[derive(Debug, Default, Deserialize)]
pub struct TacticalRequest {
    pub incident_id: Option<String>,
    #[serde(flatten)]
    pub report: IncidentReport,
}

/// POST /v1/tactical
async fn tactical(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TacticalRequest>,
) -> Result<Json<TacticalResponse>> {
    let (report, sections) = {
        let venue = state.venue.read().await;
        let report = match &request.incident_id {
            Some(id) => venue
                .incident(id)
                .map(IncidentReport::from)
                .ok_or_else(|| Error::IncidentNotFound(id.clone()))?,
            None => request.report,
        };
        (report, venue.sections().to_vec())
    };

    if report.category.trim().is_empty()
        && report.location.trim().is_empty()
        && report.description.trim().is_empty()
    {
        return Err(Error::InvalidRequest(
            "incident_id or an incident description is required".to_string(),
        ));
    }

    let response = state
        .gateway
        .request_tactical_response(&report, &sections)
        .await;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub insight: String,
}

/// GET /v1/insight
async fn insight(State(state): State<Arc<AppState>>) -> Json<InsightResponse> {
    let sections = state.venue.read().await.sections().to_vec();
    let insight = state.gateway.request_insight_text(&sections).await;
    Json(InsightResponse { insight })
}

#[derive(Debug, Serialize)]
pub struct DensityResponse {
    pub clusters: Vec<DensityCluster>,
}

/// GET /v1/density
async fn density(State(state): State<Arc<AppState>>) -> Json<DensityResponse> {
    let sections = state.venue.read().await.sections().to_vec();
    let clusters = state.gateway.request_density_map(&sections).await;
    Json(DensityResponse { clusters })
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alert: Option<FailureEvent>,
}

/// GET /v1/alerts - The current banner alert, if any.
async fn alerts(State(state): State<Arc<AppState>>) -> Json<AlertsResponse> {
    Json(AlertsResponse {
        alert: state.alerts.current(),
    })
}
