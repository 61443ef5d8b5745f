//! Venue state endpoints: snapshot, manual counts and camera scans.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use venue_common::{Incident, VenueSection};

use crate::error::{Error, Result};
use crate::gateway::PeopleCount;
use crate::state::AppState;
use crate::venue::{CountUpdate, FlowTotals};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venue", get(snapshot))
        .route("/venue/sections/:id/count", post(set_count))
        .route("/venue/sections/:id/scan", post(scan_section))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSnapshot {
    pub sections: Vec<VenueSection>,
    pub incidents: Vec<Incident>,
    #[serde(flatten)]
    pub totals: FlowTotals,
    pub last_sync: Option<String>,
    pub ai_degraded: bool,
}

/// GET /v1/venue
async fn snapshot(State(state): State<Arc<AppState>>) -> Json<VenueSnapshot> {
    let venue = state.venue.read().await;
    Json(VenueSnapshot {
        sections: venue.sections().to_vec(),
        incidents: venue.incidents().to_vec(),
        totals: venue.totals(),
        last_sync: venue.last_sync().map(str::to_string),
        ai_degraded: state.gateway.is_degraded(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CountRequest {
    pub count: u32,
}

/// POST /v1/venue/sections/:id/count - Operator-entered occupancy.
async fn set_count(
    State(state): State<Arc<AppState>>,
    Path(section_id): Path<String>,
    Json(request): Json<CountRequest>,
) -> Result<Json<CountUpdate>> {
    let update = state
        .venue
        .write()
        .await
        .apply_count(&section_id, request.count)?;
    Ok(Json(update))
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Base64 JPEG, optionally as a `data:` URL.
    pub image: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub section_id: String,
    /// People counted, or -1 (failed) / -2 (quota exhausted).
    pub count: i64,
    pub result: ScanResult,
    /// Present only when the count was applied to the section.
    pub update: Option<CountUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanResult {
    Counted,
    Failed,
    QuotaExhausted,
}

/// POST /v1/venue/sections/:id/scan - Count people in a camera frame.
///
/// The venue lock is not held across the inference call.
async fn scan_section(
    State(state): State<Arc<AppState>>,
    Path(section_id): Path<String>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>> {
    if state.venue.read().await.section(&section_id).is_none() {
        return Err(Error::SectionNotFound(section_id));
    }

    let image = strip_data_url(&request.image);
    if image.is_empty() {
        return Err(Error::InvalidRequest("image must not be empty".to_string()));
    }

    let count = state.gateway.count_people_in_image(image).await;
    let (result, update) = match count {
        PeopleCount::Counted(people) => {
            let update = state.venue.write().await.apply_count(&section_id, people)?;
            (ScanResult::Counted, Some(update))
        }
        PeopleCount::Failed => (ScanResult::Failed, None),
        PeopleCount::QuotaExhausted => (ScanResult::QuotaExhausted, None),
    };

    Ok(Json(ScanResponse {
        section_id,
        count: count.as_i64(),
        result,
        update,
    }))
}

/// Drop a `data:image/jpeg;base64,` style prefix.
fn strip_data_url(image: &str) -> &str {
    let image = image.trim();
    match image.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(""),
        None => image,
    }
}
