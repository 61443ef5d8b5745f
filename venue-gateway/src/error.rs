//! Error types for the command center HTTP surface.
//!
//! Gateway operations never fail; these cover bad requests and lookups only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::venue::VenueError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Incident not found: {0}")]
    IncidentNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<VenueError> for Error {
    fn from(error: VenueError) -> Self {
        match error {
            VenueError::UnknownSection(id) => Error::SectionNotFound(id),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::SectionNotFound(_) => (StatusCode::NOT_FOUND, "section_not_found"),
            Error::IncidentNotFound(_) => (StatusCode::NOT_FOUND, "incident_not_found"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
