//! Dashboard HTTP API.

pub mod analysis;
pub mod credentials;
pub mod health;
pub mod venue;

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use crate::logging::request_logger;
use crate::state::AppState;

/// Build the `/v1` API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(venue::router())
        .merge(analysis::router())
        .merge(credentials::router())
}

/// Build the full application with state, health check and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/v1", router())
        .route("/health", get(health::health))
        .layer(middleware::from_fn(request_logger))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
