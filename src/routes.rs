//! Router configuration.
//!
//! # Endpoints
//!
//! - `GET /` - liveness check
//! - `POST /voice/incoming` - call-control webhook (TwiML)
//! - `GET /voice/stream` - WebSocket upgrade for the telephony media stream
//! - `GET /debug/evi` - voice service connectivity probe

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the bridge router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::api::health_check))
        .route("/voice/incoming", post(handlers::voice::voice_incoming))
        .route("/voice/stream", get(handlers::stream::stream_handler))
        .route("/debug/evi", get(handlers::debug::evi_probe))
        .layer(TraceLayer::new_for_http())
}
