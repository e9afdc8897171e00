//! Voice service connectivity probe.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::warn;

use crate::evi::EviConnection;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EviProbeResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
}

/// Open a connection to EVI and immediately close it, verifying
/// reachability and credentials without starting a session.
pub async fn evi_probe(State(state): State<Arc<AppState>>) -> Json<EviProbeResponse> {
    let config = state.config.evi_config();
    let config_id = config.config_id.clone();

    match EviConnection::probe(&config).await {
        Ok(()) => Json(EviProbeResponse {
            status: "ok",
            message: "EVI connection successful".to_string(),
            config_id,
        }),
        Err(e) => {
            warn!("EVI probe failed: {e}");
            Json(EviProbeResponse {
                status: "error",
                message: e.to_string(),
                config_id,
            })
        }
    }
}
